//! Registry of ledger networks the token is deployed on.

use alloy::primitives::Address;
use std::collections::HashMap;
use std::sync::Arc;

use crate::blockchain::client::{LedgerEndpoint, RpcEndpoint};
use crate::blockchain::types::{LedgerError, LedgerResult, NetworkId};
use crate::config::schema::{NetworkConfig, TokenConfig};

/// One network: transport plus where the token lives on it.
#[derive(Clone)]
pub struct Network {
    pub id: NetworkId,
    pub endpoint: Arc<dyn LedgerEndpoint>,
    /// Token contract address.
    pub token: Address,
    /// Account holding the supply. Defaults to the endpoint's sender.
    pub supplier: Option<Address>,
    /// Addresses allowed to become owner. Empty means unrestricted.
    pub owner_whitelist: Vec<Address>,
}

impl Network {
    pub fn new(id: impl Into<NetworkId>, endpoint: Arc<dyn LedgerEndpoint>, token: Address) -> Self {
        Self {
            id: id.into(),
            endpoint,
            token,
            supplier: None,
            owner_whitelist: Vec::new(),
        }
    }

    pub fn with_supplier(mut self, supplier: Address) -> Self {
        self.supplier = Some(supplier);
        self
    }

    pub fn with_owner_whitelist(mut self, whitelist: Vec<Address>) -> Self {
        self.owner_whitelist = whitelist;
        self
    }

    /// Account credits are paid from.
    pub fn supplier(&self) -> Address {
        self.supplier
            .unwrap_or_else(|| self.endpoint.default_sender())
    }

    /// Default sender for owner operations.
    pub fn sender(&self) -> Address {
        self.endpoint.default_sender()
    }

    pub fn is_valid_owner(&self, candidate: Address) -> bool {
        self.owner_whitelist.is_empty() || self.owner_whitelist.contains(&candidate)
    }

    /// Build a network from config around an existing endpoint.
    pub fn from_config(config: &NetworkConfig, endpoint: Arc<dyn LedgerEndpoint>) -> LedgerResult<Self> {
        let token = parse_address("token_address", &config.token_address)?;
        let supplier = config
            .supplier
            .as_deref()
            .map(|s| parse_address("supplier", s))
            .transpose()?;
        let owner_whitelist = config
            .owner_whitelist
            .iter()
            .map(|s| parse_address("owner_whitelist", s))
            .collect::<LedgerResult<Vec<_>>>()?;

        Ok(Self {
            id: NetworkId::from(config.id.as_str()),
            endpoint,
            token,
            supplier,
            owner_whitelist,
        })
    }
}

impl std::fmt::Debug for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Network")
            .field("id", &self.id)
            .field("token", &self.token)
            .field("supplier", &self.supplier)
            .field("owner_whitelist", &self.owner_whitelist.len())
            .finish()
    }
}

fn parse_address(field: &str, value: &str) -> LedgerResult<Address> {
    value
        .parse()
        .map_err(|e| LedgerError::Wallet(format!("Invalid {} address '{}': {}", field, value, e)))
}

/// Networks by id.
#[derive(Debug, Clone, Default)]
pub struct NetworkRegistry {
    networks: HashMap<NetworkId, Network>,
}

impl NetworkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect an RPC endpoint for every configured network.
    ///
    /// Signing keys come from each network's `private_key_env`.
    pub async fn connect(config: &TokenConfig) -> LedgerResult<Self> {
        let mut registry = Self::new();
        for network in &config.networks {
            let endpoint = RpcEndpoint::from_env(network).await?;
            registry.register(Network::from_config(network, Arc::new(endpoint))?);
        }
        tracing::info!(networks = registry.len(), "Network registry ready");
        Ok(registry)
    }

    /// Add or replace a network.
    pub fn register(&mut self, network: Network) -> Option<Network> {
        self.networks.insert(network.id.clone(), network)
    }

    pub fn get(&self, id: &NetworkId) -> LedgerResult<&Network> {
        self.networks
            .get(id)
            .ok_or_else(|| LedgerError::UnknownNetwork(id.clone()))
    }

    pub fn ids(&self) -> impl Iterator<Item = &NetworkId> {
        self.networks.keys()
    }

    pub fn len(&self) -> usize {
        self.networks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::types::{ContractCall, Receipt};
    use alloy::primitives::{Bytes, TxHash};
    use async_trait::async_trait;

    struct NullEndpoint;

    #[async_trait]
    impl LedgerEndpoint for NullEndpoint {
        async fn call(&self, _call: &ContractCall) -> LedgerResult<Bytes> {
            Err(LedgerError::Rpc("offline".to_string()))
        }
        async fn estimate_gas(&self, _call: &ContractCall, _from: Address) -> LedgerResult<u64> {
            Err(LedgerError::Rpc("offline".to_string()))
        }
        async fn send(&self, _call: &ContractCall, _from: Address, _gas: u64) -> LedgerResult<TxHash> {
            Err(LedgerError::Rpc("offline".to_string()))
        }
        async fn get_receipt(&self, _tx_hash: TxHash) -> LedgerResult<Option<Receipt>> {
            Ok(None)
        }
        fn default_sender(&self) -> Address {
            Address::repeat_byte(0xaa)
        }
    }

    fn network_config() -> NetworkConfig {
        NetworkConfig {
            id: "4".to_string(),
            rpc_url: "http://127.0.0.1:1".to_string(),
            failover_urls: Vec::new(),
            chain_id: 4,
            token_address: "0x5FbDB2315678afecb367f032d93F642f64180aa3".to_string(),
            sender: None,
            supplier: None,
            owner_whitelist: vec!["0x70997970C51812dc3A010C7d01b50e0d17dc79C8".to_string()],
            rpc_timeout_secs: 2,
            private_key_env: "TOKEN_LEDGER_PRIVATE_KEY".to_string(),
        }
    }

    #[test]
    fn test_supplier_defaults_to_sender() {
        let network = Network::new("1", Arc::new(NullEndpoint), Address::ZERO);
        assert_eq!(network.supplier(), Address::repeat_byte(0xaa));

        let network = network.with_supplier(Address::repeat_byte(0xbb));
        assert_eq!(network.supplier(), Address::repeat_byte(0xbb));
        assert_eq!(network.sender(), Address::repeat_byte(0xaa));
    }

    #[test]
    fn test_owner_whitelist() {
        let open = Network::new("1", Arc::new(NullEndpoint), Address::ZERO);
        assert!(open.is_valid_owner(Address::repeat_byte(0x01)));

        let network = Network::from_config(&network_config(), Arc::new(NullEndpoint)).unwrap();
        let allowed: Address = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8".parse().unwrap();
        assert!(network.is_valid_owner(allowed));
        assert!(!network.is_valid_owner(Address::repeat_byte(0x01)));
    }

    #[test]
    fn test_from_config_rejects_bad_address() {
        let mut config = network_config();
        config.token_address = "0xnope".to_string();
        let err = Network::from_config(&config, Arc::new(NullEndpoint)).unwrap_err();
        assert!(err.to_string().contains("token_address"));
    }

    #[test]
    fn test_registry_lookup() {
        let mut registry = NetworkRegistry::new();
        assert!(registry.is_empty());

        registry.register(Network::new("4", Arc::new(NullEndpoint), Address::ZERO));
        assert_eq!(registry.len(), 1);
        assert!(registry.get(&NetworkId::from("4")).is_ok());

        let err = registry.get(&NetworkId::from("999")).unwrap_err();
        assert!(matches!(err, LedgerError::UnknownNetwork(_)));
        assert_eq!(err.to_string(), "unknown network '999'");
    }

    #[tokio::test]
    async fn test_connect_requires_signing_key() {
        let mut config = network_config();
        config.private_key_env = "TOKEN_LEDGER_TEST_KEY_THAT_IS_NEVER_SET".to_string();
        let token_config = TokenConfig {
            networks: vec![config],
            ..Default::default()
        };

        let err = NetworkRegistry::connect(&token_config).await.unwrap_err();
        assert!(matches!(err, LedgerError::Wallet(_)));
    }
}
