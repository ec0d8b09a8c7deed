//! Ledger endpoint: the transport the confirmation manager talks to.
//!
//! # Responsibilities
//! - Read-only contract calls and gas estimation
//! - Broadcasting signed calls and returning the transaction hash
//! - Receipt lookup
//! - Supplying the default signing identity
//!
//! [`RpcEndpoint`] is the JSON-RPC implementation. Reads fail over across all
//! configured providers; writes only ever go to the primary, so one submission is
//! never broadcast twice through different nodes.

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, TxHash};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::blockchain::types::{ChainId, ContractCall, LedgerError, LedgerResult, Receipt};
use crate::blockchain::wallet::Wallet;
use crate::config::schema::NetworkConfig;

/// Operations the core needs from a ledger network.
#[async_trait]
pub trait LedgerEndpoint: Send + Sync {
    /// Execute a read-only call and return the raw return data.
    async fn call(&self, call: &ContractCall) -> LedgerResult<Bytes>;

    /// Estimate gas for `call` as sent by `from`. Fails if the call would revert.
    async fn estimate_gas(&self, call: &ContractCall, from: Address) -> LedgerResult<u64>;

    /// Sign and broadcast `call`, returning the hash once the node accepts it.
    async fn send(&self, call: &ContractCall, from: Address, gas: u64) -> LedgerResult<TxHash>;

    /// Receipt for `tx_hash`, or `None` while it is not yet processed.
    async fn get_receipt(&self, tx_hash: TxHash) -> LedgerResult<Option<Receipt>>;

    /// Default sender for state-changing calls.
    fn default_sender(&self) -> Address;
}

type DynProvider = Arc<dyn Provider + Send + Sync>;

/// JSON-RPC endpoint with read failover and per-request timeouts.
#[derive(Clone)]
pub struct RpcEndpoint {
    /// Read providers (primary + failovers).
    readers: Vec<DynProvider>,
    /// Wallet-filled primary provider for broadcasts.
    writer: DynProvider,
    wallet: Wallet,
    sender: Address,
    chain_id: u64,
    rpc_url: String,
    timeout_duration: Duration,
}

impl RpcEndpoint {
    /// Connect to the network described by `config`, signing with `wallet`.
    ///
    /// The chain id is verified but a mismatch or unreachable node only logs a warning,
    /// so the client can be built while the node is down.
    pub async fn connect(config: &NetworkConfig, wallet: Wallet) -> LedgerResult<Self> {
        let timeout_duration = Duration::from_secs(config.rpc_timeout_secs);

        let primary_url: url::Url = config.rpc_url.parse().map_err(|e| {
            LedgerError::Rpc(format!("Invalid RPC URL '{}': {}", config.rpc_url, e))
        })?;

        let mut readers = Vec::new();
        readers.push(
            Arc::new(ProviderBuilder::new().connect_http(primary_url.clone())) as DynProvider,
        );
        for url_str in &config.failover_urls {
            if let Ok(url) = url_str.parse() {
                readers.push(Arc::new(ProviderBuilder::new().connect_http(url)) as DynProvider);
            } else {
                tracing::warn!(url = %url_str, "Ignoring invalid failover RPC URL");
            }
        }

        let writer = Arc::new(
            ProviderBuilder::new()
                .wallet(wallet.ethereum_wallet())
                .connect_http(primary_url),
        ) as DynProvider;

        // Only the wallet's own key can sign, so any configured sender or supplier
        // must be that address.
        let sender = wallet.address();
        for (field, configured) in [("sender", &config.sender), ("supplier", &config.supplier)] {
            if let Some(configured) = configured {
                let address: Address = configured.parse().map_err(|e| {
                    LedgerError::Wallet(format!("Invalid {} address '{}': {}", field, configured, e))
                })?;
                if address != sender {
                    return Err(LedgerError::Wallet(format!(
                        "Configured {} {} has no signing key (wallet is {})",
                        field, address, sender
                    )));
                }
            }
        }

        let endpoint = Self {
            readers,
            writer,
            sender,
            chain_id: config.chain_id,
            rpc_url: config.rpc_url.clone(),
            timeout_duration,
            wallet,
        };

        match endpoint.verify_chain_id().await {
            Ok(()) => tracing::info!(
                network = %config.id,
                rpc_url = %config.rpc_url,
                chain_id = config.chain_id,
                "Ledger endpoint initialized"
            ),
            Err(e) => tracing::warn!(
                network = %config.id,
                error = %e,
                "Ledger endpoint initialized but chain verification failed"
            ),
        }

        Ok(endpoint)
    }

    /// Connect using the signing key named by `config.private_key_env`.
    pub async fn from_env(config: &NetworkConfig) -> LedgerResult<Self> {
        let wallet = Wallet::from_env(&config.private_key_env, config.chain_id)?;
        Self::connect(config, wallet).await
    }

    /// Verify the connected chain ID matches configuration.
    pub async fn verify_chain_id(&self) -> LedgerResult<()> {
        let chain_id = self.get_chain_id().await?;
        if chain_id.0 != self.chain_id {
            return Err(LedgerError::ChainMismatch {
                expected: self.chain_id,
                actual: chain_id.0,
            });
        }
        Ok(())
    }

    /// Get the chain ID from the RPC.
    pub async fn get_chain_id(&self) -> LedgerResult<ChainId> {
        self.read("eth_chainId", |p| async move { p.get_chain_id().await })
            .await
            .map(ChainId)
    }

    /// Check if the node answers.
    pub async fn is_healthy(&self) -> bool {
        self.read("eth_blockNumber", |p| async move { p.get_block_number().await })
            .await
            .is_ok()
    }

    /// Try each reader in order until one answers within the timeout.
    async fn read<T, E, F, Fut>(&self, what: &'static str, f: F) -> LedgerResult<T>
    where
        F: Fn(DynProvider) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        for (i, provider) in self.readers.iter().enumerate() {
            match timeout(self.timeout_duration, f(provider.clone())).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => {
                    tracing::warn!(provider_idx = i, rpc = what, error = %e, "RPC error, trying next provider");
                }
                Err(_) => {
                    tracing::warn!(provider_idx = i, rpc = what, "RPC timeout, trying next provider");
                }
            }
        }
        Err(LedgerError::Rpc(format!("All RPC providers failed: {}", what)))
    }

    fn request(call: &ContractCall) -> TransactionRequest {
        TransactionRequest::default()
            .with_to(call.to)
            .with_input(call.input.clone())
    }
}

#[async_trait]
impl LedgerEndpoint for RpcEndpoint {
    async fn call(&self, call: &ContractCall) -> LedgerResult<Bytes> {
        let request = Self::request(call);
        self.read("eth_call", |p| {
            let request = request.clone();
            async move { p.call(request).await }
        })
        .await
    }

    async fn estimate_gas(&self, call: &ContractCall, from: Address) -> LedgerResult<u64> {
        // A revert is deterministic, so only the primary is asked.
        let request = Self::request(call).with_from(from);
        let primary = &self.readers[0];
        match timeout(self.timeout_duration, async { primary.estimate_gas(request).await }).await {
            Ok(Ok(gas)) => Ok(gas),
            Ok(Err(e)) => Err(LedgerError::Rpc(e.to_string())),
            Err(_) => Err(LedgerError::Timeout(self.timeout_duration.as_secs())),
        }
    }

    async fn send(&self, call: &ContractCall, from: Address, gas: u64) -> LedgerResult<TxHash> {
        if from != self.wallet.address() {
            return Err(LedgerError::Wallet(format!(
                "No signing key for sender {} (wallet is {})",
                from,
                self.wallet.address()
            )));
        }

        let request = Self::request(call)
            .with_from(from)
            .with_gas_limit(gas)
            .with_chain_id(self.wallet.chain_id());

        match timeout(self.timeout_duration, self.writer.send_transaction(request)).await {
            Ok(Ok(pending)) => Ok(*pending.tx_hash()),
            Ok(Err(e)) => Err(LedgerError::Rpc(e.to_string())),
            // The node may or may not have accepted it.
            Err(_) => Err(LedgerError::Timeout(self.timeout_duration.as_secs())),
        }
    }

    async fn get_receipt(&self, tx_hash: TxHash) -> LedgerResult<Option<Receipt>> {
        self.read("eth_getTransactionReceipt", |p| async move {
            p.get_transaction_receipt(tx_hash).await
        })
        .await
        .map(|receipt| receipt.as_ref().map(Receipt::from))
    }

    fn default_sender(&self) -> Address {
        self.sender
    }
}

impl std::fmt::Debug for RpcEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcEndpoint")
            .field("rpc_url", &self.rpc_url)
            .field("chain_id", &self.chain_id)
            .field("readers", &self.readers.len())
            .field("sender", &self.sender)
            .field("timeout_secs", &self.timeout_duration.as_secs())
            .finish()
    }
}
