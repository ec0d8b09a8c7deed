//! Token operations: credit, balance, pause, unpause, ownership.
//!
//! Every state-changing operation follows the same shape:
//! 1. Read-only precondition checks, failing fast before anything is broadcast
//! 2. Build the contract call
//! 3. Submit through [`TxSubmitter`], retrying only broadcast failures
//! 4. Re-read the affected state and compare with the intended outcome
//!
//! Preconditions are guards, not guarantees: the contract is the final authority and
//! a call may still revert after every local check passed.

use alloy::primitives::{Address, Bytes, U256};

use crate::blockchain::transaction::TxSubmitter;
use crate::blockchain::types::{
    ContractCall, LedgerError, LedgerResult, NetworkId, Precondition, Receipt, SendOptions,
};
use crate::config::schema::TokenConfig;
use crate::lifecycle::Cancellation;
use crate::resilience::RetryPolicy;
use crate::token::contract;
use crate::token::networks::{Network, NetworkRegistry};
use crate::token::units::{DisplayAmount, UnitConverter};

/// High-level client for the token contract across networks.
#[derive(Debug, Clone)]
pub struct TokenClient {
    networks: NetworkRegistry,
    submitter: TxSubmitter,
    retry: RetryPolicy,
    units: UnitConverter,
}

impl TokenClient {
    /// Client over already-registered networks.
    pub fn new(networks: NetworkRegistry, config: &TokenConfig) -> LedgerResult<Self> {
        Ok(Self {
            networks,
            submitter: TxSubmitter::new(&config.confirmation),
            retry: RetryPolicy::from(&config.retries),
            units: UnitConverter::new(config.units.decimals)?,
        })
    }

    /// Connect every configured network and build a client.
    pub async fn from_config(config: &TokenConfig) -> LedgerResult<Self> {
        let networks = NetworkRegistry::connect(config).await?;
        Self::new(networks, config)
    }

    pub fn networks(&self) -> &NetworkRegistry {
        &self.networks
    }

    /// Address the token contract is deployed at on `network`.
    pub fn contract_address(&self, network: &NetworkId) -> LedgerResult<Address> {
        Ok(self.networks.get(network)?.token)
    }

    /// Token units to natural units.
    pub fn to_natural_unit(&self, amount: &DisplayAmount) -> LedgerResult<U256> {
        Ok(self.units.to_natural_unit(amount)?)
    }

    /// Natural units to token units.
    pub fn to_token_unit(&self, natural: U256) -> DisplayAmount {
        self.units.to_token_unit(natural)
    }

    /// Token balance of `address`, in natural units.
    pub async fn balance(&self, network: &NetworkId, address: Address) -> LedgerResult<U256> {
        let network = self.networks.get(network)?;
        self.read_balance(network, address, &Cancellation::never()).await
    }

    /// Whether transfers are paused.
    pub async fn paused(&self, network: &NetworkId) -> LedgerResult<bool> {
        let network = self.networks.get(network)?;
        self.read_paused(network, &Cancellation::never()).await
    }

    /// Current owner of the token contract.
    pub async fn owner(&self, network: &NetworkId) -> LedgerResult<Address> {
        let network = self.networks.get(network)?;
        self.read_owner(network, &Cancellation::never()).await
    }

    /// Transfer `value` natural units from the network's supplier to `recipient`.
    ///
    /// Returns the recipient's balance after the transfer.
    pub async fn credit(
        &self,
        network: &NetworkId,
        recipient: Address,
        value: U256,
        cancel: &Cancellation,
    ) -> LedgerResult<U256> {
        let network = self.networks.get(network)?;
        let supplier = network.supplier();

        let available = self.read_balance(network, supplier, cancel).await?;
        if value > available {
            return Err(Precondition::InsufficientBalance {
                available,
                requested: value,
            }
            .into());
        }
        if self.read_paused(network, cancel).await? {
            return Err(Precondition::TransfersPaused.into());
        }

        // A self-transfer leaves the balance unchanged, so there is nothing to compare.
        let before = if recipient != supplier {
            Some(self.read_balance(network, recipient, cancel).await?)
        } else {
            None
        };

        tracing::info!(
            network = %network.id,
            from = %supplier,
            to = %recipient,
            value = %value,
            "Crediting tokens"
        );
        let call = contract::transfer(network.token, recipient, value);
        self.submit(network, call, supplier, cancel).await?;

        let after = self.read_balance(network, recipient, cancel).await?;
        if let Some(before) = before {
            // Concurrent credits may land too, so only a shortfall is a mismatch.
            let expected = before.saturating_add(value);
            if after < expected {
                return Err(LedgerError::PostconditionMismatch {
                    what: "recipient balance",
                    expected: format!("at least {}", expected),
                    observed: after.to_string(),
                });
            }
        }

        Ok(after)
    }

    /// Like [`TokenClient::credit`], with the amount in token units.
    pub async fn credit_tokens(
        &self,
        network: &NetworkId,
        recipient: Address,
        amount: &DisplayAmount,
        cancel: &Cancellation,
    ) -> LedgerResult<DisplayAmount> {
        let value = self.to_natural_unit(amount)?;
        let balance = self.credit(network, recipient, value, cancel).await?;
        Ok(self.to_token_unit(balance))
    }

    /// Pause transfers and approvals.
    pub async fn pause(&self, network: &NetworkId, cancel: &Cancellation) -> LedgerResult<Receipt> {
        self.set_paused(network, true, cancel).await
    }

    /// Resume transfers and approvals.
    pub async fn unpause(&self, network: &NetworkId, cancel: &Cancellation) -> LedgerResult<Receipt> {
        self.set_paused(network, false, cancel).await
    }

    async fn set_paused(
        &self,
        network: &NetworkId,
        paused: bool,
        cancel: &Cancellation,
    ) -> LedgerResult<Receipt> {
        let network = self.networks.get(network)?;
        let sender = network.sender();

        if self.read_paused(network, cancel).await? == paused {
            return Err(if paused {
                Precondition::AlreadyPaused
            } else {
                Precondition::AlreadyUnpaused
            }
            .into());
        }
        self.require_owner(network, sender, cancel).await?;

        let call = if paused {
            contract::pause(network.token)
        } else {
            contract::unpause(network.token)
        };
        tracing::info!(network = %network.id, sender = %sender, paused, "Changing pause state");
        let receipt = self.submit(network, call, sender, cancel).await?;

        let observed = self.read_paused(network, cancel).await?;
        if observed != paused {
            return Err(LedgerError::PostconditionMismatch {
                what: "paused",
                expected: paused.to_string(),
                observed: observed.to_string(),
            });
        }

        Ok(receipt)
    }

    /// Transfer contract ownership to `new_owner`.
    pub async fn set_owner(
        &self,
        network: &NetworkId,
        new_owner: Address,
        cancel: &Cancellation,
    ) -> LedgerResult<Receipt> {
        let network = self.networks.get(network)?;
        let sender = network.sender();

        if !network.is_valid_owner(new_owner) {
            return Err(Precondition::OwnerNotAllowed(new_owner).into());
        }
        let old_owner = self.require_owner(network, sender, cancel).await?;
        if old_owner == new_owner {
            return Err(Precondition::SameOwner(old_owner).into());
        }

        tracing::info!(
            network = %network.id,
            old_owner = %old_owner,
            new_owner = %new_owner,
            "Transferring token ownership"
        );
        let call = contract::transfer_ownership(network.token, new_owner);
        let receipt = self.submit(network, call, sender, cancel).await?;

        let observed = self.read_owner(network, cancel).await?;
        if observed != new_owner {
            return Err(LedgerError::PostconditionMismatch {
                what: "owner",
                expected: new_owner.to_string(),
                observed: observed.to_string(),
            });
        }

        Ok(receipt)
    }

    /// Fails unless `sender` is the current owner; returns the owner.
    async fn require_owner(
        &self,
        network: &Network,
        sender: Address,
        cancel: &Cancellation,
    ) -> LedgerResult<Address> {
        let owner = self.read_owner(network, cancel).await?;
        if owner != sender {
            return Err(Precondition::NotOwner { sender, owner }.into());
        }
        Ok(owner)
    }

    /// Submit `call`, retrying only failures that never reached the network.
    async fn submit(
        &self,
        network: &Network,
        call: ContractCall,
        from: Address,
        cancel: &Cancellation,
    ) -> LedgerResult<Receipt> {
        let submitter = &self.submitter;
        let endpoint = network.endpoint.as_ref();
        let id = &network.id;
        let call = &call;
        let options = &SendOptions::from(from);

        let receipt = self
            .retry
            .run_if(cancel, LedgerError::is_retryable, move || {
                submitter.submit(endpoint, id, call, options, cancel)
            })
            .await?;
        Ok(receipt)
    }

    async fn query(
        &self,
        network: &Network,
        call: ContractCall,
        cancel: &Cancellation,
    ) -> LedgerResult<Bytes> {
        tokio::select! {
            res = network.endpoint.call(&call) => res,
            _ = cancel.cancelled() => Err(LedgerError::Cancelled { tx_hash: None }),
        }
    }

    async fn read_balance(
        &self,
        network: &Network,
        address: Address,
        cancel: &Cancellation,
    ) -> LedgerResult<U256> {
        let data = self
            .query(network, contract::balance_of(network.token, address), cancel)
            .await?;
        contract::decode_balance_of(&data)
    }

    async fn read_paused(&self, network: &Network, cancel: &Cancellation) -> LedgerResult<bool> {
        let data = self.query(network, contract::paused(network.token), cancel).await?;
        contract::decode_paused(&data)
    }

    async fn read_owner(&self, network: &Network, cancel: &Cancellation) -> LedgerResult<Address> {
        let data = self.query(network, contract::owner(network.token), cancel).await?;
        contract::decode_owner(&data)
    }
}
