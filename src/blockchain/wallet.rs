//! Signing identity.
//!
//! # Security
//! - Private keys are loaded ONLY from environment variables (or passed in directly)
//! - Keys are never logged or serialized
//! - Nonce sequencing is left to the provider's nonce filler; concurrent submissions
//!   from the same key against the same network need external sequencing

use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer;

use crate::blockchain::types::{LedgerError, LedgerResult};

/// Default environment variable name for the private key.
pub const PRIVATE_KEY_ENV_VAR: &str = "TOKEN_LEDGER_PRIVATE_KEY";

/// A local private-key signer bound to a chain.
#[derive(Debug, Clone)]
pub struct Wallet {
    signer: PrivateKeySigner,
    chain_id: u64,
}

impl Wallet {
    /// Create a wallet from a hex-encoded private key string.
    ///
    /// # Arguments
    /// * `private_key_hex` - Hex string (with or without 0x prefix)
    /// * `chain_id` - Chain ID for EIP-155 replay protection
    pub fn from_private_key(private_key_hex: &str, chain_id: u64) -> LedgerResult<Self> {
        let key_hex = private_key_hex.trim();
        let key_hex = key_hex.strip_prefix("0x").unwrap_or(key_hex);

        let mut signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| LedgerError::Wallet(format!("Invalid private key format: {}", e)))?;
        signer.set_chain_id(Some(chain_id));

        tracing::info!(
            address = %signer.address(),
            chain_id = chain_id,
            "Wallet initialized"
        );

        Ok(Self { signer, chain_id })
    }

    /// Load wallet from the environment variable `var`.
    pub fn from_env(var: &str, chain_id: u64) -> LedgerResult<Self> {
        let private_key = std::env::var(var).map_err(|_| {
            LedgerError::Wallet(format!("Environment variable {} not set", var))
        })?;

        Self::from_private_key(&private_key, chain_id)
    }

    /// Get the wallet's address.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Get the chain ID this wallet is configured for.
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Signer wrapper used by wallet-filled providers.
    pub fn ethereum_wallet(&self) -> EthereumWallet {
        EthereumWallet::from(self.signer.clone())
    }
}
