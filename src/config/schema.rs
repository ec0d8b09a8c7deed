//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the token client.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TokenConfig {
    /// Ledger networks the client can target.
    pub networks: Vec<NetworkConfig>,

    /// Receipt polling settings.
    pub confirmation: ConfirmationConfig,

    /// Retry settings for broadcasts.
    pub retries: RetryConfig,

    /// Fixed-point conversion settings.
    pub units: UnitsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// One ledger network and the token deployed on it.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
    /// Network identifier used by callers (e.g. "1", "4", "localhost").
    pub id: String,

    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs, used for reads only.
    #[serde(default)]
    pub failover_urls: Vec<String>,

    /// Expected chain ID (e.g., 1 for Ethereum mainnet, 31337 for local Anvil).
    pub chain_id: u64,

    /// Address the token contract is deployed at.
    pub token_address: String,

    /// Default sender. Must be the signing key's address when set.
    #[serde(default)]
    pub sender: Option<String>,

    /// Account holding the token supply, debited by credits. Defaults to the sender;
    /// must also be the signing key's address when connecting over RPC.
    #[serde(default)]
    pub supplier: Option<String>,

    /// Addresses allowed to become token owner. Empty means unrestricted.
    #[serde(default)]
    pub owner_whitelist: Vec<String>,

    /// RPC request timeout in seconds.
    #[serde(default = "default_rpc_timeout_secs")]
    pub rpc_timeout_secs: u64,

    /// Environment variable holding this network's signing key.
    #[serde(default = "default_private_key_env")]
    pub private_key_env: String,
}

fn default_rpc_timeout_secs() -> u64 {
    10
}

fn default_private_key_env() -> String {
    crate::blockchain::wallet::PRIVATE_KEY_ENV_VAR.to_string()
}

/// Receipt polling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConfirmationConfig {
    /// First poll delay; doubles on every poll.
    pub poll_base_delay_ms: u64,

    /// Total polling budget before reporting a timeout.
    pub poll_ceiling_secs: u64,

    /// Log per-poll progress at info instead of debug.
    pub verbose: bool,
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            poll_base_delay_ms: 1000,
            // Blocks are mined every ~15s but some providers take ~40-60s to serve a receipt.
            poll_ceiling_secs: 120,
            verbose: false,
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of attempts (at least one is always made).
    pub max_attempts: u32,

    /// Ceiling for a single backoff wait in milliseconds.
    pub max_wait_ms: u64,

    /// Jitter ratio applied to each wait (0.2 = +/- 20%).
    pub jitter: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            max_wait_ms: 2 * 60 * 1000,
            jitter: 0.2,
        }
    }
}

/// Fixed-point conversion configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UnitsConfig {
    /// Decimal places between token units and natural units.
    pub decimals: u8,
}

impl Default for UnitsConfig {
    fn default() -> Self {
        Self { decimals: 18 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
