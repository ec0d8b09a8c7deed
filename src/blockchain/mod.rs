//! Ledger integration subsystem.
//!
//! # Data Flow
//! ```text
//! Environment Variables (private key) + NetworkConfig
//!     → wallet.rs (key loading, signing identity)
//!     → client.rs (LedgerEndpoint: calls, estimates, broadcasts, receipts)
//!     → transaction.rs (estimate, broadcast once, poll, classify)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys or sensitive data
//! - All RPC calls have configurable timeouts
//! - Graceful degradation when the node is unreachable

pub mod client;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use client::{LedgerEndpoint, RpcEndpoint};
pub use transaction::{ConfirmationStatus, PendingTransaction, TxSubmitter};
pub use types::{
    ChainId, ContractCall, LedgerError, LedgerResult, NetworkId, Precondition, Receipt,
    SendOptions,
};
pub use wallet::Wallet;
