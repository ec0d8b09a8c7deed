//! Client library for a pausable, ownable token on an eventually-consistent ledger.
//!
//! State changes are estimated, broadcast once and then polled until the ledger
//! confirms, reverts, or the polling budget runs out. Outcomes that are still
//! unknown are reported as such, never as success or failure.

pub mod blockchain;
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod token;

pub use blockchain::{LedgerEndpoint, LedgerError, LedgerResult, NetworkId, Receipt};
pub use config::schema::TokenConfig;
pub use lifecycle::{CancelHandle, Cancellation};
pub use resilience::with_retries;
pub use token::{DisplayAmount, TokenClient};
