//! Token façade subsystem.
//!
//! # Data Flow
//! ```text
//! Caller (network id, addresses, amounts)
//!     → units.rs (token units → natural units)
//!     → networks.rs (resolve endpoint, token address, supplier, whitelist)
//!     → client.rs (preconditions → contract.rs call → submit → postcondition)
//!     → Receipt / balance / structured LedgerError
//! ```
//!
//! # Design Decisions
//! - Amounts are exact decimals; no floating point anywhere
//! - Each operation owns at most one pending transaction
//! - Only broadcast failures are retried

pub mod client;
pub mod contract;
pub mod networks;
pub mod units;

pub use client::TokenClient;
pub use networks::{Network, NetworkRegistry};
pub use units::{AmountError, DisplayAmount, UnitConverter};
