//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Operation that may fail transiently:
//!     → retries.rs (attempt, classify failure, wait, attempt again)
//!     → backoff.rs (retry curve + jitter, receipt-poll doubling)
//! ```
//!
//! # Design Decisions
//! - Retry and receipt polling use separate curves: one decides whether to try a
//!   whole operation again, the other whether a broadcast has landed yet
//! - Attempts never overlap; every wait is cancellable
//! - Jittered backoff prevents thundering herd
//! - Callers choose what is retryable; the engine is domain-agnostic

pub mod backoff;
pub mod retries;

pub use retries::{with_retries, RetryError, RetryPolicy};
