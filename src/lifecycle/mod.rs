//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Caller creates CancelHandle
//!     → hands Cancellation tokens (optionally with a deadline) to operations
//!     → every suspension point selects on the token
//!     → firing stops the operation with a Cancelled outcome
//! ```
//!
//! # Design Decisions
//! - Cancellation is caller-initiated and never conflated with budget timeouts
//! - A deadline is just another way for the token to fire

pub mod cancel;

pub use cancel::{CancelHandle, Cancellation};
