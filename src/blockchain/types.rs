//! Chain-specific types and error definitions.

use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::rpc::types::TransactionReceipt;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::resilience::RetryError;
use crate::token::units::AmountError;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(pub u64);

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

/// Caller-facing identifier of a configured ledger network.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NetworkId(pub String);

impl NetworkId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NetworkId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NetworkId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A prepared contract invocation: target plus ABI-encoded input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    /// Contract address.
    pub to: Address,
    /// ABI-encoded call data.
    pub input: Bytes,
    /// Method name, for logs and errors.
    pub method: &'static str,
}

/// Options for a state-changing submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendOptions {
    /// Sender. Defaults to the endpoint's signing identity.
    pub from: Option<Address>,
    /// Explicit gas budget. Estimated when absent.
    pub gas: Option<u64>,
}

impl SendOptions {
    pub fn from(sender: Address) -> Self {
        Self {
            from: Some(sender),
            gas: None,
        }
    }

    pub fn with_gas(mut self, gas: u64) -> Self {
        self.gas = Some(gas);
        self
    }
}

/// Durable record of a processed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    pub gas_used: u64,
    /// Execution status: false means the call reverted.
    pub success: bool,
}

impl From<&TransactionReceipt> for Receipt {
    fn from(receipt: &TransactionReceipt) -> Self {
        Self {
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
            success: receipt.status(),
        }
    }
}

/// A local check that failed before anything was broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Precondition {
    #[error("insufficient funds for token transfer: balance {available}, requested {requested}")]
    InsufficientBalance { available: U256, requested: U256 },

    #[error("token transfers are paused")]
    TransfersPaused,

    #[error("token is already paused")]
    AlreadyPaused,

    #[error("token is already unpaused")]
    AlreadyUnpaused,

    #[error("sender {sender} is not owner of token contract ({owner})")]
    NotOwner { sender: Address, owner: Address },

    #[error("old and new owner are the same ({0})")]
    SameOwner(Address),

    #[error("{0} is not a valid owner for the token contract")]
    OwnerNotAllowed(Address),
}

/// Errors that can occur during ledger operations.
///
/// Only [`LedgerError::BroadcastFailed`] is safe to retry: nothing reached the
/// network. Everything else is either deterministic or ambiguous.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A local check failed; nothing was broadcast.
    #[error("precondition failed: {0}")]
    PreconditionFailed(Precondition),

    /// Gas estimation predicts the call would fail.
    #[error("gas estimation failed for {method}: {reason}")]
    EstimationFailed { method: &'static str, reason: String },

    /// The node refused the submission before issuing a transaction hash.
    #[error("broadcast failed for {method}: {reason}")]
    BroadcastFailed { method: &'static str, reason: String },

    /// The network accepted the call and then rejected it.
    #[error("transaction {tx_hash} reverted")]
    Reverted { tx_hash: TxHash, receipt: Receipt },

    /// No receipt within the polling budget. The transaction may still confirm.
    #[error("no receipt for transaction {tx_hash} after {waited_ms}ms; it may still confirm")]
    TimedOut { tx_hash: TxHash, waited_ms: u64 },

    /// The caller cancelled the operation.
    #[error("operation cancelled")]
    Cancelled { tx_hash: Option<TxHash> },

    /// Confirmed state differs from the intended outcome.
    #[error("{what} should be {expected} but is {observed}")]
    PostconditionMismatch {
        what: &'static str,
        expected: String,
        observed: String,
    },

    /// The retry budget ran out.
    #[error("number of retries exceeded after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: Box<LedgerError> },

    #[error(transparent)]
    Amount(#[from] AmountError),

    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// Return data could not be decoded.
    #[error("ABI decode error in {method}: {reason}")]
    Abi { method: &'static str, reason: String },

    /// Invalid private key format or signer mismatch.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// Chain configuration mismatch.
    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },

    /// No network registered under this id.
    #[error("unknown network '{0}'")]
    UnknownNetwork(NetworkId),
}

impl LedgerError {
    /// Whether resubmitting could change the outcome without risking a duplicate.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::BroadcastFailed { .. })
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerError::PreconditionFailed(_) => "precondition_failed",
            LedgerError::EstimationFailed { .. } => "estimation_failed",
            LedgerError::BroadcastFailed { .. } => "broadcast_failed",
            LedgerError::Reverted { .. } => "reverted",
            LedgerError::TimedOut { .. } => "timed_out",
            LedgerError::Cancelled { .. } => "cancelled",
            LedgerError::PostconditionMismatch { .. } => "postcondition_mismatch",
            LedgerError::RetriesExhausted { .. } => "retries_exhausted",
            LedgerError::Amount(_) => "amount",
            LedgerError::Rpc(_) => "rpc",
            LedgerError::Timeout(_) => "rpc_timeout",
            LedgerError::Abi { .. } => "abi",
            LedgerError::Wallet(_) => "wallet",
            LedgerError::ChainMismatch { .. } => "chain_mismatch",
            LedgerError::UnknownNetwork(_) => "unknown_network",
        }
    }
}

impl From<Precondition> for LedgerError {
    fn from(precondition: Precondition) -> Self {
        LedgerError::PreconditionFailed(precondition)
    }
}

impl From<RetryError<LedgerError>> for LedgerError {
    fn from(err: RetryError<LedgerError>) -> Self {
        match err {
            RetryError::Exhausted { attempts, last } => LedgerError::RetriesExhausted {
                attempts,
                last: Box::new(last),
            },
            RetryError::Aborted(e) => e,
            // Only broadcast failures are retried, so nothing is in flight.
            RetryError::Cancelled { .. } => LedgerError::Cancelled { tx_hash: None },
        }
    }
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
