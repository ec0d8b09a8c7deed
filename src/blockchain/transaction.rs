//! Transaction submission and confirmation.
//!
//! # Responsibilities
//! - Estimate gas (unless the caller supplied a budget)
//! - Broadcast exactly once and capture the transaction hash
//! - Poll for the receipt with a doubling delay, bounded by a total ceiling
//! - Classify the outcome: confirmed, reverted, timed out or cancelled
//!
//! # Design Decisions
//! - Never re-broadcasts: a broadcast failure is returned for the caller to retry
//! - A reverted receipt is final; a missing receipt is reported as unknown, never as failure
//! - Transient errors while polling are logged and polling continues
//! - Every await selects on the caller's cancellation token

use alloy::primitives::{Address, TxHash};
use std::time::Duration;
use tokio::time::{sleep, Instant};

use crate::blockchain::client::LedgerEndpoint;
use crate::blockchain::types::{
    ContractCall, LedgerError, LedgerResult, NetworkId, Receipt, SendOptions,
};
use crate::config::schema::ConfirmationConfig;
use crate::lifecycle::Cancellation;
use crate::observability::metrics;
use crate::resilience::backoff::poll_delay;

/// Logs at info when verbose, debug otherwise.
macro_rules! vlog {
    ($verbose:expr, $($arg:tt)+) => {
        if $verbose {
            tracing::info!($($arg)+);
        } else {
            tracing::debug!($($arg)+);
        }
    };
}

/// Where a broadcast transaction stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationStatus {
    /// Broadcast, no receipt yet.
    Pending,
    /// Receipt with success status.
    Confirmed(Receipt),
    /// Receipt with failure status.
    Reverted(Receipt),
    /// Polling budget exhausted without a receipt.
    TimedOut,
    /// Caller cancelled while polling.
    Cancelled,
}

impl ConfirmationStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ConfirmationStatus::Pending)
    }
}

/// One in-flight broadcast, owned by the poll loop that created it.
#[derive(Debug)]
pub struct PendingTransaction {
    pub network: NetworkId,
    pub tx_hash: TxHash,
    /// Total time spent sleeping between polls.
    pub elapsed: Duration,
    pub polls: u32,
    pub status: ConfirmationStatus,
}

impl PendingTransaction {
    fn new(network: NetworkId, tx_hash: TxHash) -> Self {
        Self {
            network,
            tx_hash,
            elapsed: Duration::ZERO,
            polls: 0,
            status: ConfirmationStatus::Pending,
        }
    }

    fn into_result(self) -> LedgerResult<Receipt> {
        match self.status {
            ConfirmationStatus::Confirmed(receipt) => Ok(receipt),
            ConfirmationStatus::Reverted(receipt) => Err(LedgerError::Reverted {
                tx_hash: self.tx_hash,
                receipt,
            }),
            ConfirmationStatus::Cancelled => Err(LedgerError::Cancelled {
                tx_hash: Some(self.tx_hash),
            }),
            ConfirmationStatus::TimedOut | ConfirmationStatus::Pending => Err(LedgerError::TimedOut {
                tx_hash: self.tx_hash,
                waited_ms: self.elapsed.as_millis() as u64,
            }),
        }
    }
}

/// Submits calls and waits for their receipts.
#[derive(Debug, Clone)]
pub struct TxSubmitter {
    base_delay: Duration,
    ceiling: Duration,
    verbose: bool,
}

impl Default for TxSubmitter {
    fn default() -> Self {
        Self::new(&ConfirmationConfig::default())
    }
}

/// Floor for the first poll delay, so every sleep advances the polling budget.
const MIN_POLL_DELAY: Duration = Duration::from_millis(1);

impl TxSubmitter {
    pub fn new(config: &ConfirmationConfig) -> Self {
        Self {
            base_delay: Duration::from_millis(config.poll_base_delay_ms).max(MIN_POLL_DELAY),
            ceiling: Duration::from_secs(config.poll_ceiling_secs),
            verbose: config.verbose,
        }
    }

    /// Total polling budget.
    pub fn ceiling(&self) -> Duration {
        self.ceiling
    }

    /// Estimate, broadcast once, poll, classify.
    pub async fn submit(
        &self,
        endpoint: &dyn LedgerEndpoint,
        network: &NetworkId,
        call: &ContractCall,
        options: &SendOptions,
        cancel: &Cancellation,
    ) -> LedgerResult<Receipt> {
        let from = options.from.unwrap_or_else(|| endpoint.default_sender());

        let result = self.submit_inner(endpoint, network, call, from, options.gas, cancel).await;

        let outcome = match &result {
            Ok(_) => "confirmed",
            Err(e) => e.kind(),
        };
        metrics::record_submission(network.as_str(), outcome);

        result
    }

    async fn submit_inner(
        &self,
        endpoint: &dyn LedgerEndpoint,
        network: &NetworkId,
        call: &ContractCall,
        from: Address,
        gas: Option<u64>,
        cancel: &Cancellation,
    ) -> LedgerResult<Receipt> {
        let gas = match gas {
            Some(gas) => gas,
            None => {
                let estimate = tokio::select! {
                    res = endpoint.estimate_gas(call, from) => res,
                    _ = cancel.cancelled() => return Err(LedgerError::Cancelled { tx_hash: None }),
                };
                let gas = estimate.map_err(|e| LedgerError::EstimationFailed {
                    method: call.method,
                    reason: e.to_string(),
                })?;
                vlog!(self.verbose, network = %network, method = call.method, gas, "Estimated gas");
                gas
            }
        };

        vlog!(self.verbose, network = %network, method = call.method, from = %from, "Sending transaction");
        let sent = tokio::select! {
            res = endpoint.send(call, from, gas) => res,
            _ = cancel.cancelled() => return Err(LedgerError::Cancelled { tx_hash: None }),
        };
        let tx_hash = sent.map_err(|e| match e {
            LedgerError::Rpc(reason) => LedgerError::BroadcastFailed {
                method: call.method,
                reason,
            },
            other => other,
        })?;

        tracing::info!(network = %network, method = call.method, tx_hash = %tx_hash, "Transaction broadcast");

        let mut pending = PendingTransaction::new(network.clone(), tx_hash);
        self.wait_for_receipt(endpoint, &mut pending, cancel).await;
        pending.into_result()
    }

    /// Poll until `pending` reaches a terminal status.
    ///
    /// Sleeps `base, 2*base, 4*base, ...`, clipped so the total never exceeds the
    /// ceiling, and polls after each sleep. The last poll happens at the ceiling.
    pub async fn wait_for_receipt(
        &self,
        endpoint: &dyn LedgerEndpoint,
        pending: &mut PendingTransaction,
        cancel: &Cancellation,
    ) {
        let started = Instant::now();

        while !pending.status.is_terminal() {
            let remaining = self.ceiling.saturating_sub(pending.elapsed);
            if remaining.is_zero() {
                tracing::warn!(
                    network = %pending.network,
                    tx_hash = %pending.tx_hash,
                    waited_ms = pending.elapsed.as_millis() as u64,
                    "No transaction receipt within polling budget"
                );
                pending.status = ConfirmationStatus::TimedOut;
                break;
            }

            let nap = poll_delay(pending.polls, self.base_delay, self.ceiling).min(remaining);
            vlog!(
                self.verbose,
                tx_hash = %pending.tx_hash,
                wait_ms = nap.as_millis() as u64,
                "Waiting for transaction receipt"
            );

            tokio::select! {
                _ = sleep(nap) => {}
                _ = cancel.cancelled() => {
                    tracing::info!(tx_hash = %pending.tx_hash, "Receipt polling cancelled");
                    pending.status = ConfirmationStatus::Cancelled;
                    break;
                }
            }
            pending.elapsed += nap;
            pending.polls += 1;
            metrics::record_poll(pending.network.as_str());

            let polled = tokio::select! {
                res = endpoint.get_receipt(pending.tx_hash) => res,
                _ = cancel.cancelled() => {
                    pending.status = ConfirmationStatus::Cancelled;
                    break;
                }
            };

            match polled {
                Ok(Some(receipt)) => {
                    metrics::record_confirmation_latency(pending.network.as_str(), started.elapsed());
                    if receipt.success {
                        tracing::info!(
                            tx_hash = %pending.tx_hash,
                            block_number = ?receipt.block_number,
                            gas_used = receipt.gas_used,
                            "Transaction successful"
                        );
                        pending.status = ConfirmationStatus::Confirmed(receipt);
                    } else {
                        tracing::warn!(
                            tx_hash = %pending.tx_hash,
                            block_number = ?receipt.block_number,
                            "Transaction reverted"
                        );
                        pending.status = ConfirmationStatus::Reverted(receipt);
                    }
                }
                Ok(None) => {
                    vlog!(self.verbose, tx_hash = %pending.tx_hash, polls = pending.polls, "Transaction pending");
                }
                Err(e) => {
                    tracing::warn!(tx_hash = %pending.tx_hash, error = %e, "Receipt lookup failed, will poll again");
                }
            }
        }
    }
}
