//! Shared utilities for integration testing.
//!
//! [`MockLedger`] is an in-memory token contract behind the `LedgerEndpoint` seam.
//! Broadcasts are applied immediately and their receipts show up on the first poll,
//! unless a different [`ReceiptMode`] is scripted.

#![allow(dead_code)]

use alloy::primitives::{keccak256, Address, Bytes, TxHash, U256};
use alloy::sol_types::{SolInterface, SolValue};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use token_ledger::blockchain::types::{ContractCall, LedgerError, LedgerResult, Receipt};
use token_ledger::blockchain::LedgerEndpoint;
use token_ledger::config::schema::{RetryConfig, TokenConfig};
use token_ledger::token::contract::IOriginToken::IOriginTokenCalls;
use token_ledger::token::{Network, NetworkRegistry, TokenClient};
use token_ledger::NetworkId;

pub const TOKEN: Address = Address::repeat_byte(0x70);
pub const SENDER: Address = Address::repeat_byte(0x01);
pub const RECIPIENT: Address = Address::repeat_byte(0x02);
pub const STRANGER: Address = Address::repeat_byte(0x03);
pub const NETWORK: &str = "999";

/// What the ledger does with an accepted broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptMode {
    /// Apply the call and report success (the call may still revert on contract rules).
    Succeed,
    /// Report a failure receipt without applying the call.
    Revert,
    /// Never produce a receipt.
    Never,
    /// Report success but leave state untouched.
    SucceedWithoutEffect,
}

#[derive(Debug)]
struct LedgerState {
    balances: HashMap<Address, U256>,
    paused: bool,
    owner: Address,
    receipt_mode: ReceiptMode,
    failing_sends: u32,
    estimate_error: Option<String>,
    receipts: HashMap<TxHash, Receipt>,
    nonce: u64,
    sends: u32,
    calls: u32,
    polls: u32,
}

/// In-memory pausable, ownable token.
#[derive(Debug)]
pub struct MockLedger {
    sender: Address,
    state: Mutex<LedgerState>,
}

impl MockLedger {
    /// Ledger whose default sender is also owner and supplier.
    pub fn new() -> Self {
        Self {
            sender: SENDER,
            state: Mutex::new(LedgerState {
                balances: HashMap::new(),
                paused: false,
                owner: SENDER,
                receipt_mode: ReceiptMode::Succeed,
                failing_sends: 0,
                estimate_error: None,
                receipts: HashMap::new(),
                nonce: 0,
                sends: 0,
                calls: 0,
                polls: 0,
            }),
        }
    }

    pub fn with_balance(self, holder: Address, amount: u64) -> Self {
        self.state.lock().unwrap().balances.insert(holder, U256::from(amount));
        self
    }

    pub fn with_paused(self, paused: bool) -> Self {
        self.state.lock().unwrap().paused = paused;
        self
    }

    pub fn with_owner(self, owner: Address) -> Self {
        self.state.lock().unwrap().owner = owner;
        self
    }

    pub fn with_receipt_mode(self, mode: ReceiptMode) -> Self {
        self.state.lock().unwrap().receipt_mode = mode;
        self
    }

    /// Refuse the next `n` broadcasts before issuing a hash.
    pub fn failing_sends(self, n: u32) -> Self {
        self.state.lock().unwrap().failing_sends = n;
        self
    }

    pub fn failing_estimates(self, reason: &str) -> Self {
        self.state.lock().unwrap().estimate_error = Some(reason.to_string());
        self
    }

    pub fn balance_of(&self, holder: Address) -> U256 {
        self.state
            .lock()
            .unwrap()
            .balances
            .get(&holder)
            .copied()
            .unwrap_or_default()
    }

    pub fn is_paused(&self) -> bool {
        self.state.lock().unwrap().paused
    }

    pub fn owner(&self) -> Address {
        self.state.lock().unwrap().owner
    }

    /// Broadcast attempts, including refused ones.
    pub fn sends(&self) -> u32 {
        self.state.lock().unwrap().sends
    }

    /// Read-only calls served.
    pub fn calls(&self) -> u32 {
        self.state.lock().unwrap().calls
    }

    pub fn polls(&self) -> u32 {
        self.state.lock().unwrap().polls
    }
}

impl LedgerState {
    /// Execute a state-changing call as the contract would. `false` means revert.
    fn execute(&mut self, from: Address, call: IOriginTokenCalls) -> bool {
        match call {
            IOriginTokenCalls::transfer(transfer) => {
                if self.paused {
                    return false;
                }
                let available = self.balances.get(&from).copied().unwrap_or_default();
                if available < transfer.value {
                    return false;
                }
                self.balances.insert(from, available - transfer.value);
                *self.balances.entry(transfer.to).or_default() += transfer.value;
                true
            }
            IOriginTokenCalls::pause(_) if from == self.owner && !self.paused => {
                self.paused = true;
                true
            }
            IOriginTokenCalls::unpause(_) if from == self.owner && self.paused => {
                self.paused = false;
                true
            }
            IOriginTokenCalls::transferOwnership(transfer) if from == self.owner => {
                self.owner = transfer.newOwner;
                true
            }
            _ => false,
        }
    }
}

fn decode(call: &ContractCall) -> LedgerResult<IOriginTokenCalls> {
    IOriginTokenCalls::abi_decode(&call.input).map_err(|e| LedgerError::Rpc(e.to_string()))
}

#[async_trait]
impl LedgerEndpoint for MockLedger {
    async fn call(&self, call: &ContractCall) -> LedgerResult<Bytes> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        let encoded = match decode(call)? {
            IOriginTokenCalls::balanceOf(query) => state
                .balances
                .get(&query.account)
                .copied()
                .unwrap_or_default()
                .abi_encode(),
            IOriginTokenCalls::paused(_) => state.paused.abi_encode(),
            IOriginTokenCalls::owner(_) => state.owner.abi_encode(),
            _ => return Err(LedgerError::Rpc("not a view function".to_string())),
        };
        Ok(encoded.into())
    }

    async fn estimate_gas(&self, call: &ContractCall, _from: Address) -> LedgerResult<u64> {
        decode(call)?;
        match &self.state.lock().unwrap().estimate_error {
            Some(reason) => Err(LedgerError::Rpc(reason.clone())),
            None => Ok(50_000),
        }
    }

    async fn send(&self, call: &ContractCall, from: Address, _gas: u64) -> LedgerResult<TxHash> {
        let decoded = decode(call)?;
        let mut state = self.state.lock().unwrap();
        state.sends += 1;
        if state.failing_sends > 0 {
            state.failing_sends -= 1;
            return Err(LedgerError::Rpc("connection reset by peer".to_string()));
        }

        state.nonce += 1;
        let tx_hash = keccak256(state.nonce.to_be_bytes());
        let success = match state.receipt_mode {
            ReceiptMode::Never => return Ok(tx_hash),
            ReceiptMode::Succeed => state.execute(from, decoded),
            ReceiptMode::Revert => false,
            ReceiptMode::SucceedWithoutEffect => true,
        };
        let receipt = Receipt {
            tx_hash,
            block_number: Some(state.nonce),
            gas_used: 21_000,
            success,
        };
        state.receipts.insert(tx_hash, receipt);
        Ok(tx_hash)
    }

    async fn get_receipt(&self, tx_hash: TxHash) -> LedgerResult<Option<Receipt>> {
        let mut state = self.state.lock().unwrap();
        state.polls += 1;
        Ok(state.receipts.get(&tx_hash).cloned())
    }

    fn default_sender(&self) -> Address {
        self.sender
    }
}

/// Config with deterministic (unjittered) retries.
pub fn test_config() -> TokenConfig {
    TokenConfig {
        retries: RetryConfig {
            jitter: 0.0,
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn network_id() -> NetworkId {
    NetworkId::from(NETWORK)
}

/// Client with one network backed by `ledger`.
pub fn client_with(ledger: Arc<MockLedger>, whitelist: Vec<Address>) -> TokenClient {
    let mut registry = NetworkRegistry::new();
    registry.register(Network::new(NETWORK, ledger, TOKEN).with_owner_whitelist(whitelist));
    TokenClient::new(registry, &test_config()).unwrap()
}

pub fn client(ledger: Arc<MockLedger>) -> TokenClient {
    client_with(ledger, Vec::new())
}
