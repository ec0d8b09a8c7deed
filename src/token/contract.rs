//! Token contract ABI and call builders.

use alloy::primitives::{Address, U256};
use alloy::sol;
use alloy::sol_types::SolCall;

use crate::blockchain::types::{ContractCall, LedgerError, LedgerResult};

sol! {
    /// The subset of the pausable, ownable ERC-20 token the client drives.
    #[sol(all_derives)]
    interface IOriginToken {
        function balanceOf(address account) external view returns (uint256);
        function paused() external view returns (bool);
        function owner() external view returns (address);
        function transfer(address to, uint256 value) external returns (bool);
        function pause() external;
        function unpause() external;
        function transferOwnership(address newOwner) external;
    }
}

use IOriginToken::{
    balanceOfCall, ownerCall, pauseCall, pausedCall, transferCall, transferOwnershipCall,
    unpauseCall,
};

fn encode<C: SolCall>(token: Address, method: &'static str, call: &C) -> ContractCall {
    ContractCall {
        to: token,
        input: call.abi_encode().into(),
        method,
    }
}

fn decode<C: SolCall>(method: &'static str, data: &[u8]) -> LedgerResult<C::Return> {
    C::abi_decode_returns(data).map_err(|e| LedgerError::Abi {
        method,
        reason: e.to_string(),
    })
}

pub fn balance_of(token: Address, account: Address) -> ContractCall {
    encode(token, "balanceOf", &balanceOfCall { account })
}

pub fn decode_balance_of(data: &[u8]) -> LedgerResult<U256> {
    decode::<balanceOfCall>("balanceOf", data)
}

pub fn paused(token: Address) -> ContractCall {
    encode(token, "paused", &pausedCall {})
}

pub fn decode_paused(data: &[u8]) -> LedgerResult<bool> {
    decode::<pausedCall>("paused", data)
}

pub fn owner(token: Address) -> ContractCall {
    encode(token, "owner", &ownerCall {})
}

pub fn decode_owner(data: &[u8]) -> LedgerResult<Address> {
    decode::<ownerCall>("owner", data)
}

pub fn transfer(token: Address, to: Address, value: U256) -> ContractCall {
    encode(token, "transfer", &transferCall { to, value })
}

pub fn pause(token: Address) -> ContractCall {
    encode(token, "pause", &pauseCall {})
}

pub fn unpause(token: Address) -> ContractCall {
    encode(token, "unpause", &unpauseCall {})
}

pub fn transfer_ownership(token: Address, new_owner: Address) -> ContractCall {
    encode(token, "transferOwnership", &transferOwnershipCall { newOwner: new_owner })
}
