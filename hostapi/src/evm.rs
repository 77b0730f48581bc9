//! VM driver interface and per-frame contract record.
//!
//! The driver owns the block context and the recursion machinery: it builds
//! child frames, snapshots state around them, enforces the depth bound for
//! the call family, and settles value transfers. Host functions only ever
//! talk to it through `EvmDriver`, handing it the invocation's `StateDB`
//! where state is touched.

use crate::error::VmError;
use crate::state_db::StateDB;
use crate::types::{Address, Hash, U256};

/// Block- and transaction-level context, fixed for the whole invocation.
#[derive(Debug, Clone, Default)]
pub struct BlockContext {
    pub gas_price: U256,
    pub block_number: u64,
    pub gas_limit: u64,
    pub timestamp: u64,
    pub coinbase: Address,
    /// Transaction-level originator.
    pub origin: Address,
}

/// One contract invocation frame.
///
/// `caller` is the code-level caller (what the caller host function
/// reports); `caller_address` is the value-transfer sender. The two differ
/// only in delegate frames, where the child keeps its parent's identity.
#[derive(Debug, Clone)]
pub struct Contract {
    pub address: Address,
    pub caller_address: Address,
    pub caller: Address,
    pub value: U256,
    /// Remaining budget; monotonically non-increasing except when a nested
    /// call returns unused gas.
    pub gas: u64,
    pub code: Vec<u8>,
    pub code_hash: Hash,
}

impl Contract {
    pub fn new(caller: Address, address: Address, value: U256, gas: u64) -> Self {
        Self {
            address,
            caller_address: caller,
            caller,
            value,
            gas,
            code: Vec::new(),
            code_hash: Hash::ZERO,
        }
    }

    /// Attach the code this frame executes.
    pub fn with_code(mut self, code: Vec<u8>, code_hash: Hash) -> Self {
        self.code = code;
        self.code_hash = code_hash;
        self
    }

    /// Debit `amount` from the remaining budget. Returns false (leaving the
    /// budget untouched) when it does not fit.
    pub fn use_gas(&mut self, amount: u64) -> bool {
        match self.gas.checked_sub(amount) {
            Some(rest) => {
                self.gas = rest;
                true
            }
            None => false,
        }
    }
}

/// The result of one nested invocation: returned bytes and unused gas.
pub type CallOutcome = Result<(Vec<u8>, u64), VmError>;

/// Driver interface consumed by the host functions.
///
/// Nested-call entries return `Err` for every child failure, revert
/// included; the calling frame traps on any of them. The driver is
/// responsible for snapshotting state before a child frame and rolling back
/// when the child does not complete cleanly, for consuming the budget of a
/// fatally-trapped child, and for enforcing the depth bound.
pub trait EvmDriver {
    fn block(&self) -> &BlockContext;

    /// Hash of a historical block by number.
    fn get_hash(&self, number: u64) -> Hash;

    /// Current recursion depth of this frame.
    fn depth(&self) -> u64;

    fn can_transfer(&self, db: &dyn StateDB, from: Address, value: U256) -> bool;
    fn transfer(&mut self, db: &mut dyn StateDB, from: Address, to: Address, value: U256);

    /// Ordinary nested call: new frame at `to`, value moved from the
    /// current frame's address.
    fn call(
        &mut self,
        db: &mut dyn StateDB,
        frame: &Contract,
        to: Address,
        input: Vec<u8>,
        gas: u64,
        value: U256,
    ) -> CallOutcome;

    /// Run `to`'s code in the current frame's storage context, preserving
    /// caller and value.
    fn delegate_call(
        &mut self,
        db: &mut dyn StateDB,
        frame: &Contract,
        to: Address,
        input: Vec<u8>,
        gas: u64,
    ) -> CallOutcome;

    /// Nested call with the child frame forced read-only.
    fn static_call(
        &mut self,
        db: &mut dyn StateDB,
        frame: &Contract,
        to: Address,
        input: Vec<u8>,
        gas: u64,
    ) -> CallOutcome;

    /// Run `frame.code` as a constructor and return its output (the code to
    /// persist). `frame.gas` is left at the constructor's remaining budget.
    fn deploy(
        &mut self,
        db: &mut dyn StateDB,
        frame: &mut Contract,
    ) -> Result<Vec<u8>, VmError>;
}
