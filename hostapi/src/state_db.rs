//! Account-state backend abstraction.
//!
//! `StateDB` is the interface the host functions consume from the chain's
//! state layer. Implementations must be deterministic and single-writer per
//! contract invocation; the driver snapshots before every nested frame and
//! rolls back on trap or revert.

use crate::types::{Address, Hash, U256};

/// One log entry emitted by a contract.
///
/// Topics are already Keccak-256 hashed when they reach the state layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Log {
    pub address: Address,
    pub topics: Vec<Hash>,
    pub data: Vec<u8>,
    pub block_number: u64,
}

/// Abstraction over the account trie consumed by the runtime.
pub trait StateDB {
    fn get_balance(&self, addr: Address) -> U256;
    fn set_balance(&mut self, addr: Address, balance: U256);
    fn add_balance(&mut self, addr: Address, amount: U256);
    fn sub_balance(&mut self, addr: Address, amount: U256);

    fn get_nonce(&self, addr: Address) -> u64;
    fn set_nonce(&mut self, addr: Address, nonce: u64);

    fn get_code(&self, addr: Address) -> Vec<u8>;
    fn set_code(&mut self, addr: Address, code: Vec<u8>);
    fn get_code_hash(&self, addr: Address) -> Hash;

    /// Read a storage value on `addr`. Returns the empty vector when the
    /// key is absent.
    fn get_state(&self, addr: Address, key: &[u8]) -> Vec<u8>;
    fn set_state(&mut self, addr: Address, key: &[u8], value: &[u8]);

    /// Move every storage pair of `src` onto `dst`.
    fn migrate_storage(&mut self, src: Address, dst: Address);

    fn has_suicided(&self, addr: Address) -> bool;
    /// Mark `addr` for deletion at end of transaction.
    fn suicide(&mut self, addr: Address);

    /// Accumulate into the end-of-transaction refund counter.
    fn add_refund(&mut self, gas: u64);

    fn add_log(&mut self, log: Log);

    /// True when the account has zero balance, zero nonce, and no code.
    fn empty(&self, addr: Address) -> bool;

    fn create_account(&mut self, addr: Address);

    /// Capture a revision handle for later rollback.
    fn snapshot(&mut self) -> usize;
    /// Discard every mutation made after `id` was captured.
    fn revert_to_snapshot(&mut self, id: usize);
}
