//! In-memory state backend for testing.
//!
//! `MemStateDB` implements `StateDB` over `BTreeMap`s for deterministic
//! iteration order. Snapshots are whole-state clones on a stack, cheap
//! enough at test scale and trivially correct for rollback.

use std::collections::BTreeMap;

use crate::state_db::{Log, StateDB};
use crate::types::{keccak, Address, Hash, U256, EMPTY_CODE_HASH};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Account {
    balance: U256,
    nonce: u64,
    code: Vec<u8>,
    storage: BTreeMap<Vec<u8>, Vec<u8>>,
    suicided: bool,
}

/// In-memory `StateDB` with snapshot/rollback support.
#[derive(Debug, Clone, Default)]
pub struct MemStateDB {
    accounts: BTreeMap<Address, Account>,
    logs: Vec<Log>,
    refund: u64,
    snapshots: Vec<(BTreeMap<Address, Account>, usize, u64)>,
}

impl MemStateDB {
    pub fn new() -> Self {
        Self::default()
    }

    fn account_mut(&mut self, addr: Address) -> &mut Account {
        self.accounts.entry(addr).or_default()
    }

    /// Test helper: seed an account with a balance.
    pub fn fund(&mut self, addr: Address, balance: U256) {
        self.account_mut(addr).balance = balance;
    }

    /// Logs accumulated so far.
    pub fn logs(&self) -> &[Log] {
        &self.logs
    }

    /// Current refund counter.
    pub fn refund(&self) -> u64 {
        self.refund
    }

    /// Number of storage pairs held by `addr`.
    pub fn storage_len(&self, addr: Address) -> usize {
        self.accounts.get(&addr).map_or(0, |a| a.storage.len())
    }
}

impl StateDB for MemStateDB {
    fn get_balance(&self, addr: Address) -> U256 {
        self.accounts.get(&addr).map_or(U256::ZERO, |a| a.balance)
    }

    fn set_balance(&mut self, addr: Address, balance: U256) {
        self.account_mut(addr).balance = balance;
    }

    fn add_balance(&mut self, addr: Address, amount: U256) {
        let acct = self.account_mut(addr);
        acct.balance += amount;
    }

    fn sub_balance(&mut self, addr: Address, amount: U256) {
        let acct = self.account_mut(addr);
        acct.balance -= amount;
    }

    fn get_nonce(&self, addr: Address) -> u64 {
        self.accounts.get(&addr).map_or(0, |a| a.nonce)
    }

    fn set_nonce(&mut self, addr: Address, nonce: u64) {
        self.account_mut(addr).nonce = nonce;
    }

    fn get_code(&self, addr: Address) -> Vec<u8> {
        self.accounts.get(&addr).map_or(Vec::new(), |a| a.code.clone())
    }

    fn set_code(&mut self, addr: Address, code: Vec<u8>) {
        self.account_mut(addr).code = code;
    }

    fn get_code_hash(&self, addr: Address) -> Hash {
        match self.accounts.get(&addr) {
            None => Hash::ZERO,
            Some(a) if a.code.is_empty() => EMPTY_CODE_HASH,
            Some(a) => keccak(&a.code),
        }
    }

    fn get_state(&self, addr: Address, key: &[u8]) -> Vec<u8> {
        self.accounts
            .get(&addr)
            .and_then(|a| a.storage.get(key))
            .cloned()
            .unwrap_or_default()
    }

    fn set_state(&mut self, addr: Address, key: &[u8], value: &[u8]) {
        self.account_mut(addr)
            .storage
            .insert(key.to_vec(), value.to_vec());
    }

    fn migrate_storage(&mut self, src: Address, dst: Address) {
        let storage = self
            .accounts
            .get_mut(&src)
            .map(|a| std::mem::take(&mut a.storage))
            .unwrap_or_default();
        self.account_mut(dst).storage = storage;
    }

    fn has_suicided(&self, addr: Address) -> bool {
        self.accounts.get(&addr).is_some_and(|a| a.suicided)
    }

    fn suicide(&mut self, addr: Address) {
        let acct = self.account_mut(addr);
        acct.suicided = true;
        acct.balance = U256::ZERO;
    }

    fn add_refund(&mut self, gas: u64) {
        self.refund += gas;
    }

    fn add_log(&mut self, log: Log) {
        self.logs.push(log);
    }

    fn empty(&self, addr: Address) -> bool {
        self.accounts.get(&addr).map_or(true, |a| {
            a.balance.is_zero() && a.nonce == 0 && a.code.is_empty()
        })
    }

    fn create_account(&mut self, addr: Address) {
        self.accounts.insert(addr, Account::default());
    }

    fn snapshot(&mut self) -> usize {
        self.snapshots
            .push((self.accounts.clone(), self.logs.len(), self.refund));
        self.snapshots.len() - 1
    }

    fn revert_to_snapshot(&mut self, id: usize) {
        let (accounts, log_len, refund) = self.snapshots[id].clone();
        self.accounts = accounts;
        self.logs.truncate(log_len);
        self.refund = refund;
        self.snapshots.truncate(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> Address {
        Address::repeat_byte(b)
    }

    #[test]
    fn test_balance_ops() {
        let mut db = MemStateDB::new();
        assert_eq!(db.get_balance(addr(1)), U256::ZERO);
        db.add_balance(addr(1), U256::from(100u64));
        db.sub_balance(addr(1), U256::from(40u64));
        assert_eq!(db.get_balance(addr(1)), U256::from(60u64));
    }

    #[test]
    fn test_storage_roundtrip() {
        let mut db = MemStateDB::new();
        db.set_state(addr(1), b"k", b"v");
        assert_eq!(db.get_state(addr(1), b"k"), b"v");
        assert_eq!(db.get_state(addr(1), b"missing"), Vec::<u8>::new());
        // Storage is per-account.
        assert_eq!(db.get_state(addr(2), b"k"), Vec::<u8>::new());
    }

    #[test]
    fn test_code_hash_states() {
        let mut db = MemStateDB::new();
        // Non-existent account: zero hash.
        assert_eq!(db.get_code_hash(addr(1)), Hash::ZERO);
        // Existing codeless account: hash of empty code.
        db.create_account(addr(1));
        assert_eq!(db.get_code_hash(addr(1)), EMPTY_CODE_HASH);
        db.set_code(addr(1), vec![1, 2, 3]);
        assert_eq!(db.get_code_hash(addr(1)), keccak(&[1, 2, 3]));
    }

    #[test]
    fn test_empty_predicate() {
        let mut db = MemStateDB::new();
        assert!(db.empty(addr(1)));
        db.create_account(addr(1));
        assert!(db.empty(addr(1)));
        db.add_balance(addr(1), U256::from(1u64));
        assert!(!db.empty(addr(1)));
    }

    #[test]
    fn test_suicide_zeroes_balance() {
        let mut db = MemStateDB::new();
        db.fund(addr(1), U256::from(50u64));
        db.suicide(addr(1));
        assert!(db.has_suicided(addr(1)));
        assert_eq!(db.get_balance(addr(1)), U256::ZERO);
    }

    #[test]
    fn test_migrate_storage_moves_all_pairs() {
        let mut db = MemStateDB::new();
        db.set_state(addr(1), b"k1", b"v1");
        db.set_state(addr(1), b"k2", b"v2");
        db.migrate_storage(addr(1), addr(2));
        assert_eq!(db.get_state(addr(2), b"k1"), b"v1");
        assert_eq!(db.get_state(addr(2), b"k2"), b"v2");
        assert_eq!(db.storage_len(addr(1)), 0);
    }

    #[test]
    fn test_snapshot_revert() {
        let mut db = MemStateDB::new();
        db.fund(addr(1), U256::from(10u64));
        let snap = db.snapshot();
        db.set_state(addr(1), b"k", b"v");
        db.add_balance(addr(1), U256::from(5u64));
        db.add_log(Log {
            address: addr(1),
            topics: vec![],
            data: vec![1],
            block_number: 7,
        });
        db.add_refund(100);

        db.revert_to_snapshot(snap);
        assert_eq!(db.get_balance(addr(1)), U256::from(10u64));
        assert_eq!(db.get_state(addr(1), b"k"), Vec::<u8>::new());
        assert!(db.logs().is_empty());
        assert_eq!(db.refund(), 0);
    }

    #[test]
    fn test_nested_snapshots() {
        let mut db = MemStateDB::new();
        let s0 = db.snapshot();
        db.fund(addr(1), U256::from(1u64));
        let s1 = db.snapshot();
        db.fund(addr(1), U256::from(2u64));

        db.revert_to_snapshot(s1);
        assert_eq!(db.get_balance(addr(1)), U256::from(1u64));
        db.revert_to_snapshot(s0);
        assert_eq!(db.get_balance(addr(1)), U256::ZERO);
    }
}
