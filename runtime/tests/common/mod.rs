//! Shared test scaffolding.
//!
//! `TestDriver` is a minimal but real VM driver: nested calls re-enter the
//! runtime recursively with a fresh frame, state is snapshotted around every
//! child, value transfers are settled against a shared in-memory `StateDB`,
//! and the depth bound is enforced. Guests are hand-written WAT modules.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use platon_hostapi::{
    gas::CALL_CREATE_DEPTH,
    types::keccak,
    Address, BlockContext, CallOutcome, Contract, EvmDriver, Hash, Log, MemStateDB, StateDB,
    U256, VmError,
};
use platon_runtime::{ExecOutcome, VmConfig, VmContext, WasmVm};

/// Deterministic 20-byte test address.
pub fn addr(b: u8) -> Address {
    Address::repeat_byte(b)
}

/// Transaction originator used for top-level frames.
pub fn origin() -> Address {
    addr(0xEE)
}

/// Escape an address for use inside a WAT data segment.
pub fn wat_addr(a: Address) -> String {
    a.iter().map(|b| format!("\\{:02x}", b)).collect()
}

// ── Shared state handle ──

/// `StateDB` handle shareable between the test, the driver, and nested
/// frames. Contract invocations are single-threaded, so `Rc<RefCell<..>>`
/// is all the plumbing needed.
#[derive(Clone, Default)]
pub struct SharedDb(pub Rc<RefCell<MemStateDB>>);

impl SharedDb {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateDB for SharedDb {
    fn get_balance(&self, a: Address) -> U256 {
        self.0.borrow().get_balance(a)
    }
    fn set_balance(&mut self, a: Address, balance: U256) {
        self.0.borrow_mut().set_balance(a, balance)
    }
    fn add_balance(&mut self, a: Address, amount: U256) {
        self.0.borrow_mut().add_balance(a, amount)
    }
    fn sub_balance(&mut self, a: Address, amount: U256) {
        self.0.borrow_mut().sub_balance(a, amount)
    }
    fn get_nonce(&self, a: Address) -> u64 {
        self.0.borrow().get_nonce(a)
    }
    fn set_nonce(&mut self, a: Address, nonce: u64) {
        self.0.borrow_mut().set_nonce(a, nonce)
    }
    fn get_code(&self, a: Address) -> Vec<u8> {
        self.0.borrow().get_code(a)
    }
    fn set_code(&mut self, a: Address, code: Vec<u8>) {
        self.0.borrow_mut().set_code(a, code)
    }
    fn get_code_hash(&self, a: Address) -> Hash {
        self.0.borrow().get_code_hash(a)
    }
    fn get_state(&self, a: Address, key: &[u8]) -> Vec<u8> {
        self.0.borrow().get_state(a, key)
    }
    fn set_state(&mut self, a: Address, key: &[u8], value: &[u8]) {
        self.0.borrow_mut().set_state(a, key, value)
    }
    fn migrate_storage(&mut self, src: Address, dst: Address) {
        self.0.borrow_mut().migrate_storage(src, dst)
    }
    fn has_suicided(&self, a: Address) -> bool {
        self.0.borrow().has_suicided(a)
    }
    fn suicide(&mut self, a: Address) {
        self.0.borrow_mut().suicide(a)
    }
    fn add_refund(&mut self, gas: u64) {
        self.0.borrow_mut().add_refund(gas)
    }
    fn add_log(&mut self, log: Log) {
        self.0.borrow_mut().add_log(log)
    }
    fn empty(&self, a: Address) -> bool {
        self.0.borrow().empty(a)
    }
    fn create_account(&mut self, a: Address) {
        self.0.borrow_mut().create_account(a)
    }
    fn snapshot(&mut self) -> usize {
        self.0.borrow_mut().snapshot()
    }
    fn revert_to_snapshot(&mut self, id: usize) {
        self.0.borrow_mut().revert_to_snapshot(id)
    }
}

// ── Recursive test driver ──

#[derive(Clone)]
pub struct TestDriver {
    pub vm: WasmVm,
    pub db: SharedDb,
    pub code: Rc<RefCell<BTreeMap<Address, Vec<u8>>>>,
    pub block: BlockContext,
    pub depth: u64,
    pub read_only: bool,
}

impl TestDriver {
    pub fn new(db: SharedDb, block: BlockContext) -> Self {
        Self {
            vm: WasmVm::new(VmConfig::default()).unwrap(),
            db,
            code: Rc::new(RefCell::new(BTreeMap::new())),
            block,
            depth: 0,
            read_only: false,
        }
    }

    /// Register a guest at `address`. The bytes are also stored as the
    /// account's code so emptiness and migration-source checks see it.
    pub fn install_code(&self, address: Address, wat: &str) {
        let bytes = wat.as_bytes().to_vec();
        self.db.clone().set_code(address, bytes.clone());
        self.code.borrow_mut().insert(address, bytes);
    }

    fn child(&self, read_only: bool) -> Self {
        let mut child = self.clone();
        child.depth += 1;
        child.read_only = read_only;
        child
    }

    fn check_depth(&self) -> Result<(), VmError> {
        if self.depth + 1 > CALL_CREATE_DEPTH {
            Err(VmError::CallDepth)
        } else {
            Ok(())
        }
    }

    fn run_frame(&self, contract: Contract, input: Vec<u8>, read_only: bool) -> CallOutcome {
        let module = self
            .vm
            .load(&contract.code)
            .map_err(|e| VmError::Internal(e.to_string()))?;
        let ctx = VmContext::new(
            Box::new(self.child(read_only)),
            Box::new(self.db.clone()),
            contract,
            input,
            read_only,
        );
        match self.vm.execute(&module, ctx) {
            Ok(out) if !out.reverted => Ok((out.output, out.gas_left)),
            Ok(_) => Err(VmError::Reverted),
            Err(e) => Err(e),
        }
    }
}

impl EvmDriver for TestDriver {
    fn block(&self) -> &BlockContext {
        &self.block
    }

    fn get_hash(&self, number: u64) -> Hash {
        keccak(&number.to_be_bytes())
    }

    fn depth(&self) -> u64 {
        self.depth
    }

    fn can_transfer(&self, db: &dyn StateDB, from: Address, value: U256) -> bool {
        db.get_balance(from) >= value
    }

    fn transfer(&mut self, db: &mut dyn StateDB, from: Address, to: Address, value: U256) {
        db.sub_balance(from, value);
        db.add_balance(to, value);
    }

    fn call(
        &mut self,
        db: &mut dyn StateDB,
        frame: &Contract,
        to: Address,
        input: Vec<u8>,
        gas: u64,
        value: U256,
    ) -> CallOutcome {
        self.check_depth()?;
        if !value.is_zero() && !self.can_transfer(db, frame.address, value) {
            return Err(VmError::InsufficientBalance);
        }

        let snap = db.snapshot();
        if !value.is_zero() {
            self.transfer(db, frame.address, to, value);
        }

        let code = self.code.borrow().get(&to).cloned();
        let result = match code {
            // Codeless account: the transfer is the whole effect.
            None => Ok((Vec::new(), gas)),
            Some(code) => {
                let code_hash = keccak(&code);
                let contract =
                    Contract::new(frame.address, to, value, gas).with_code(code, code_hash);
                self.run_frame(contract, input, self.read_only)
            }
        };

        match result {
            Ok(ok) => Ok(ok),
            Err(e) => {
                db.revert_to_snapshot(snap);
                Err(e)
            }
        }
    }

    fn delegate_call(
        &mut self,
        db: &mut dyn StateDB,
        frame: &Contract,
        to: Address,
        input: Vec<u8>,
        gas: u64,
    ) -> CallOutcome {
        self.check_depth()?;
        let snap = db.snapshot();

        let code = match self.code.borrow().get(&to).cloned() {
            None => return Ok((Vec::new(), gas)),
            Some(code) => code,
        };
        let code_hash = keccak(&code);
        // The delegate frame keeps the current frame's identity, caller,
        // and value; only the code comes from the target.
        let contract = Contract {
            address: frame.address,
            caller_address: frame.caller_address,
            caller: frame.caller,
            value: frame.value,
            gas,
            code_hash,
            code,
        };

        match self.run_frame(contract, input, self.read_only) {
            Ok(ok) => Ok(ok),
            Err(e) => {
                db.revert_to_snapshot(snap);
                Err(e)
            }
        }
    }

    fn static_call(
        &mut self,
        db: &mut dyn StateDB,
        frame: &Contract,
        to: Address,
        input: Vec<u8>,
        gas: u64,
    ) -> CallOutcome {
        self.check_depth()?;
        let snap = db.snapshot();

        let code = match self.code.borrow().get(&to).cloned() {
            None => return Ok((Vec::new(), gas)),
            Some(code) => code,
        };
        let code_hash = keccak(&code);
        let contract = Contract::new(frame.address, to, U256::ZERO, gas).with_code(code, code_hash);

        match self.run_frame(contract, input, true) {
            Ok(ok) => Ok(ok),
            Err(e) => {
                db.revert_to_snapshot(snap);
                Err(e)
            }
        }
    }

    fn deploy(&mut self, _db: &mut dyn StateDB, frame: &mut Contract) -> Result<Vec<u8>, VmError> {
        self.check_depth()?;
        let result = self.run_frame(frame.clone(), Vec::new(), false);
        match result {
            Ok((code, gas_left)) => {
                frame.gas = gas_left;
                Ok(code)
            }
            Err(e) => {
                if !e.is_revert() {
                    frame.gas = 0;
                }
                Err(e)
            }
        }
    }
}

// ── Top-level helpers ──

/// Default block context used across the scenario tests.
pub fn test_block() -> BlockContext {
    BlockContext {
        gas_price: U256::from(2u64),
        block_number: 1_337,
        gas_limit: 30_000_000,
        timestamp: 1_700_000_000,
        coinbase: addr(0xC0),
        origin: origin(),
    }
}

/// Build a driver over a fresh shared state.
pub fn test_driver() -> (TestDriver, SharedDb) {
    let db = SharedDb::new();
    let driver = TestDriver::new(db.clone(), test_block());
    (driver, db)
}

/// Run the contract installed at `address` as a top-level frame, applying
/// driver-style snapshot semantics: a revert or trap rolls state back, a
/// clean return commits.
pub fn run_tx(
    driver: &TestDriver,
    address: Address,
    input: Vec<u8>,
    gas: u64,
) -> Result<ExecOutcome, VmError> {
    run_tx_with_value(driver, address, input, gas, U256::ZERO)
}

pub fn run_tx_with_value(
    driver: &TestDriver,
    address: Address,
    input: Vec<u8>,
    gas: u64,
    value: U256,
) -> Result<ExecOutcome, VmError> {
    let code = driver
        .code
        .borrow()
        .get(&address)
        .cloned()
        .expect("no code installed at target");
    let code_hash = keccak(&code);
    let contract = Contract::new(origin(), address, value, gas).with_code(code, code_hash);
    run_tx_with_contract(driver, contract, input)
}

/// Run a top-level frame from an explicitly constructed contract record.
pub fn run_tx_with_contract(
    driver: &TestDriver,
    contract: Contract,
    input: Vec<u8>,
) -> Result<ExecOutcome, VmError> {
    run_frame_with_opts(driver, contract, input, false)
}

/// Same, with the frame forced read-only.
pub fn run_readonly_tx(
    driver: &TestDriver,
    contract: Contract,
    input: Vec<u8>,
) -> Result<ExecOutcome, VmError> {
    run_frame_with_opts(driver, contract, input, true)
}

fn run_frame_with_opts(
    driver: &TestDriver,
    contract: Contract,
    input: Vec<u8>,
    read_only: bool,
) -> Result<ExecOutcome, VmError> {
    let module = driver
        .vm
        .load(&contract.code)
        .map_err(|e| VmError::Internal(e.to_string()))?;
    let snap = driver.db.clone().snapshot();
    let ctx = VmContext::new(
        Box::new(driver.clone()),
        Box::new(driver.db.clone()),
        contract,
        input,
        read_only,
    );
    let result = driver.vm.execute(&module, ctx);
    match &result {
        Ok(out) if out.reverted => driver.db.clone().revert_to_snapshot(snap),
        Err(_) => driver.db.clone().revert_to_snapshot(snap),
        Ok(_) => {}
    }
    result
}
