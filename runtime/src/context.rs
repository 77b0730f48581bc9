//! Per-invocation frame state held in the Wasmtime `Store`.
//!
//! `VmContext` is created by the driver before interpretation begins and
//! discarded when the frame returns, reverts, or traps. Contexts are never
//! shared across concurrent invocations.

use platon_hostapi::{Contract, EvmDriver, StateDB, VmError};

/// Debug sink for the guest's tracing host call. Not consensus-critical.
#[derive(Default)]
pub struct WasmLogger {
    lines: Vec<String>,
}

impl WasmLogger {
    /// Record one debug line and forward it to the host tracing layer.
    pub fn debug(&mut self, msg: &str) {
        tracing::debug!(target: "platon_vm", guest = %msg);
        self.lines.push(msg.to_owned());
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

/// Mutable state of one contract frame, owned by `Store<VmContext>` for the
/// duration of the invocation.
pub struct VmContext {
    /// VM driver: block context and nested-call machinery.
    pub evm: Box<dyn EvmDriver>,
    /// Account-state backend for this invocation.
    pub db: Box<dyn StateDB>,
    /// Current frame: address, caller, value, remaining gas, code.
    pub contract: Contract,
    /// Immutable call data.
    pub input: Vec<u8>,
    /// Return data of the most recent nested call, overwritten by each one.
    pub call_out: Vec<u8>,
    /// Bytes the guest designated as this frame's result.
    pub output: Vec<u8>,
    /// When set, any state-mutating host call traps.
    pub read_only: bool,
    /// Set by the revert host call before termination.
    pub revert: bool,
    /// Guest debug sink.
    pub log: WasmLogger,
    /// Wasmtime resource-limiter state, configured by the runtime before
    /// instantiation.
    pub(crate) limits: wasmtime::StoreLimits,
}

impl VmContext {
    pub fn new(
        evm: Box<dyn EvmDriver>,
        db: Box<dyn StateDB>,
        contract: Contract,
        input: Vec<u8>,
        read_only: bool,
    ) -> Self {
        Self {
            evm,
            db,
            contract,
            input,
            call_out: Vec::new(),
            output: Vec::new(),
            read_only,
            revert: false,
            log: WasmLogger::default(),
            limits: wasmtime::StoreLimits::default(),
        }
    }

    /// Debit `amount` from the frame's remaining gas, trapping with
    /// `OutOfGas` when it does not fit. Gas is charged before the effect of
    /// the host call and is not refunded on a later trap.
    pub fn charge(&mut self, amount: u64) -> Result<(), VmError> {
        if self.contract.use_gas(amount) {
            Ok(())
        } else {
            Err(VmError::OutOfGas)
        }
    }

    /// Trap with `WriteProtection` if this frame is read-only.
    pub fn require_writable(&self) -> Result<(), VmError> {
        if self.read_only {
            Err(VmError::WriteProtection)
        } else {
            Ok(())
        }
    }
}
