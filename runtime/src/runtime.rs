//! Runtime entry point — deterministic engine, module loading, and frame
//! execution.
//!
//! `WasmVm` owns a Wasmtime engine configured for consensus determinism.
//! Each frame runs in a fresh `Store<VmContext>`; the instance is discarded
//! when the frame returns, reverts, or traps.

use wasmtime::{Config, Engine, Linker, Module, Store, StoreLimitsBuilder, Trap};

use platon_hostapi::VmError;

use crate::abi::ENTRY_EXPORT;
use crate::config::VmConfig;
use crate::context::VmContext;
use crate::error::RuntimeError;
use crate::linker::register_host_functions;
use crate::validation::validate_module;

/// Result of one completed frame.
///
/// A revert is a completed frame: `reverted` is set, `output` carries the
/// revert data, and `gas_left` is preserved for the parent. Fatal traps
/// never produce an `ExecOutcome`.
#[derive(Debug)]
pub struct ExecOutcome {
    /// Bytes the guest designated as the frame result (or revert data).
    pub output: Vec<u8>,
    /// Remaining frame gas at termination.
    pub gas_left: u64,
    /// True when the frame terminated through the revert host call.
    pub reverted: bool,
    /// Debug lines collected from the guest.
    pub debug_log: Vec<String>,
}

/// The deterministic WASM contract runtime.
#[derive(Clone)]
pub struct WasmVm {
    engine: Engine,
    config: VmConfig,
}

impl WasmVm {
    pub fn new(config: VmConfig) -> Result<Self, RuntimeError> {
        let engine = create_engine()?;
        Ok(Self { engine, config })
    }

    /// Compile and validate a guest module against the host ABI.
    pub fn load(&self, wasm_bytes: &[u8]) -> Result<Module, RuntimeError> {
        let module = Module::new(&self.engine, wasm_bytes)?;
        validate_module(&module)?;
        Ok(module)
    }

    /// Run one frame to completion.
    ///
    /// The driver constructs the `VmContext` beforehand and the context is
    /// consumed here; a fresh instance is created for every frame so no
    /// state leaks between invocations.
    pub fn execute(&self, module: &Module, ctx: VmContext) -> Result<ExecOutcome, VmError> {
        let mut store = Store::new(&self.engine, ctx);
        store.data_mut().limits = StoreLimitsBuilder::new()
            .memory_size(self.config.max_memory_pages as usize * 65536)
            .memories(1)
            .build();
        store.limiter(|ctx| &mut ctx.limits);
        store
            .set_fuel(self.config.fuel_limit)
            .map_err(|e| VmError::Internal(e.to_string()))?;

        let mut linker: Linker<VmContext> = Linker::new(&self.engine);
        register_host_functions(&mut linker).map_err(|e| VmError::Internal(e.to_string()))?;

        let instance = linker
            .instantiate(&mut store, module)
            .map_err(|e| VmError::Internal(format!("instantiation failed: {e}")))?;
        let entry = instance
            .get_typed_func::<(), ()>(&mut store, ENTRY_EXPORT)
            .map_err(|e| VmError::Internal(format!("missing entry export: {e}")))?;

        let result = entry.call(&mut store, ());
        let ctx = store.into_data();

        match result {
            Ok(()) => Ok(ExecOutcome {
                output: ctx.output,
                gas_left: ctx.contract.gas,
                reverted: false,
                debug_log: ctx.log.into_lines(),
            }),
            Err(err) => {
                let trap = decode_trap(err);
                if trap.is_revert() {
                    Ok(ExecOutcome {
                        output: ctx.output,
                        gas_left: ctx.contract.gas,
                        reverted: true,
                        debug_log: ctx.log.into_lines(),
                    })
                } else {
                    Err(trap)
                }
            }
        }
    }
}

/// Create a Wasmtime engine with deterministic configuration.
fn create_engine() -> Result<Engine, RuntimeError> {
    let mut wasm_config = Config::new();

    // Fuel metering backstops runaway guest compute.
    wasm_config.consume_fuel(true);

    // Determinism enforcement.
    wasm_config.wasm_threads(false);
    wasm_config.wasm_simd(false);
    wasm_config.wasm_relaxed_simd(false);
    wasm_config.wasm_multi_memory(false);
    wasm_config.cranelift_nan_canonicalization(true);

    Ok(Engine::new(&wasm_config)?)
}

/// Recover the `VmError` a host function trapped with.
///
/// Interpreter-level traps map to `OutOfGas` (fuel) or `GuestTrap`; anything
/// else is a host-side failure.
fn decode_trap(err: anyhow::Error) -> VmError {
    match err.downcast::<VmError>() {
        Ok(vm_err) => vm_err,
        Err(err) => {
            if let Some(trap) = err.downcast_ref::<Trap>() {
                if *trap == Trap::OutOfFuel {
                    VmError::OutOfGas
                } else {
                    VmError::GuestTrap(trap.to_string())
                }
            } else {
                VmError::Internal(err.to_string())
            }
        }
    }
}
