//! `platon-runtime` — Wasmtime-embedded host runtime for PlatON WASM
//! contracts.
//!
//! This crate registers the fixed `platon_*` host-function table with a
//! deterministic Wasmtime engine and executes one contract frame at a time.
//! It enforces:
//!
//! - **Determinism:** no SIMD, no threads, no multi-memory, NaN
//!   canonicalization, fuel metering as a runaway-compute backstop
//! - **Gas metering:** every host call charges the consensus schedule
//!   before its effect
//! - **Memory safety:** all guest pointers bounds-checked, no implicit
//!   memory growth
//! - **ABI validation:** imports checked against the descriptor table,
//!   required exports checked before execution
//!
//! The primary entry point is [`WasmVm::execute`].

pub mod abi;
pub mod error;
pub mod config;
pub mod memory;
pub mod context;
pub mod calls;
pub mod migrate;
pub mod validation;
pub mod linker;
pub mod runtime;

pub use error::RuntimeError;
pub use config::VmConfig;
pub use context::{VmContext, WasmLogger};
pub use runtime::{ExecOutcome, WasmVm};
