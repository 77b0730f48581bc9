//! `platon-hostapi` — host-side model for the PlatON WASM contract runtime.
//!
//! This crate defines everything the host functions need that is independent
//! of the interpreter embedding:
//!
//! - `VmError` — the trap taxonomy shared by host functions and drivers
//! - `gas` — the consensus gas schedule, checked composition, and the
//!   nested-call budget adapter (`CallPlan`)
//! - `StateDB` trait — account/storage backend abstraction
//! - `EvmDriver` trait — the VM driver consumed by host functions for block
//!   context and nested invocations
//! - `Contract` — the per-frame record (address, caller, value, gas, code)
//! - `MemStateDB` — in-memory `StateDB` with snapshots, for testing
//!
//! The Wasmtime embedding lives in `platon-runtime`.

pub mod error;
pub mod types;
pub mod gas;
pub mod state_db;
pub mod evm;
pub mod mem_db;

// Re-export commonly used items at the crate root.
pub use error::VmError;
pub use types::{Address, Hash, U256};
pub use gas::CallPlan;
pub use state_db::{Log, StateDB};
pub use evm::{BlockContext, CallOutcome, Contract, EvmDriver};
pub use mem_db::MemStateDB;
