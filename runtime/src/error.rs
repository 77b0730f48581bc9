//! Runtime error types.

use thiserror::Error;

/// Errors raised while loading or validating a guest module, before any
/// frame runs. Mid-frame failures are `platon_hostapi::VmError` traps.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Wasmtime engine, compilation, or instantiation error.
    #[error("wasmtime error: {0}")]
    Wasmtime(#[from] anyhow::Error),

    /// Module validation failed (missing exports, bad imports, etc.).
    #[error("validation error: {0}")]
    Validation(String),
}
