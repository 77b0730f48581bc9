//! Trap taxonomy for the WASM contract runtime.
//!
//! Every host function returns `Result<_, VmError>`; an `Err` aborts the
//! current frame. All variants are fatal to the frame except `Reverted`,
//! which the execution boundary converts into a clean revert outcome with
//! remaining gas preserved. Gas already charged is never refunded by a trap.

use thiserror::Error;

/// Errors raised by host functions and nested-call drivers.
///
/// The driver unwinds the frame on any of these and rolls its state
/// snapshot back; `Reverted` additionally keeps the frame's output as
/// revert data and refunds the unused budget to the parent.
#[derive(Debug, Error)]
pub enum VmError {
    /// The frame's remaining gas is smaller than the amount charged.
    #[error("out of gas")]
    OutOfGas,

    /// A gas computation exceeded `u64::MAX`.
    #[error("gas uint64 overflow")]
    GasOverflow,

    /// A guest pointer/length pair fell outside linear memory.
    #[error("memory access out of bounds")]
    MemoryAccess,

    /// A state-mutating host call was made in a read-only frame.
    #[error("write protection")]
    WriteProtection,

    /// Nested-call or migrate recursion exceeded the depth bound.
    #[error("max call depth exceeded")]
    CallDepth,

    /// The sender cannot afford the requested value transfer.
    #[error("insufficient balance for transfer")]
    InsufficientBalance,

    /// The derived creation address is already occupied.
    #[error("contract address collision")]
    AddressCollision,

    /// Deployed code exceeds the code-size bound.
    #[error("max code size exceeded")]
    MaxCodeSize,

    /// Not enough gas left in the constructor frame to persist its code.
    #[error("contract creation code storage out of gas")]
    CodeStoreOutOfGas,

    /// The migration source has no code.
    #[error("no contract code at source address")]
    EmptyCode,

    /// The frame called the revert host function.
    #[error("execution reverted")]
    Reverted,

    /// The frame called the panic host function.
    #[error("transaction panic")]
    Panic,

    /// The guest trapped inside its own instruction stream (unreachable,
    /// out-of-bounds load, stack exhaustion, ...).
    #[error("wasm trap: {0}")]
    GuestTrap(String),

    /// Host-side failure not attributable to the guest.
    #[error("internal error: {0}")]
    Internal(String),
}

impl VmError {
    /// True for the distinguished revert trap; false for every fatal trap.
    pub fn is_revert(&self) -> bool {
        matches!(self, Self::Reverted)
    }
}
