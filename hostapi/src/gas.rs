//! Consensus gas schedule and budget arithmetic.
//!
//! Every host call charges a deterministic amount against the frame's
//! remaining gas before its effect is applied. All composition of gas terms
//! is overflow-checked; an overflow traps with `GasOverflow`, an
//! insufficient budget with `OutOfGas`. The constants below are
//! consensus-critical and must not change without a protocol version bump.

use crate::error::VmError;
use crate::types::U256;

// ── Shared fee-schedule constants ──

/// Per-transaction base cost; also the fixed child budget requested by the
/// transfer host call.
pub const TX_GAS: u64 = 21_000;

/// Surcharge for a nested call that transfers a non-zero value.
pub const CALL_VALUE_TRANSFER_GAS: u64 = 9_000;

/// Surcharge for a value-bearing call whose target account is empty.
pub const CALL_NEW_ACCOUNT_GAS: u64 = 25_000;

/// Free gas given to the callee of a value-bearing call, added to the child
/// budget after the caller has been charged.
pub const CALL_STIPEND: u64 = 2_300;

/// Base cost of the destroy host call.
pub const SELFDESTRUCT_GAS: u64 = 5_000;

/// Surcharge when destroy credits a previously empty account.
pub const CREATE_BY_SELFDESTRUCT_GAS: u64 = 25_000;

/// Refund granted the first time a contract is marked suicided.
pub const SELFDESTRUCT_REFUND_GAS: u64 = 24_000;

/// Per-byte cost of persisting constructor output as contract code.
pub const CREATE_DATA_GAS: u64 = 200;

/// Base cost of a log entry.
pub const LOG_GAS: u64 = 375;

/// Per-topic cost of a log entry.
pub const LOG_TOPIC_GAS: u64 = 375;

/// Per-byte cost of log data.
pub const LOG_DATA_GAS: u64 = 8;

/// Maximum recursion depth for nested calls and migration.
pub const CALL_CREATE_DEPTH: u64 = 1_024;

/// Maximum byte length of deployed contract code.
pub const MAX_CODE_SIZE: usize = 24_576;

// ── WASM host-call constants ──

/// Baseline charged by every context getter and other flat-cost entries.
pub const INDIRECT_CALL_GAS: u64 = 10;

/// Scaling constant for the input/output plumbing entries.
pub const EXTERNAL_DATA_GAS: u64 = 1;

/// Per-byte cost of hashing guest data.
pub const SHA3_DATA_GAS: u64 = 6;

/// Per-byte cost (key + value) of a storage write.
pub const STORE_GAS: u64 = 20;

/// Per-byte cost (stored value) of a storage read.
pub const STORE_LEN_GAS: u64 = 1;

/// Base cost of the call, delegate-call, static-call, and transfer entries.
pub const CALL_CONTRACT_GAS: u64 = 700;

/// Base cost of the migrate entry.
pub const MIGRATE_CONTRACT_GAS: u64 = 32_000;

// ── Checked composition ──

/// Overflow-checked addition of gas terms.
pub fn add(a: u64, b: u64) -> Result<u64, VmError> {
    a.checked_add(b).ok_or(VmError::GasOverflow)
}

/// Overflow-checked multiplication of gas terms.
pub fn mul(a: u64, b: u64) -> Result<u64, VmError> {
    a.checked_mul(b).ok_or(VmError::GasOverflow)
}

/// Cost of a log entry with `topic_count` topics and `data_size` data bytes.
///
/// `LOG_GAS + topic_count × LOG_TOPIC_GAS + data_size × LOG_DATA_GAS`, each
/// step overflow-checked.
pub fn log_gas(topic_count: u64, data_size: u64) -> Result<u64, VmError> {
    let gas = add(LOG_GAS, mul(topic_count, LOG_TOPIC_GAS)?)?;
    add(gas, mul(data_size, LOG_DATA_GAS)?)
}

// ── Nested-call budget adapter ──

/// Gas plan for one nested invocation: the amount to charge the calling
/// frame and the budget handed to the child.
///
/// Computed atomically so no intermediate budget needs to be stashed on the
/// driver between the sub-budget computation and the charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallPlan {
    /// Amount debited from the caller: base cost plus the child budget
    /// (stipend excluded).
    pub charge: u64,
    /// Initial gas of the child frame, stipend included.
    pub child_gas: u64,
}

impl CallPlan {
    /// Plan a nested call.
    ///
    /// `remaining` is the caller's gas before the charge, `base` the call's
    /// base cost, `requested` the guest-supplied child budget. The child
    /// receives at most `(remaining - base) - (remaining - base)/64`; a zero
    /// request means "all of it". When `transfers_value`, `CALL_STIPEND` is
    /// added to the child budget only; the caller never pays for it.
    pub fn new(
        remaining: u64,
        base: u64,
        requested: U256,
        transfers_value: bool,
    ) -> Result<Self, VmError> {
        let available = remaining.saturating_sub(base);
        let available = available - available / 64;

        let granted = if requested.is_zero() {
            available
        } else {
            match u64::try_from(requested) {
                Ok(req) => req.min(available),
                Err(_) => available,
            }
        };

        let charge = add(base, granted)?;
        let child_gas = if transfers_value {
            add(granted, CALL_STIPEND)?
        } else {
            granted
        };
        Ok(Self { charge, child_gas })
    }
}
