//! The host-function descriptor table.
//!
//! Names and signatures are consensus-critical: a guest module compiled
//! against this ABI must resolve exactly these imports on every node. The
//! table is the single source of truth for import validation; registration
//! in `linker` must stay in lockstep with it.

/// Wasm value kinds used by the ABI. Guest pointers are `I32` offsets into
/// the guest's single linear memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValKind {
    I32,
    I64,
}

/// One host-function descriptor: name plus exact parameter/result shape.
#[derive(Debug, Clone, Copy)]
pub struct HostFn {
    pub name: &'static str,
    pub params: &'static [ValKind],
    pub results: &'static [ValKind],
}

use ValKind::{I32, I64};

/// Import module every host function lives under.
pub const IMPORT_MODULE: &str = "env";

/// The entry point a contract module must export (`[] -> []`).
pub const ENTRY_EXPORT: &str = "invoke";

/// The linear-memory export a contract module must provide.
pub const MEMORY_EXPORT: &str = "memory";

/// The complete host ABI, in registration order.
pub const HOST_FUNCTIONS: &[HostFn] = &[
    HostFn { name: "platon_gas_price", params: &[], results: &[I64] },
    HostFn { name: "platon_block_hash", params: &[I64, I32], results: &[] },
    HostFn { name: "platon_block_number", params: &[], results: &[I64] },
    HostFn { name: "platon_gas_limit", params: &[], results: &[I64] },
    HostFn { name: "platon_gas", params: &[], results: &[I64] },
    HostFn { name: "platon_timestamp", params: &[], results: &[I64] },
    HostFn { name: "platon_coinbase", params: &[I32], results: &[] },
    HostFn { name: "platon_balance", params: &[I32, I32], results: &[I32] },
    HostFn { name: "platon_origin", params: &[I32], results: &[] },
    HostFn { name: "platon_caller", params: &[I32], results: &[] },
    HostFn { name: "platon_call_value", params: &[I32], results: &[I32] },
    HostFn { name: "platon_address", params: &[I32], results: &[] },
    HostFn { name: "platon_sha3", params: &[I32, I32, I32, I32], results: &[] },
    HostFn { name: "platon_caller_nonce", params: &[], results: &[I64] },
    HostFn { name: "platon_transfer", params: &[I32, I32, I32], results: &[I32] },
    HostFn { name: "platon_set_state", params: &[I32, I32, I32, I32], results: &[] },
    HostFn { name: "platon_get_state_length", params: &[I32, I32], results: &[I32] },
    HostFn { name: "platon_get_state", params: &[I32, I32, I32, I32], results: &[I32] },
    HostFn { name: "platon_get_input_length", params: &[], results: &[I32] },
    HostFn { name: "platon_get_input", params: &[I32], results: &[] },
    HostFn { name: "platon_get_call_output_length", params: &[], results: &[I32] },
    HostFn { name: "platon_get_call_output", params: &[I32], results: &[] },
    HostFn { name: "platon_return", params: &[I32, I32], results: &[] },
    HostFn { name: "platon_revert", params: &[], results: &[] },
    HostFn { name: "platon_panic", params: &[], results: &[] },
    HostFn { name: "platon_debug", params: &[I32, I32], results: &[] },
    HostFn {
        name: "platon_call",
        params: &[I32, I32, I32, I32, I32, I32, I32],
        results: &[I32],
    },
    HostFn {
        name: "platon_delegate_call",
        params: &[I32, I32, I32, I32, I32],
        results: &[I32],
    },
    HostFn {
        name: "platon_static_call",
        params: &[I32, I32, I32, I32, I32],
        results: &[I32],
    },
    HostFn { name: "platon_destroy", params: &[], results: &[I32] },
    HostFn {
        name: "platon_migrate",
        params: &[I32, I32, I32, I32, I32, I32, I32],
        results: &[I32],
    },
    HostFn { name: "platon_event", params: &[I32, I32], results: &[] },
    HostFn { name: "platon_event1", params: &[I32, I32, I32, I32], results: &[] },
    HostFn {
        name: "platon_event2",
        params: &[I32, I32, I32, I32, I32, I32],
        results: &[] ,
    },
    HostFn {
        name: "platon_event3",
        params: &[I32, I32, I32, I32, I32, I32, I32, I32],
        results: &[],
    },
];

/// Look up a descriptor by import name.
pub fn lookup(name: &str) -> Option<&'static HostFn> {
    HOST_FUNCTIONS.iter().find(|f| f.name == name)
}
