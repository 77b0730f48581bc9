//! Host-function registration.
//!
//! Registers every entry of the descriptor table with the Wasmtime
//! `Linker`. Each function:
//!
//! 1. Resolves guest memory and the frame's `VmContext` from the `Caller`
//! 2. Charges gas per the consensus schedule
//! 3. Bounds-checks every guest pointer it touches
//! 4. Performs its effect against the state backend or the driver
//! 5. Returns a scalar, or traps by returning an error
//!
//! A trap carries a `VmError`; the execution boundary downcasts it back.

use wasmtime::{Caller, Error, Linker, Memory};

use platon_hostapi::{
    gas::{self, EXTERNAL_DATA_GAS, INDIRECT_CALL_GAS, SHA3_DATA_GAS, STORE_GAS, STORE_LEN_GAS},
    types::{keccak, u256_from_be, u256_to_be},
    Address, VmError,
};

use crate::abi::{IMPORT_MODULE, MEMORY_EXPORT};
use crate::calls;
use crate::context::VmContext;
use crate::error::RuntimeError;
use crate::memory;
use crate::migrate;

/// Get the guest's exported linear memory from a Caller.
fn get_memory(caller: &mut Caller<'_, VmContext>) -> Result<Memory, Error> {
    caller
        .get_export(MEMORY_EXPORT)
        .and_then(|e| e.into_memory())
        .ok_or_else(|| VmError::Internal("guest has no memory export".into()).into())
}

fn read_address(
    mem: &Memory,
    caller: &Caller<'_, VmContext>,
    ptr: u32,
) -> Result<Address, VmError> {
    let bytes = memory::read_bytes(mem.data(caller), ptr, 20)?;
    Ok(Address::from_slice(&bytes))
}

/// Register the full `platon_*` table with the linker.
pub fn register_host_functions(linker: &mut Linker<VmContext>) -> Result<(), RuntimeError> {
    register_context_getters(linker)?;
    register_hashing(linker)?;
    register_io(linker)?;
    register_storage(linker)?;
    register_calls(linker)?;
    register_lifecycle(linker)?;
    register_events(linker)?;
    Ok(())
}

// ── Block / tx context ──

fn register_context_getters(linker: &mut Linker<VmContext>) -> Result<(), RuntimeError> {
    linker.func_wrap(
        IMPORT_MODULE,
        "platon_gas_price",
        |mut caller: Caller<'_, VmContext>| -> Result<u64, Error> {
            caller.data_mut().charge(INDIRECT_CALL_GAS)?;
            Ok(caller.data().evm.block().gas_price.as_limbs()[0])
        },
    )?;

    linker.func_wrap(
        IMPORT_MODULE,
        "platon_block_hash",
        |mut caller: Caller<'_, VmContext>, num: u64, dst: u32| -> Result<(), Error> {
            let mem = get_memory(&mut caller)?;
            caller.data_mut().charge(INDIRECT_CALL_GAS)?;
            let hash = caller.data().evm.get_hash(num);
            memory::write_bytes(mem.data_mut(&mut caller), dst, hash.as_slice())?;
            Ok(())
        },
    )?;

    linker.func_wrap(
        IMPORT_MODULE,
        "platon_block_number",
        |mut caller: Caller<'_, VmContext>| -> Result<u64, Error> {
            caller.data_mut().charge(INDIRECT_CALL_GAS)?;
            Ok(caller.data().evm.block().block_number)
        },
    )?;

    linker.func_wrap(
        IMPORT_MODULE,
        "platon_gas_limit",
        |mut caller: Caller<'_, VmContext>| -> Result<u64, Error> {
            caller.data_mut().charge(INDIRECT_CALL_GAS)?;
            Ok(caller.data().evm.block().gas_limit)
        },
    )?;

    linker.func_wrap(
        IMPORT_MODULE,
        "platon_gas",
        |mut caller: Caller<'_, VmContext>| -> Result<u64, Error> {
            caller.data_mut().charge(INDIRECT_CALL_GAS)?;
            Ok(caller.data().contract.gas)
        },
    )?;

    linker.func_wrap(
        IMPORT_MODULE,
        "platon_timestamp",
        |mut caller: Caller<'_, VmContext>| -> Result<i64, Error> {
            caller.data_mut().charge(INDIRECT_CALL_GAS)?;
            Ok(caller.data().evm.block().timestamp as i64)
        },
    )?;

    linker.func_wrap(
        IMPORT_MODULE,
        "platon_coinbase",
        |mut caller: Caller<'_, VmContext>, dst: u32| -> Result<(), Error> {
            let mem = get_memory(&mut caller)?;
            caller.data_mut().charge(INDIRECT_CALL_GAS)?;
            let coinbase = caller.data().evm.block().coinbase;
            memory::write_bytes(mem.data_mut(&mut caller), dst, coinbase.as_slice())?;
            Ok(())
        },
    )?;

    linker.func_wrap(
        IMPORT_MODULE,
        "platon_balance",
        |mut caller: Caller<'_, VmContext>, addr_ptr: u32, out: u32| -> Result<u32, Error> {
            let mem = get_memory(&mut caller)?;
            caller.data_mut().charge(INDIRECT_CALL_GAS)?;
            let addr = read_address(&mem, &caller, addr_ptr)?;
            let balance = caller.data().db.get_balance(addr);
            let bytes = u256_to_be(&balance);
            memory::write_bytes(mem.data_mut(&mut caller), out, &bytes)?;
            Ok(bytes.len() as u32)
        },
    )?;

    linker.func_wrap(
        IMPORT_MODULE,
        "platon_origin",
        |mut caller: Caller<'_, VmContext>, dst: u32| -> Result<(), Error> {
            let mem = get_memory(&mut caller)?;
            caller.data_mut().charge(INDIRECT_CALL_GAS)?;
            let origin = caller.data().evm.block().origin;
            memory::write_bytes(mem.data_mut(&mut caller), dst, origin.as_slice())?;
            Ok(())
        },
    )?;

    linker.func_wrap(
        IMPORT_MODULE,
        "platon_caller",
        |mut caller: Caller<'_, VmContext>, dst: u32| -> Result<(), Error> {
            let mem = get_memory(&mut caller)?;
            caller.data_mut().charge(INDIRECT_CALL_GAS)?;
            let frame_caller = caller.data().contract.caller;
            memory::write_bytes(mem.data_mut(&mut caller), dst, frame_caller.as_slice())?;
            Ok(())
        },
    )?;

    linker.func_wrap(
        IMPORT_MODULE,
        "platon_call_value",
        |mut caller: Caller<'_, VmContext>, dst: u32| -> Result<u32, Error> {
            let mem = get_memory(&mut caller)?;
            caller.data_mut().charge(INDIRECT_CALL_GAS)?;
            let bytes = u256_to_be(&caller.data().contract.value);
            memory::write_bytes(mem.data_mut(&mut caller), dst, &bytes)?;
            Ok(bytes.len() as u32)
        },
    )?;

    linker.func_wrap(
        IMPORT_MODULE,
        "platon_address",
        |mut caller: Caller<'_, VmContext>, dst: u32| -> Result<(), Error> {
            let mem = get_memory(&mut caller)?;
            caller.data_mut().charge(INDIRECT_CALL_GAS)?;
            let address = caller.data().contract.address;
            memory::write_bytes(mem.data_mut(&mut caller), dst, address.as_slice())?;
            Ok(())
        },
    )?;

    linker.func_wrap(
        IMPORT_MODULE,
        "platon_caller_nonce",
        |mut caller: Caller<'_, VmContext>| -> Result<u64, Error> {
            caller.data_mut().charge(INDIRECT_CALL_GAS)?;
            let frame_caller = caller.data().contract.caller;
            Ok(caller.data().db.get_nonce(frame_caller))
        },
    )?;

    Ok(())
}

// ── Hashing ──

fn register_hashing(linker: &mut Linker<VmContext>) -> Result<(), RuntimeError> {
    linker.func_wrap(
        IMPORT_MODULE,
        "platon_sha3",
        |mut caller: Caller<'_, VmContext>,
         src: u32,
         src_len: u32,
         dst: u32,
         dst_len: u32|
         -> Result<(), Error> {
            let mem = get_memory(&mut caller)?;
            caller
                .data_mut()
                .charge(gas::mul(SHA3_DATA_GAS, src_len as u64)?)?;
            let data = memory::read_bytes(mem.data(&caller), src, src_len)?;
            let hash = keccak(&data);
            if (dst_len as usize) < hash.len() {
                return Err(VmError::MemoryAccess.into());
            }
            memory::write_bytes(mem.data_mut(&mut caller), dst, hash.as_slice())?;
            Ok(())
        },
    )?;
    Ok(())
}

// ── Input / output plumbing ──

fn register_io(linker: &mut Linker<VmContext>) -> Result<(), RuntimeError> {
    linker.func_wrap(
        IMPORT_MODULE,
        "platon_get_input_length",
        |mut caller: Caller<'_, VmContext>| -> Result<u32, Error> {
            caller.data_mut().charge(INDIRECT_CALL_GAS)?;
            Ok(caller.data().input.len() as u32)
        },
    )?;

    linker.func_wrap(
        IMPORT_MODULE,
        "platon_get_input",
        |mut caller: Caller<'_, VmContext>, dst: u32| -> Result<(), Error> {
            let mem = get_memory(&mut caller)?;
            caller
                .data_mut()
                .charge(gas::mul(EXTERNAL_DATA_GAS, dst as u64)?)?;
            let input = caller.data().input.clone();
            memory::write_bytes(mem.data_mut(&mut caller), dst, &input)?;
            Ok(())
        },
    )?;

    linker.func_wrap(
        IMPORT_MODULE,
        "platon_get_call_output_length",
        |mut caller: Caller<'_, VmContext>| -> Result<u32, Error> {
            caller.data_mut().charge(INDIRECT_CALL_GAS)?;
            Ok(caller.data().call_out.len() as u32)
        },
    )?;

    linker.func_wrap(
        IMPORT_MODULE,
        "platon_get_call_output",
        |mut caller: Caller<'_, VmContext>, dst: u32| -> Result<(), Error> {
            let mem = get_memory(&mut caller)?;
            caller
                .data_mut()
                .charge(gas::mul(EXTERNAL_DATA_GAS, dst as u64)?)?;
            let out = caller.data().call_out.clone();
            memory::write_bytes(mem.data_mut(&mut caller), dst, &out)?;
            Ok(())
        },
    )?;

    linker.func_wrap(
        IMPORT_MODULE,
        "platon_return",
        |mut caller: Caller<'_, VmContext>, src: u32, len: u32| -> Result<(), Error> {
            let mem = get_memory(&mut caller)?;
            caller
                .data_mut()
                .charge(gas::mul(EXTERNAL_DATA_GAS, len as u64)?)?;
            let output = memory::read_bytes(mem.data(&caller), src, len)?;
            caller.data_mut().output = output;
            Ok(())
        },
    )?;

    linker.func_wrap(
        IMPORT_MODULE,
        "platon_revert",
        |mut caller: Caller<'_, VmContext>| -> Result<(), Error> {
            caller.data_mut().revert = true;
            Err(VmError::Reverted.into())
        },
    )?;

    linker.func_wrap(
        IMPORT_MODULE,
        "platon_panic",
        |_caller: Caller<'_, VmContext>| -> Result<(), Error> {
            Err(VmError::Panic.into())
        },
    )?;

    linker.func_wrap(
        IMPORT_MODULE,
        "platon_debug",
        |mut caller: Caller<'_, VmContext>, src: u32, len: u32| -> Result<(), Error> {
            let mem = get_memory(&mut caller)?;
            caller.data_mut().charge(INDIRECT_CALL_GAS)?;
            let buf = memory::read_bytes(mem.data(&caller), src, len)?;
            let msg = String::from_utf8_lossy(&buf).into_owned();
            caller.data_mut().log.debug(&msg);
            Ok(())
        },
    )?;

    Ok(())
}

// ── Per-contract key-value storage ──

fn register_storage(linker: &mut Linker<VmContext>) -> Result<(), RuntimeError> {
    linker.func_wrap(
        IMPORT_MODULE,
        "platon_set_state",
        |mut caller: Caller<'_, VmContext>,
         key_ptr: u32,
         key_len: u32,
         val_ptr: u32,
         val_len: u32|
         -> Result<(), Error> {
            let mem = get_memory(&mut caller)?;
            caller.data().require_writable()?;
            caller
                .data_mut()
                .charge(gas::mul(STORE_GAS, key_len as u64 + val_len as u64)?)?;
            let (key, value) = {
                let data = mem.data(&caller);
                (
                    memory::read_bytes(data, key_ptr, key_len)?,
                    memory::read_bytes(data, val_ptr, val_len)?,
                )
            };
            let ctx = caller.data_mut();
            let address = ctx.contract.address;
            ctx.db.set_state(address, &key, &value);
            Ok(())
        },
    )?;

    linker.func_wrap(
        IMPORT_MODULE,
        "platon_get_state_length",
        |mut caller: Caller<'_, VmContext>, key_ptr: u32, key_len: u32| -> Result<u32, Error> {
            let mem = get_memory(&mut caller)?;
            let key = memory::read_bytes(mem.data(&caller), key_ptr, key_len)?;
            let value = {
                let ctx = caller.data();
                ctx.db.get_state(ctx.contract.address, &key)
            };
            caller
                .data_mut()
                .charge(gas::mul(STORE_LEN_GAS, value.len() as u64)?)?;
            Ok(value.len() as u32)
        },
    )?;

    linker.func_wrap(
        IMPORT_MODULE,
        "platon_get_state",
        |mut caller: Caller<'_, VmContext>,
         key_ptr: u32,
         key_len: u32,
         val_ptr: u32,
         val_len: u32|
         -> Result<u32, Error> {
            let mem = get_memory(&mut caller)?;
            let key = memory::read_bytes(mem.data(&caller), key_ptr, key_len)?;
            let value = {
                let ctx = caller.data();
                ctx.db.get_state(ctx.contract.address, &key)
            };
            caller
                .data_mut()
                .charge(gas::mul(STORE_LEN_GAS, value.len() as u64)?)?;
            if value.len() > val_len as usize {
                return Ok(u32::MAX);
            }
            memory::write_bytes(mem.data_mut(&mut caller), val_ptr, &value)?;
            Ok(0)
        },
    )?;

    Ok(())
}

// ── Value transfer and nested calls ──

fn register_calls(linker: &mut Linker<VmContext>) -> Result<(), RuntimeError> {
    linker.func_wrap(
        IMPORT_MODULE,
        "platon_transfer",
        |mut caller: Caller<'_, VmContext>,
         to_ptr: u32,
         amount_ptr: u32,
         amount_len: u32|
         -> Result<i32, Error> {
            let mem = get_memory(&mut caller)?;
            let to = read_address(&mem, &caller, to_ptr)?;
            let amount = memory::read_bytes(mem.data(&caller), amount_ptr, amount_len)?;
            Ok(calls::transfer(caller.data_mut(), to, &amount)?)
        },
    )?;

    linker.func_wrap(
        IMPORT_MODULE,
        "platon_call",
        |mut caller: Caller<'_, VmContext>,
         to_ptr: u32,
         args: u32,
         args_len: u32,
         val: u32,
         val_len: u32,
         cost: u32,
         cost_len: u32|
         -> Result<i32, Error> {
            let mem = get_memory(&mut caller)?;
            let (to, input, value, requested) = {
                let data = mem.data(&caller);
                let to = Address::from_slice(&memory::read_bytes(data, to_ptr, 20)?);
                let input = memory::read_bytes(data, args, args_len)?;
                let value = u256_from_be(&memory::read_bytes(data, val, val_len)?);
                let requested = u256_from_be(&memory::read_bytes(data, cost, cost_len)?);
                (to, input, value, requested)
            };
            Ok(calls::call_contract(
                caller.data_mut(),
                to,
                input,
                value,
                requested,
            )?)
        },
    )?;

    linker.func_wrap(
        IMPORT_MODULE,
        "platon_delegate_call",
        |mut caller: Caller<'_, VmContext>,
         to_ptr: u32,
         args: u32,
         args_len: u32,
         cost: u32,
         cost_len: u32|
         -> Result<i32, Error> {
            let mem = get_memory(&mut caller)?;
            let (to, input, requested) = {
                let data = mem.data(&caller);
                let to = Address::from_slice(&memory::read_bytes(data, to_ptr, 20)?);
                let input = memory::read_bytes(data, args, args_len)?;
                let requested = u256_from_be(&memory::read_bytes(data, cost, cost_len)?);
                (to, input, requested)
            };
            Ok(calls::delegate_call_contract(
                caller.data_mut(),
                to,
                input,
                requested,
            )?)
        },
    )?;

    linker.func_wrap(
        IMPORT_MODULE,
        "platon_static_call",
        |mut caller: Caller<'_, VmContext>,
         to_ptr: u32,
         args: u32,
         args_len: u32,
         cost: u32,
         cost_len: u32|
         -> Result<i32, Error> {
            let mem = get_memory(&mut caller)?;
            let (to, input, requested) = {
                let data = mem.data(&caller);
                let to = Address::from_slice(&memory::read_bytes(data, to_ptr, 20)?);
                let input = memory::read_bytes(data, args, args_len)?;
                let requested = u256_from_be(&memory::read_bytes(data, cost, cost_len)?);
                (to, input, requested)
            };
            Ok(calls::static_call_contract(
                caller.data_mut(),
                to,
                input,
                requested,
            )?)
        },
    )?;

    Ok(())
}

// ── Self-destruct and migration ──

fn register_lifecycle(linker: &mut Linker<VmContext>) -> Result<(), RuntimeError> {
    linker.func_wrap(
        IMPORT_MODULE,
        "platon_destroy",
        |mut caller: Caller<'_, VmContext>| -> Result<i32, Error> {
            Ok(calls::destroy_contract(caller.data_mut())?)
        },
    )?;

    linker.func_wrap(
        IMPORT_MODULE,
        "platon_migrate",
        |mut caller: Caller<'_, VmContext>,
         new_addr_ptr: u32,
         args: u32,
         args_len: u32,
         val: u32,
         val_len: u32,
         cost: u32,
         cost_len: u32|
         -> Result<i32, Error> {
            let mem = get_memory(&mut caller)?;
            let (init_code, value, requested) = {
                let data = mem.data(&caller);
                let init_code = memory::read_bytes(data, args, args_len)?;
                let value = u256_from_be(&memory::read_bytes(data, val, val_len)?);
                let requested = u256_from_be(&memory::read_bytes(data, cost, cost_len)?);
                (init_code, value, requested)
            };
            let new_addr =
                migrate::migrate_contract(caller.data_mut(), init_code, value, requested)?;
            memory::write_bytes(mem.data_mut(&mut caller), new_addr_ptr, new_addr.as_slice())?;
            Ok(0)
        },
    )?;

    Ok(())
}

// ── Event emission ──

fn emit_with_topics(
    caller: &mut Caller<'_, VmContext>,
    topic_ptrs: &[(u32, u32)],
    args: u32,
    args_len: u32,
) -> Result<(), Error> {
    let mem = get_memory(caller)?;
    let (topics, data) = {
        let data = mem.data(&*caller);
        let topics = topic_ptrs
            .iter()
            .map(|&(ptr, len)| memory::read_bytes(data, ptr, len))
            .collect::<Result<Vec<_>, _>>()?;
        let payload = memory::read_bytes(data, args, args_len)?;
        (topics, payload)
    };
    calls::emit_event(caller.data_mut(), topics, data)?;
    Ok(())
}

fn register_events(linker: &mut Linker<VmContext>) -> Result<(), RuntimeError> {
    linker.func_wrap(
        IMPORT_MODULE,
        "platon_event",
        |mut caller: Caller<'_, VmContext>, args: u32, args_len: u32| -> Result<(), Error> {
            emit_with_topics(&mut caller, &[], args, args_len)
        },
    )?;

    linker.func_wrap(
        IMPORT_MODULE,
        "platon_event1",
        |mut caller: Caller<'_, VmContext>,
         t: u32,
         t_len: u32,
         args: u32,
         args_len: u32|
         -> Result<(), Error> {
            emit_with_topics(&mut caller, &[(t, t_len)], args, args_len)
        },
    )?;

    linker.func_wrap(
        IMPORT_MODULE,
        "platon_event2",
        |mut caller: Caller<'_, VmContext>,
         t1: u32,
         t1_len: u32,
         t2: u32,
         t2_len: u32,
         args: u32,
         args_len: u32|
         -> Result<(), Error> {
            emit_with_topics(&mut caller, &[(t1, t1_len), (t2, t2_len)], args, args_len)
        },
    )?;

    linker.func_wrap(
        IMPORT_MODULE,
        "platon_event3",
        |mut caller: Caller<'_, VmContext>,
         t1: u32,
         t1_len: u32,
         t2: u32,
         t2_len: u32,
         t3: u32,
         t3_len: u32,
         args: u32,
         args_len: u32|
         -> Result<(), Error> {
            emit_with_topics(
                &mut caller,
                &[(t1, t1_len), (t2, t2_len), (t3, t3_len)],
                args,
                args_len,
            )
        },
    )?;

    Ok(())
}
