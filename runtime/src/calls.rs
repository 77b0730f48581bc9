//! Shared protocol for the nested-call host functions.
//!
//! `transfer`, `call`, `delegate_call`, and `static_call` follow the same
//! accounting: compute the base cost, plan the child budget with the 64/63
//! rule, charge base + budget on the calling frame, dispatch through the
//! driver, then credit unused child gas back. Any driver error (a child
//! revert included) traps the calling frame.

use platon_hostapi::{
    gas::{
        self, CallPlan, CALL_CONTRACT_GAS, CALL_NEW_ACCOUNT_GAS, CALL_VALUE_TRANSFER_GAS,
        CREATE_BY_SELFDESTRUCT_GAS, SELFDESTRUCT_GAS, SELFDESTRUCT_REFUND_GAS, TX_GAS,
    },
    types::{keccak, u256_from_be},
    Address, Hash, Log, U256, VmError,
};

use crate::context::VmContext;

/// Base cost of a value-bearing nested call: surcharges for touching an
/// empty account and for the transfer itself stack on the flat call cost.
fn call_base_cost(ctx: &VmContext, to: Address, value: &U256) -> u64 {
    let mut base = CALL_CONTRACT_GAS;
    if !value.is_zero() {
        if ctx.db.empty(to) {
            base += CALL_NEW_ACCOUNT_GAS;
        }
        base += CALL_VALUE_TRANSFER_GAS;
    }
    base
}

/// `platon_call`: nested call with optional value transfer. Returns the
/// byte length of the child's return data.
pub fn call_contract(
    ctx: &mut VmContext,
    to: Address,
    input: Vec<u8>,
    value: U256,
    requested: U256,
) -> Result<i32, VmError> {
    let base = call_base_cost(ctx, to, &value);
    let plan = CallPlan::new(ctx.contract.gas, base, requested, !value.is_zero())?;
    ctx.charge(plan.charge)?;

    let (ret, gas_left) = {
        let VmContext { evm, db, contract, .. } = ctx;
        evm.call(db.as_mut(), contract, to, input, plan.child_gas, value)?
    };
    ctx.contract.gas = gas::add(ctx.contract.gas, gas_left)?;
    ctx.call_out = ret;
    Ok(ctx.call_out.len() as i32)
}

/// `platon_delegate_call`: run the target's code in this frame's storage
/// context, preserving caller and value.
pub fn delegate_call_contract(
    ctx: &mut VmContext,
    to: Address,
    input: Vec<u8>,
    requested: U256,
) -> Result<i32, VmError> {
    let plan = CallPlan::new(ctx.contract.gas, CALL_CONTRACT_GAS, requested, false)?;
    ctx.charge(plan.charge)?;

    let (ret, gas_left) = {
        let VmContext { evm, db, contract, .. } = ctx;
        evm.delegate_call(db.as_mut(), contract, to, input, plan.child_gas)?
    };
    ctx.contract.gas = gas::add(ctx.contract.gas, gas_left)?;
    ctx.call_out = ret;
    Ok(ctx.call_out.len() as i32)
}

/// `platon_static_call`: nested call with the child forced read-only.
pub fn static_call_contract(
    ctx: &mut VmContext,
    to: Address,
    input: Vec<u8>,
    requested: U256,
) -> Result<i32, VmError> {
    let plan = CallPlan::new(ctx.contract.gas, CALL_CONTRACT_GAS, requested, false)?;
    ctx.charge(plan.charge)?;

    let (ret, gas_left) = {
        let VmContext { evm, db, contract, .. } = ctx;
        evm.static_call(db.as_mut(), contract, to, input, plan.child_gas)?
    };
    ctx.contract.gas = gas::add(ctx.contract.gas, gas_left)?;
    ctx.call_out = ret;
    Ok(ctx.call_out.len() as i32)
}

/// `platon_transfer`: plain value transfer expressed as a nested call with
/// empty input and a fixed `TX_GAS` child request.
pub fn transfer(ctx: &mut VmContext, to: Address, amount: &[u8]) -> Result<i32, VmError> {
    ctx.require_writable()?;

    let value = u256_from_be(amount);
    let base = call_base_cost(ctx, to, &value);
    let plan = CallPlan::new(ctx.contract.gas, base, U256::from(TX_GAS), !value.is_zero())?;
    ctx.charge(plan.charge)?;

    let (_, gas_left) = {
        let VmContext { evm, db, contract, .. } = ctx;
        evm.call(db.as_mut(), contract, to, Vec::new(), plan.child_gas, value)?
    };
    ctx.contract.gas = gas::add(ctx.contract.gas, gas_left)?;
    Ok(0)
}

/// `platon_destroy`: transfer the full balance to the caller and mark the
/// contract suicided. The refund is granted at most once per contract.
pub fn destroy_contract(ctx: &mut VmContext) -> Result<i32, VmError> {
    ctx.require_writable()?;

    let caller = ctx.contract.caller;
    let contract_addr = ctx.contract.address;

    let mut cost = SELFDESTRUCT_GAS;
    if ctx.db.empty(caller) && !ctx.db.get_balance(contract_addr).is_zero() {
        cost += CREATE_BY_SELFDESTRUCT_GAS;
    }

    if !ctx.db.has_suicided(contract_addr) {
        ctx.db.add_refund(SELFDESTRUCT_REFUND_GAS);
    }

    ctx.charge(cost)?;

    let balance = ctx.db.get_balance(contract_addr);
    ctx.db.add_balance(caller, balance);
    ctx.db.suicide(contract_addr);
    Ok(0)
}

/// `platon_event` family: hash each topic with Keccak-256 and append a log
/// entry for the current contract at the current block.
pub fn emit_event(
    ctx: &mut VmContext,
    topics: Vec<Vec<u8>>,
    data: Vec<u8>,
) -> Result<(), VmError> {
    ctx.require_writable()?;

    let cost = gas::log_gas(topics.len() as u64, data.len() as u64)?;
    ctx.charge(cost)?;

    let topics: Vec<Hash> = topics.iter().map(|t| keccak(t)).collect();
    let log = Log {
        address: ctx.contract.address,
        topics,
        data,
        block_number: ctx.evm.block().block_number,
    };
    ctx.db.add_log(log);
    Ok(())
}
