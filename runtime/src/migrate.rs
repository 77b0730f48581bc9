//! Contract migration: deploy a successor contract and atomically move the
//! source contract's storage and balance onto it.
//!
//! Intended to be reached through a nested call from the contract being
//! migrated, so that the frame's caller is the source contract and the
//! frame's sender pays the migration value. The constructor runs through
//! the driver's standard deploy path against a state snapshot; any failure
//! other than a pure code-store shortfall rolls the snapshot back.

use platon_hostapi::{
    gas::{
        self, CallPlan, CALL_CREATE_DEPTH, CALL_NEW_ACCOUNT_GAS, CREATE_DATA_GAS,
        MAX_CODE_SIZE, MIGRATE_CONTRACT_GAS,
    },
    types::{create_address, keccak, EMPTY_CODE_HASH},
    Address, Contract, Hash, U256, VmError,
};

use crate::context::VmContext;

/// `platon_migrate`. Returns the successor's address on success; the caller
/// writes it back to the guest.
pub fn migrate_contract(
    ctx: &mut VmContext,
    init_code: Vec<u8>,
    value: U256,
    requested: U256,
) -> Result<Address, VmError> {
    ctx.require_writable()?;

    if ctx.evm.depth() > CALL_CREATE_DEPTH {
        return Err(VmError::CallDepth);
    }

    // The source being migrated is the code-level caller of this frame; the
    // sender funding the migration is the frame's value-transfer caller.
    let source = ctx.contract.caller;
    let sender = ctx.contract.caller_address;

    let mut base = MIGRATE_CONTRACT_GAS;
    if !value.is_zero() {
        base += CALL_NEW_ACCOUNT_GAS;
    }
    let plan = CallPlan::new(ctx.contract.gas, base, requested, false)?;
    ctx.charge(plan.charge)?;

    if ctx.db.get_code(source).is_empty() {
        return Err(VmError::EmptyCode);
    }
    if !ctx.evm.can_transfer(ctx.db.as_ref(), sender, value) {
        return Err(VmError::InsufficientBalance);
    }

    let sender_nonce = ctx.db.get_nonce(sender);
    let new_addr = create_address(sender, sender_nonce);
    ctx.db.set_nonce(sender, sender_nonce + 1);

    // The derived address must be virgin: no nonce, no code.
    let existing_hash = ctx.db.get_code_hash(new_addr);
    if ctx.db.get_nonce(new_addr) != 0
        || (existing_hash != Hash::ZERO && existing_hash != EMPTY_CODE_HASH)
    {
        return Err(VmError::AddressCollision);
    }

    let snapshot = ctx.db.snapshot();
    ctx.db.create_account(new_addr);
    ctx.db.set_nonce(new_addr, 1);

    let old_balance = ctx.db.get_balance(source);

    {
        let VmContext { evm, db, .. } = ctx;
        evm.transfer(db.as_mut(), source, new_addr, old_balance);
        evm.transfer(db.as_mut(), sender, new_addr, value);
    }
    ctx.db.migrate_storage(source, new_addr);
    ctx.db.suicide(source);

    let balance = old_balance + value;
    let code_hash = keccak(&init_code);
    let mut frame = Contract::new(sender, new_addr, balance, plan.child_gas)
        .with_code(init_code, code_hash);

    // Run the constructor through the driver's standard deploy path.
    let (code, mut err) = {
        let VmContext { evm, db, .. } = ctx;
        match evm.deploy(db.as_mut(), &mut frame) {
            Ok(code) => (code, None),
            Err(e) => (Vec::new(), Some(e)),
        }
    };

    let max_code_size_exceeded = code.len() > MAX_CODE_SIZE;
    if err.is_none() && !max_code_size_exceeded {
        let create_data_gas = gas::mul(code.len() as u64, CREATE_DATA_GAS)?;
        if frame.use_gas(create_data_gas) {
            ctx.db.set_code(new_addr, code);
        } else {
            err = Some(VmError::CodeStoreOutOfGas);
        }
    }

    // Everything except a pure code-store shortfall rolls the migration
    // back; a non-revert failure also consumes the constructor's budget.
    let fatal = err
        .as_ref()
        .is_some_and(|e| !matches!(e, VmError::CodeStoreOutOfGas));
    if max_code_size_exceeded || fatal {
        ctx.db.revert_to_snapshot(snapshot);
        if !err.as_ref().is_some_and(VmError::is_revert) {
            frame.use_gas(frame.gas);
        }
    }

    if max_code_size_exceeded && err.is_none() {
        err = Some(VmError::MaxCodeSize);
    }
    if let Some(e) = err {
        return Err(e);
    }

    ctx.contract.gas = frame.gas;
    Ok(new_addr)
}
