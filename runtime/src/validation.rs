//! Guest module validation — ABI compatibility checks.
//!
//! A contract module is accepted only if:
//!
//! 1. It exports `invoke: [] -> []` and a `memory`
//! 2. Every import is a function from the `env` module
//! 3. Every imported name exists in the host-function table with the exact
//!    parameter/result shape
//! 4. No WASI imports

use wasmtime::{ExternType, Module, ValType};

use crate::abi::{self, ValKind};
use crate::error::RuntimeError;

fn kind_matches(expected: ValKind, actual: &ValType) -> bool {
    matches!(
        (expected, actual),
        (ValKind::I32, ValType::I32) | (ValKind::I64, ValType::I64)
    )
}

/// Validate that a guest module meets the host ABI requirements.
pub fn validate_module(module: &Module) -> Result<(), RuntimeError> {
    validate_exports(module)?;
    validate_imports(module)?;
    Ok(())
}

fn validate_exports(module: &Module) -> Result<(), RuntimeError> {
    let has_memory = module
        .exports()
        .any(|e| e.name() == abi::MEMORY_EXPORT && matches!(e.ty(), ExternType::Memory(_)));
    if !has_memory {
        return Err(RuntimeError::Validation(format!(
            "module must export '{}'",
            abi::MEMORY_EXPORT
        )));
    }

    let entry = module
        .exports()
        .find(|e| e.name() == abi::ENTRY_EXPORT)
        .ok_or_else(|| {
            RuntimeError::Validation(format!("missing required export: {}", abi::ENTRY_EXPORT))
        })?;

    let func_ty = match entry.ty() {
        ExternType::Func(ft) => ft,
        _ => {
            return Err(RuntimeError::Validation(format!(
                "export '{}' must be a function",
                abi::ENTRY_EXPORT
            )));
        }
    };
    if func_ty.params().len() != 0 || func_ty.results().len() != 0 {
        return Err(RuntimeError::Validation(format!(
            "export '{}' must take no parameters and return nothing",
            abi::ENTRY_EXPORT
        )));
    }

    Ok(())
}

fn validate_imports(module: &Module) -> Result<(), RuntimeError> {
    for import in module.imports() {
        let module_name = import.module();

        if module_name.starts_with("wasi") {
            return Err(RuntimeError::Validation(format!(
                "WASI import not allowed: {}::{}",
                module_name,
                import.name()
            )));
        }
        if module_name != abi::IMPORT_MODULE {
            return Err(RuntimeError::Validation(format!(
                "import from unknown module '{}' (only '{}' allowed): {}",
                module_name,
                abi::IMPORT_MODULE,
                import.name()
            )));
        }

        let func_ty = match import.ty() {
            ExternType::Func(ft) => ft,
            _ => {
                return Err(RuntimeError::Validation(format!(
                    "non-function import not allowed: {}::{}",
                    module_name,
                    import.name()
                )));
            }
        };

        let descriptor = abi::lookup(import.name()).ok_or_else(|| {
            RuntimeError::Validation(format!("unknown host function: {}", import.name()))
        })?;

        let params: Vec<ValType> = func_ty.params().collect();
        let results: Vec<ValType> = func_ty.results().collect();
        let params_ok = params.len() == descriptor.params.len()
            && descriptor
                .params
                .iter()
                .zip(&params)
                .all(|(k, t)| kind_matches(*k, t));
        let results_ok = results.len() == descriptor.results.len()
            && descriptor
                .results
                .iter()
                .zip(&results)
                .all(|(k, t)| kind_matches(*k, t));
        if !params_ok || !results_ok {
            return Err(RuntimeError::Validation(format!(
                "import '{}' has a signature not matching the host ABI",
                import.name()
            )));
        }
    }

    Ok(())
}
