//! Runtime configuration.

/// Configuration for the WASM contract runtime.
///
/// Gas is the consensus resource; the knobs here bound the interpreter
/// itself and must be identical across validating nodes.
#[derive(Debug, Clone)]
pub struct VmConfig {
    /// Maximum linear memory pages (1 page = 64 KiB).
    pub max_memory_pages: u32,

    /// Wasmtime fuel per frame, the instruction-level backstop against
    /// runaway guest compute. Exhaustion surfaces as an out-of-gas trap.
    pub fuel_limit: u64,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            max_memory_pages: 256, // 16 MiB
            fuel_limit: 100_000_000,
        }
    }
}
