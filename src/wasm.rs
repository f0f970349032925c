//! WASM bindings for Transpice.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { simulate } from 'transpice';
//!
//! await init();
//!
//! const rows = simulate(`
//!   V1 N001 0 SINE(0 1 1k)
//!   R1 N001 N002 1k
//!   C1 N002 0 100n
//!   .tran 10u 5m
//! `);
//! ```

use wasm_bindgen::prelude::*;

use crate::output::rows_to_string;
use crate::solver::EngineConfig;

/// Initialize panic hook for better error messages in browser console.
#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

/// Run a netlist and return its rows, one `time, v1, ..., vn` line each.
///
/// Parse and simulation errors are returned as their message string.
#[wasm_bindgen]
pub fn simulate(netlist: &str) -> Result<String, JsValue> {
    simulate_with_config(netlist, crate::solver::MAX_ITERATIONS, crate::solver::CONVERGENCE_TOLERANCE)
}

/// Like [`simulate`], with custom Newton-Raphson limits.
#[wasm_bindgen]
pub fn simulate_with_config(
    netlist: &str,
    max_iterations: usize,
    tolerance: f64,
) -> Result<String, JsValue> {
    let config = EngineConfig::new()
        .with_max_iterations(max_iterations)
        .with_tolerance(tolerance);
    let rows = crate::parse_and_run_with_config(netlist, config)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    rows_to_string(rows).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Get the library version.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
