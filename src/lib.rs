//! # Transpice
//!
//! A netlist parser and transient circuit simulator.
//!
//! This library provides:
//! - A parser for SPICE-style netlists (R, C, L, D, Q, V, I and `.tran`)
//! - Modified Nodal Analysis (MNA) based time-domain simulation
//! - Support for linear components (R, C, L), sinusoidal and constant
//!   sources, and nonlinear components (diodes, BJTs)
//! - A row writer for the resulting node-voltage table
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`netlist`] - Parse buffer, metric values and the netlist grammar
//! - [`components`] - Component models (resistors, capacitors, diodes, etc.)
//! - [`circuit`] - Schematic assembled from a parsed netlist
//! - [`matrix`] - Dense matrix with full-pivoting inverse and determinant
//! - [`solver`] - MNA stamping, Newton-Raphson and the transient time loop
//! - [`output`] - Result rows and their text format
//!
//! ## Usage
//!
//! ```no_run
//! let netlist = "V1 N001 0 1\nR1 N001 N002 1\nC1 N002 0 1\n.tran 10m 5\n";
//! for row in transpice::parse_and_run(netlist)? {
//!     println!("{}", row?);
//! }
//! # Ok::<(), transpice::TranspiceError>(())
//! ```
//!
//! ### Native CLI
//!
//! ```bash
//! RUST_LOG=transpice=debug transpice circuit.net --header -o result.txt
//! ```
//!
//! ## Circuit Simulation Method
//!
//! For each time point t = start + k·dt up to the stop time:
//!
//! 1. Assemble the system matrix G and source vector b
//! 2. Solve G·x = b for node voltages and branch currents
//! 3. For nonlinear elements, iterate using Newton-Raphson until convergence
//!
//! Reactive elements (C, L) are discretized using the trapezoidal rule for
//! accuracy and stability.

pub mod circuit;
pub mod components;
pub mod error;
pub mod matrix;
pub mod netlist;
pub mod output;
pub mod solver;

// Re-export main types for convenience
pub use circuit::Schematic;
pub use error::{Result, TranspiceError};
pub use output::{Row, RowWriter};
pub use solver::{EngineConfig, RowStream, TransientEngine};

// WASM bindings
#[cfg(feature = "wasm")]
mod wasm;

#[cfg(feature = "wasm")]
pub use wasm::simulate;

/// Thermal voltage at room temperature (approximately 26mV)
pub const THERMAL_VOLTAGE: f64 = 0.0258;

/// Parse a netlist and start its transient analysis with default settings.
///
/// Rows are computed lazily as the returned stream is iterated.
pub fn parse_and_run(netlist: &str) -> Result<RowStream> {
    parse_and_run_with_config(netlist, EngineConfig::default())
}

/// Parse a netlist and start its transient analysis.
pub fn parse_and_run_with_config(netlist: &str, config: EngineConfig) -> Result<RowStream> {
    let _span = tracing::info_span!("parse_and_run").entered();

    let parsed = netlist::parse(netlist)?;
    let schematic = Schematic::from_netlist(parsed)?;
    let engine = TransientEngine::new(schematic, config)?;

    tracing::info!(
        components = engine.schematic().components().len(),
        time_step = engine.time_step(),
        "starting transient analysis"
    );
    Ok(RowStream::new(engine))
}
