//! MNA (Modified Nodal Analysis) transient solver.
//!
//! This module provides the numerical engine for circuit simulation.
//!
//! ## Modified Nodal Analysis
//!
//! MNA assembles a system of equations G·x = b where:
//! - x contains node voltages and branch currents
//! - G is the conductance/coefficient matrix
//! - b is the source vector
//!
//! The matrix structure is:
//! ```text
//! [ G   B ] [ v ]   [ i ]
//! [ C   0 ] [ j ] = [ e ]
//! ```
//!
//! where:
//! - G is the conductance matrix (node equations)
//! - B, C connect voltage sources to nodes
//! - v is the vector of node voltages
//! - j is the vector of voltage source currents
//! - i is the sum of current sources into each node
//! - e is the vector of voltage source values
//!
//! Capacitors and inductors are replaced at every step by trapezoidal
//! companion models (a conductance plus a current source), so they add no
//! unknowns. Diodes and transistors are linearized and iterated with
//! Newton-Raphson.

mod history;
mod mna;
mod newton;
mod transient;

pub use history::{CurrentHistory, Histories, VoltageHistory};
pub use mna::{node_voltage, stamp_linear_components, MnaSystem};
pub use newton::NewtonRaphson;
pub use transient::{EngineState, RowStream, TransientEngine};

/// Convergence tolerance for Newton-Raphson iteration.
pub const CONVERGENCE_TOLERANCE: f64 = 1e-6;

/// Maximum Newton-Raphson iterations per time step.
pub const MAX_ITERATIONS: usize = 50;

/// Minimum conductance across junctions to prevent singular matrix.
pub const MIN_CONDUCTANCE: f64 = 1e-12;

/// Configuration for the transient engine.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Maximum Newton-Raphson iterations per time step.
    pub max_iterations: usize,
    /// Convergence tolerance for Newton-Raphson (volts).
    pub tolerance: f64,
    /// Conductance stamped across every junction.
    pub gmin: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_iterations: MAX_ITERATIONS,
            tolerance: CONVERGENCE_TOLERANCE,
            gmin: MIN_CONDUCTANCE,
        }
    }
}

impl EngineConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum Newton-Raphson iterations.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the convergence tolerance (in volts).
    ///
    /// Larger values converge in fewer iterations at some cost in accuracy.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the junction shunt conductance.
    pub fn with_gmin(mut self, gmin: f64) -> Self {
        self.gmin = gmin;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = EngineConfig::new()
            .with_max_iterations(7)
            .with_tolerance(1e-4)
            .with_gmin(1e-9);
        assert_eq!(config.max_iterations, 7);
        assert_eq!(config.tolerance, 1e-4);
        assert_eq!(config.gmin, 1e-9);
        assert_eq!(EngineConfig::default().max_iterations, 50);
    }
}
