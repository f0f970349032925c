//! Newton-Raphson iteration for nonlinear components.

use super::mna::{node_voltage, MnaSystem};
use super::EngineConfig;
use crate::circuit::Schematic;
use crate::components::Component;
use crate::error::{Result, TranspiceError};
use crate::matrix::Matrix;

/// Newton-Raphson solver for nonlinear circuits.
#[derive(Debug, Clone)]
pub struct NewtonRaphson {
    /// Maximum iterations
    pub max_iterations: usize,
    /// Convergence tolerance on node voltages (volts)
    pub tolerance: f64,
    /// Conductance placed across every junction
    pub gmin: f64,
    /// Previous iterate
    x_prev: Vec<f64>,
    /// Linear part of G for the current time point
    base_g: Matrix,
    /// Linear part of b for the current time point
    base_b: Matrix,
}

impl Default for NewtonRaphson {
    fn default() -> Self {
        Self::with_config(&EngineConfig::default())
    }
}

impl NewtonRaphson {
    /// Create a solver with the iteration limits of `config`.
    pub fn with_config(config: &EngineConfig) -> Self {
        Self {
            max_iterations: config.max_iterations,
            tolerance: config.tolerance,
            gmin: config.gmin,
            x_prev: Vec::new(),
            base_g: Matrix::default(),
            base_b: Matrix::default(),
        }
    }

    /// Solve the nonlinear system at `time`.
    ///
    /// `system` must hold the linear stamps for this time point; its current
    /// solution seeds the first iterate. Returns the number of iterations used.
    pub fn solve(&mut self, schematic: &Schematic, system: &mut MnaSystem, time: f64) -> Result<usize> {
        self.base_g.clone_from(&system.g);
        self.base_b.clone_from(&system.b);
        self.x_prev.clear();
        self.x_prev.extend_from_slice(system.result.as_slice());

        let node_count = system.node_count();
        let mut residual = f64::INFINITY;

        for iter in 0..self.max_iterations {
            system.g.clone_from(&self.base_g);
            system.b.clone_from(&self.base_b);
            self.stamp_nonlinear_components(schematic, system);

            system.solve(time)?;

            let x = system.result.as_slice();
            residual = x[..node_count]
                .iter()
                .zip(&self.x_prev[..node_count])
                .map(|(a, b)| (a - b).abs())
                .fold(0.0, f64::max);
            self.x_prev.copy_from_slice(x);

            if residual < self.tolerance {
                tracing::debug!(time, iterations = iter + 1, residual, "newton converged");
                return Ok(iter + 1);
            }
        }

        Err(TranspiceError::non_convergence(
            time,
            self.max_iterations,
            residual,
        ))
    }

    /// Stamp linearized nonlinear components around the previous iterate.
    fn stamp_nonlinear_components(&self, schematic: &Schematic, system: &mut MnaSystem) {
        let x = self.x_prev.as_slice();

        for component in schematic.components() {
            match component {
                Component::Diode(d) => {
                    let n_anode = d.nodes[0].matrix_index();
                    let n_cathode = d.nodes[1].matrix_index();
                    let v_d = node_voltage(x, d.nodes[0]) - node_voltage(x, d.nodes[1]);

                    // I = G * V + I_eq, flowing anode to cathode
                    let (g, i_eq) = d.linearize(v_d);
                    system.stamp_conductance(n_anode, n_cathode, g + self.gmin);
                    system.stamp_current_source(n_anode, n_cathode, -i_eq);
                }

                Component::Transistor(q) => {
                    let terminals = [q.collector(), q.base(), q.emitter()];
                    let nodes = terminals.map(|n| n.matrix_index());
                    let v = terminals.map(|n| node_voltage(x, n));
                    let [v_c, v_b, v_e] = v;
                    let lin = q.linearize(v_b - v_e, v_b - v_c);

                    // Rows: collector, base, emitter. Columns: dI/dVc, dI/dVb, dI/dVe
                    let d_ic = [-lin.gc_bc, lin.gc_be + lin.gc_bc, -lin.gc_be];
                    let d_ib = [-lin.gb_bc, lin.gb_be + lin.gb_bc, -lin.gb_be];
                    let d_ie = [
                        -(d_ic[0] + d_ib[0]),
                        -(d_ic[1] + d_ib[1]),
                        -(d_ic[2] + d_ib[2]),
                    ];
                    system.stamp_linearized(nodes, v, [lin.i_c, lin.i_b, lin.i_e()], [d_ic, d_ib, d_ie]);

                    system.stamp_conductance(nodes[1], nodes[2], self.gmin);
                    system.stamp_conductance(nodes[1], nodes[0], self.gmin);
                }

                _ => {} // Linear components already handled
            }
        }
    }
}
