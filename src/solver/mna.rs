//! MNA system assembly and solving.

use super::history::Histories;
use crate::circuit::{ComponentIndex, NodeId, Schematic};
use crate::components::Component;
use crate::error::{Result, TranspiceError};
use crate::matrix::Matrix;

/// MNA system G·x = b.
#[derive(Debug, Clone)]
pub struct MnaSystem {
    /// Conductance / coefficient matrix G
    pub g: Matrix,
    /// Source vector b
    pub b: Matrix,
    /// Solution vector x: node voltages, then voltage source branch currents
    pub result: Matrix,
    /// Number of node-voltage unknowns
    node_count: usize,
}

impl Default for MnaSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl MnaSystem {
    /// Create an empty system. Call [`MnaSystem::resize`] before stamping.
    pub fn new() -> Self {
        Self {
            g: Matrix::new(0, 0),
            b: Matrix::new(0, 1),
            result: Matrix::new(0, 1),
            node_count: 0,
        }
    }

    /// Size the system for `node_count` nodes and `dimension` unknowns.
    pub fn resize(&mut self, node_count: usize, dimension: usize) {
        debug_assert!(node_count <= dimension);
        self.node_count = node_count;
        self.g.resize(dimension, dimension);
        self.b.resize(dimension, 1);
        self.result.resize(dimension, 1);
    }

    /// Number of unknowns.
    pub fn dimension(&self) -> usize {
        self.b.rows()
    }

    /// Number of node-voltage unknowns.
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Clear G and b. The last solution is kept as the next initial guess.
    pub fn clear(&mut self) {
        self.g.clear();
        self.b.clear();
    }

    /// Add to source vector element.
    pub fn add_source(&mut self, row: usize, value: f64) {
        self.b.add_at(row, 0, value);
    }

    /// Stamp a conductance between two nodes.
    /// For a conductance G between nodes n1 and n2:
    ///   A[n1,n1] += G
    ///   A[n2,n2] += G
    ///   A[n1,n2] -= G
    ///   A[n2,n1] -= G
    pub fn stamp_conductance(&mut self, n1: Option<usize>, n2: Option<usize>, g: f64) {
        if let Some(i) = n1 {
            self.g.add_at(i, i, g);
        }
        if let Some(j) = n2 {
            self.g.add_at(j, j, g);
        }
        if let (Some(i), Some(j)) = (n1, n2) {
            self.g.add_at(i, j, -g);
            self.g.add_at(j, i, -g);
        }
    }

    /// Stamp a current injected into `n_in` and drawn from `n_out`.
    pub fn stamp_current_source(&mut self, n_in: Option<usize>, n_out: Option<usize>, current: f64) {
        if let Some(i) = n_in {
            self.add_source(i, current);
        }
        if let Some(j) = n_out {
            self.add_source(j, -current);
        }
    }

    /// Stamp a voltage source between two nodes with branch current at index br.
    /// V[n+] - V[n-] = E
    pub fn stamp_voltage_source(
        &mut self,
        n_pos: Option<usize>,
        n_neg: Option<usize>,
        br: usize,
        voltage: f64,
    ) {
        if let Some(i) = n_pos {
            self.g.set(br, i, 1.0);
            self.g.set(i, br, 1.0);
        }
        if let Some(j) = n_neg {
            self.g.set(br, j, -1.0);
            self.g.set(j, br, -1.0);
        }
        self.b.set(br, 0, voltage);
    }

    /// Stamp a device linearized around `v0`.
    ///
    /// `currents[k]` flows into the device at terminal `k` and
    /// `jacobian[k][j]` is its derivative with respect to the voltage of
    /// terminal `j`. Ground terminals are skipped.
    pub fn stamp_linearized<const N: usize>(
        &mut self,
        nodes: [Option<usize>; N],
        v0: [f64; N],
        currents: [f64; N],
        jacobian: [[f64; N]; N],
    ) {
        for k in 0..N {
            let Some(row) = nodes[k] else { continue };
            let mut i_eq = currents[k];
            for j in 0..N {
                i_eq -= jacobian[k][j] * v0[j];
                if let Some(col) = nodes[j] {
                    self.g.add_at(row, col, jacobian[k][j]);
                }
            }
            self.add_source(row, -i_eq);
        }
    }

    /// Voltage of a node in the current solution (ground is 0).
    pub fn voltage(&self, node: NodeId) -> f64 {
        node_voltage(self.result.as_slice(), node)
    }

    /// Node voltages of the current solution, node 1 first.
    pub fn node_voltages(&self) -> &[f64] {
        &self.result.as_slice()[..self.node_count]
    }

    /// Solve `result = G⁻¹ · b` for the time point `time`.
    pub fn solve(&mut self, time: f64) -> Result<()> {
        let inverse = self.g.inverse().map_err(|e| match e {
            TranspiceError::SingularMatrix => TranspiceError::SingularSystem { time },
            other => other,
        })?;
        self.result = inverse.try_mul(&self.b)?;
        Ok(())
    }
}

/// Voltage of `node` in a solution vector.
pub fn node_voltage(x: &[f64], node: NodeId) -> f64 {
    node.matrix_index().map_or(0.0, |i| x[i])
}

/// Stamp every linear component for the step ending at `time`.
///
/// Capacitors and inductors use trapezoidal companion models built from the
/// previous step in `histories`.
pub fn stamp_linear_components(
    schematic: &Schematic,
    system: &mut MnaSystem,
    histories: &Histories,
    time: f64,
    dt: f64,
) {
    for (index, component) in schematic.iter() {
        let nodes = component.nodes();
        let n1 = nodes[0].matrix_index();
        let n2 = nodes[1].matrix_index();

        match component {
            Component::Resistor(r) => {
                system.stamp_conductance(n1, n2, r.conductance());
            }

            Component::Capacitor(c) => {
                let v_prev = histories.previous_voltage(nodes[0], nodes[1]);
                let i_prev = histories.previous_current(index);
                system.stamp_conductance(n1, n2, c.conductance(dt));
                system.stamp_current_source(n1, n2, c.history_current(dt, v_prev, i_prev));
            }

            Component::Inductor(l) => {
                let v_prev = histories.previous_voltage(nodes[0], nodes[1]);
                let i_prev = histories.previous_current(index);
                system.stamp_conductance(n1, n2, l.conductance(dt));
                system.stamp_current_source(n1, n2, -l.history_current(dt, v_prev, i_prev));
            }

            Component::CurrentSource(i) => {
                system.stamp_current_source(n1, n2, i.current(time));
            }

            Component::VoltageSource(v) => {
                let br = branch_row(schematic, index);
                system.stamp_voltage_source(n1, n2, br, v.voltage(time));
            }

            // Stamped per Newton iteration
            Component::Diode(_) | Component::Transistor(_) => {}
        }
    }
}

fn branch_row(schematic: &Schematic, index: ComponentIndex) -> usize {
    let row = schematic.branch_row(index);
    debug_assert!(row.is_some(), "component {} is not a voltage source", index);
    row.unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlist::parse;
    use approx::assert_relative_eq;

    fn system_for(input: &str) -> (Schematic, MnaSystem) {
        let schematic = Schematic::from_netlist(parse(input).unwrap()).unwrap();
        let mut system = MnaSystem::new();
        system.resize(schematic.node_count(), schematic.dimension());
        (schematic, system)
    }

    #[test]
    fn test_stamp_conductance_skips_ground() {
        let mut system = MnaSystem::new();
        system.resize(2, 2);
        system.stamp_conductance(Some(0), Some(1), 2.0);
        system.stamp_conductance(Some(1), None, 0.5);
        assert_eq!(system.g[(0, 0)], 2.0);
        assert_eq!(system.g[(0, 1)], -2.0);
        assert_eq!(system.g[(1, 0)], -2.0);
        assert_eq!(system.g[(1, 1)], 2.5);
    }

    #[test]
    fn test_voltage_divider() {
        let (schematic, mut system) = system_for("V1 N001 0 2\nR1 N001 N002 1\nR2 N002 0 1");
        stamp_linear_components(&schematic, &mut system, &Histories::new(), 0.0, 1e-3);

        // Branch row of V1 follows the two node rows
        assert_eq!(system.g[(2, 0)], 1.0);
        assert_eq!(system.g[(0, 2)], 1.0);
        assert_eq!(system.b[(2, 0)], 2.0);

        system.solve(0.0).unwrap();
        assert_relative_eq!(system.voltage(NodeId(1)), 2.0, epsilon = 1e-12);
        assert_relative_eq!(system.voltage(NodeId(2)), 1.0, epsilon = 1e-12);
        assert_eq!(system.voltage(NodeId::GROUND), 0.0);
        // Source current: 1A flowing out of the positive terminal
        assert_relative_eq!(system.result[(2, 0)], -1.0, epsilon = 1e-12);
        assert_eq!(system.node_voltages().len(), 2);
    }

    #[test]
    fn test_current_source_direction() {
        let (schematic, mut system) = system_for("I1 N001 0 2m\nR1 N001 0 1k");
        stamp_linear_components(&schematic, &mut system, &Histories::new(), 0.0, 1e-3);
        system.solve(0.0).unwrap();
        assert_relative_eq!(system.voltage(NodeId(1)), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_floating_node_is_singular_system() {
        let (schematic, mut system) = system_for("V1 N002 0 1\nR1 N002 0 1k");
        stamp_linear_components(&schematic, &mut system, &Histories::new(), 0.25, 1e-3);
        match system.solve(0.25) {
            Err(TranspiceError::SingularSystem { time }) => assert_eq!(time, 0.25),
            other => panic!("expected SingularSystem, got {:?}", other),
        }
    }

    #[test]
    fn test_stamp_linearized_matches_conductance() {
        // A linear two-terminal device i = g·(va - vb) stamped through the
        // Jacobian path must equal a plain conductance stamp.
        let g = 0.25;
        let v0 = [1.0, 0.2];
        let i0 = g * (v0[0] - v0[1]);

        let mut a = MnaSystem::new();
        a.resize(2, 2);
        a.stamp_linearized([Some(0), Some(1)], v0, [i0, -i0], [[g, -g], [-g, g]]);

        let mut b = MnaSystem::new();
        b.resize(2, 2);
        b.stamp_conductance(Some(0), Some(1), g);

        assert_eq!(a.g, b.g);
        assert_relative_eq!(a.b[(0, 0)], 0.0, epsilon = 1e-15);
        assert_relative_eq!(a.b[(1, 0)], 0.0, epsilon = 1e-15);
    }
}
