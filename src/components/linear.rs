//! Linear passive components: Resistor, Capacitor, Inductor.
//!
//! Reactive parts carry no state of their own. The transient engine keeps the
//! previous voltage and current for each of them and passes those in.

use crate::circuit::NodeId;

/// A resistor component.
#[derive(Debug, Clone, PartialEq)]
pub struct Resistor {
    pub designator: u32,
    pub nodes: [NodeId; 2],
    pub resistance: f64,
}

impl Resistor {
    /// Create a new resistor.
    pub fn new(designator: u32, nodes: [NodeId; 2], resistance: f64) -> Self {
        Self {
            designator,
            nodes,
            resistance,
        }
    }

    /// Get the conductance (1/R).
    pub fn conductance(&self) -> f64 {
        1.0 / self.resistance
    }

    /// Current from the first to the second terminal.
    pub fn current(&self, v: f64) -> f64 {
        v * self.conductance()
    }
}

/// A capacitor component.
///
/// In discrete-time simulation, a capacitor is modeled using a companion model.
/// Using the trapezoidal rule:
///   i(n) = (2C/dt) * v(n) - I_eq
///
/// where I_eq = (2C/dt) * v(n-1) + i(n-1)
///
/// This gives an equivalent conductance G_eq = 2C/dt in parallel with a
/// current source I_eq injected into the first terminal.
#[derive(Debug, Clone, PartialEq)]
pub struct Capacitor {
    pub designator: u32,
    pub nodes: [NodeId; 2],
    pub capacitance: f64,
}

impl Capacitor {
    /// Create a new capacitor.
    pub fn new(designator: u32, nodes: [NodeId; 2], capacitance: f64) -> Self {
        Self {
            designator,
            nodes,
            capacitance,
        }
    }

    /// Get the equivalent conductance for the trapezoidal companion model.
    pub fn conductance(&self, dt: f64) -> f64 {
        2.0 * self.capacitance / dt
    }

    /// Get the history current source I_eq = G*v_prev + i_prev.
    pub fn history_current(&self, dt: f64, v_prev: f64, i_prev: f64) -> f64 {
        self.conductance(dt) * v_prev + i_prev
    }

    /// Current through the capacitor once v(n) is known.
    pub fn current(&self, dt: f64, v: f64, v_prev: f64, i_prev: f64) -> f64 {
        // i(n) = (2C/dt) * (v(n) - v(n-1)) - i(n-1)
        self.conductance(dt) * (v - v_prev) - i_prev
    }
}

/// An inductor component.
///
/// The dual of the capacitor companion model. Integrating v = L di/dt with
/// the trapezoidal rule:
///   i(n) = i(n-1) + dt/(2L) * (v(n) + v(n-1))
///
/// so the inductor is a conductance G_eq = dt/(2L) in parallel with a history
/// current i_hist = i(n-1) + G_eq * v(n-1) flowing from the first terminal to
/// the second. No branch-current unknown is needed.
#[derive(Debug, Clone, PartialEq)]
pub struct Inductor {
    pub designator: u32,
    pub nodes: [NodeId; 2],
    pub inductance: f64,
}

impl Inductor {
    /// Create a new inductor.
    pub fn new(designator: u32, nodes: [NodeId; 2], inductance: f64) -> Self {
        Self {
            designator,
            nodes,
            inductance,
        }
    }

    /// Get the equivalent conductance for the trapezoidal companion model.
    pub fn conductance(&self, dt: f64) -> f64 {
        dt / (2.0 * self.inductance)
    }

    /// Get the history current i_hist = i_prev + G*v_prev.
    pub fn history_current(&self, dt: f64, v_prev: f64, i_prev: f64) -> f64 {
        i_prev + self.conductance(dt) * v_prev
    }

    /// Current through the inductor once v(n) is known.
    pub fn current(&self, dt: f64, v: f64, v_prev: f64, i_prev: f64) -> f64 {
        self.conductance(dt) * v + self.history_current(dt, v_prev, i_prev)
    }
}
