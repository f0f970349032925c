//! Diode model.
//!
//! Uses the Shockley diode equation:
//!   I = Is * (exp(V / (n * Vt)) - 1)
//!
//! For Newton-Raphson iteration, we linearize around the current operating point:
//!   I ≈ I0 + G_d * (V - V0)
//!
//! where G_d = dI/dV = Is/(n*Vt) * exp(V0/(n*Vt))

use crate::circuit::NodeId;
use crate::THERMAL_VOLTAGE;

/// Current and small-signal conductance of a pn junction at voltage `v`.
///
/// Above `v_crit` the exponential is continued as its tangent line so the
/// Newton iteration cannot overflow.
pub(crate) fn junction(is: f64, n_vt: f64, v_crit: f64, v: f64) -> (f64, f64) {
    if v > v_crit {
        let e = (v_crit / n_vt).exp();
        let i_crit = is * (e - 1.0);
        let g_crit = is / n_vt * e;
        (i_crit + g_crit * (v - v_crit), g_crit)
    } else {
        let e = (v / n_vt).exp();
        (is * (e - 1.0), is / n_vt * e)
    }
}

/// Parameters for a diode model.
#[derive(Debug, Clone, PartialEq)]
pub struct DiodeParams {
    /// Saturation current (Is), typically 1e-14 to 1e-12 A
    pub is: f64,
    /// Ideality factor (n), typically 1.0 to 2.0
    pub n: f64,
    /// Voltage above which the exponential is linearly extrapolated
    pub v_crit: f64,
}

impl Default for DiodeParams {
    fn default() -> Self {
        Self {
            is: 1e-14,
            n: 1.0,
            v_crit: 0.8,
        }
    }
}

impl DiodeParams {
    /// Thermal voltage times ideality factor.
    pub fn n_vt(&self) -> f64 {
        self.n * THERMAL_VOLTAGE
    }
}

/// A diode component.
///
/// The model token from the netlist is kept verbatim but does not select
/// parameters; every diode uses [`DiodeParams::default`].
#[derive(Debug, Clone, PartialEq)]
pub struct Diode {
    pub designator: u32,
    pub nodes: [NodeId; 2], // [anode, cathode]
    pub model: String,
    pub params: DiodeParams,
}

impl Diode {
    /// Create a new diode.
    pub fn new(designator: u32, nodes: [NodeId; 2], model: String) -> Self {
        Self {
            designator,
            nodes,
            model,
            params: DiodeParams::default(),
        }
    }

    /// Calculate the diode current at a given voltage.
    pub fn current(&self, v: f64) -> f64 {
        junction(self.params.is, self.params.n_vt(), self.params.v_crit, v).0
    }

    /// Calculate the conductance (dI/dV) at a given voltage.
    pub fn conductance(&self, v: f64) -> f64 {
        junction(self.params.is, self.params.n_vt(), self.params.v_crit, v).1
    }

    /// Get the linearized model parameters at the operating point.
    /// Returns (conductance G, equivalent current source I_eq)
    /// such that I = G * V + I_eq
    pub fn linearize(&self, v_op: f64) -> (f64, f64) {
        let (i, g) = junction(self.params.is, self.params.n_vt(), self.params.v_crit, v_op);
        (g, i - g * v_op)
    }
}
