//! BJT (Bipolar Junction Transistor) model.
//!
//! Uses the Ebers-Moll transport model for NPN and PNP transistors.
//! A PNP is evaluated as an NPN with every junction voltage and terminal
//! current negated, which leaves the small-signal conductances unchanged.

use std::fmt;
use std::str::FromStr;

use super::diode::junction;
use crate::circuit::NodeId;
use crate::THERMAL_VOLTAGE;

/// BJT polarity (NPN or PNP).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BjtModel {
    Npn,
    Pnp,
}

impl BjtModel {
    /// +1 for NPN, -1 for PNP.
    pub fn polarity(&self) -> f64 {
        match self {
            BjtModel::Npn => 1.0,
            BjtModel::Pnp => -1.0,
        }
    }
}

impl FromStr for BjtModel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "NPN" => Ok(BjtModel::Npn),
            "PNP" => Ok(BjtModel::Pnp),
            _ => Err(()),
        }
    }
}

impl fmt::Display for BjtModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BjtModel::Npn => write!(f, "NPN"),
            BjtModel::Pnp => write!(f, "PNP"),
        }
    }
}

/// Parameters for a BJT model.
#[derive(Debug, Clone, PartialEq)]
pub struct BjtParams {
    /// Forward current gain (β_F)
    pub beta_f: f64,
    /// Reverse current gain (β_R)
    pub beta_r: f64,
    /// Transport saturation current
    pub is: f64,
    /// Ideality factor
    pub n: f64,
    /// Junction voltage above which the exponential is extrapolated
    pub v_crit: f64,
}

impl Default for BjtParams {
    fn default() -> Self {
        Self {
            beta_f: 100.0,
            beta_r: 1.0,
            is: 1e-14,
            n: 1.0,
            v_crit: 0.8,
        }
    }
}

impl BjtParams {
    /// Thermal voltage times ideality factor.
    pub fn n_vt(&self) -> f64 {
        self.n * THERMAL_VOLTAGE
    }
}

/// Terminal currents and their partial derivatives at an operating point.
///
/// Currents flow into the device. Derivatives are taken with respect to
/// V_BE and V_BC.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BjtLinearization {
    /// Collector current
    pub i_c: f64,
    /// Base current
    pub i_b: f64,
    /// dIc/dVbe
    pub gc_be: f64,
    /// dIc/dVbc
    pub gc_bc: f64,
    /// dIb/dVbe
    pub gb_be: f64,
    /// dIb/dVbc
    pub gb_bc: f64,
}

impl BjtLinearization {
    /// Emitter current flowing into the device (Ie = -(Ic + Ib)).
    pub fn i_e(&self) -> f64 {
        -(self.i_c + self.i_b)
    }
}

/// A BJT component.
#[derive(Debug, Clone, PartialEq)]
pub struct Bjt {
    pub designator: u32,
    pub nodes: [NodeId; 3], // [base, collector, emitter]
    pub model: BjtModel,
    pub params: BjtParams,
}

impl Bjt {
    /// Create a new BJT with default parameters.
    pub fn new(designator: u32, nodes: [NodeId; 3], model: BjtModel) -> Self {
        Self {
            designator,
            nodes,
            model,
            params: BjtParams::default(),
        }
    }

    /// Get the base node.
    pub fn base(&self) -> NodeId {
        self.nodes[0]
    }

    /// Get the collector node.
    pub fn collector(&self) -> NodeId {
        self.nodes[1]
    }

    /// Get the emitter node.
    pub fn emitter(&self) -> NodeId {
        self.nodes[2]
    }

    /// Evaluate currents and conductances at the given junction voltages.
    pub fn linearize(&self, v_be: f64, v_bc: f64) -> BjtLinearization {
        let p = self.model.polarity();
        let n_vt = self.params.n_vt();
        let (i_f, g_f) = junction(self.params.is, n_vt, self.params.v_crit, p * v_be);
        let (i_r, g_r) = junction(self.params.is, n_vt, self.params.v_crit, p * v_bc);

        let reverse_factor = 1.0 + 1.0 / self.params.beta_r;

        BjtLinearization {
            i_c: p * (i_f - i_r * reverse_factor),
            i_b: p * (i_f / self.params.beta_f + i_r / self.params.beta_r),
            gc_be: g_f,
            gc_bc: -g_r * reverse_factor,
            gb_be: g_f / self.params.beta_f,
            gb_bc: g_r / self.params.beta_r,
        }
    }

    /// Calculate the collector current (Ic).
    pub fn i_c(&self, v_be: f64, v_bc: f64) -> f64 {
        self.linearize(v_be, v_bc).i_c
    }

    /// Calculate the base current (Ib).
    pub fn i_b(&self, v_be: f64, v_bc: f64) -> f64 {
        self.linearize(v_be, v_bc).i_b
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn npn() -> Bjt {
        Bjt::new(1, [NodeId(1), NodeId(2), NodeId(0)], BjtModel::Npn)
    }

    #[test]
    fn test_forward_active_gain() {
        let q = npn();
        // Forward active: B-E forward, B-C reverse
        let lin = q.linearize(0.65, -2.0);
        assert!(lin.i_c > 0.0);
        assert_relative_eq!(lin.i_c / lin.i_b, q.params.beta_f, max_relative = 1e-6);
        assert_relative_eq!(lin.i_e(), -(lin.i_c + lin.i_b));
    }

    #[test]
    fn test_pnp_mirrors_npn() {
        let n = npn();
        let p = Bjt::new(1, [NodeId(1), NodeId(2), NodeId(0)], BjtModel::Pnp);
        let ln = n.linearize(0.6, -1.0);
        let lp = p.linearize(-0.6, 1.0);
        assert_relative_eq!(lp.i_c, -ln.i_c);
        assert_relative_eq!(lp.i_b, -ln.i_b);
        assert_relative_eq!(lp.gc_be, ln.gc_be);
        assert_relative_eq!(lp.gb_bc, ln.gb_bc);
    }

    #[test]
    fn test_derivatives_match_finite_difference() {
        let q = npn();
        let h = 1e-7;
        let lin = q.linearize(0.6, -0.3);
        let dic = (q.i_c(0.6 + h, -0.3) - q.i_c(0.6 - h, -0.3)) / (2.0 * h);
        assert_relative_eq!(lin.gc_be, dic, max_relative = 1e-4);

        // Reverse active, so the B-C junction dominates the base current
        let lin = q.linearize(-0.3, 0.6);
        let dib = (q.i_b(-0.3, 0.6 + h) - q.i_b(-0.3, 0.6 - h)) / (2.0 * h);
        assert_relative_eq!(lin.gb_bc, dib, max_relative = 1e-4);
        let dic = (q.i_c(-0.3, 0.6 + h) - q.i_c(-0.3, 0.6 - h)) / (2.0 * h);
        assert_relative_eq!(lin.gc_bc, dic, max_relative = 1e-4);
    }

    #[test]
    fn test_model_parse() {
        assert_eq!("npn".parse::<BjtModel>(), Ok(BjtModel::Npn));
        assert_eq!("PNP".parse::<BjtModel>(), Ok(BjtModel::Pnp));
        assert!("NMOS".parse::<BjtModel>().is_err());
        assert_eq!(BjtModel::Pnp.to_string(), "PNP");
    }
}
