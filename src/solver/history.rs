//! Per-step state carried between time points.

use std::collections::HashMap;

use crate::circuit::{ComponentIndex, NodeId};

/// Voltage across a terminal pair at the last accepted step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VoltageHistory {
    /// Trapezoidal integral of the voltage over the run so far
    pub integral: f64,
    /// Value at the last accepted step
    pub previous: f64,
}

/// Current through a component at the last accepted step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CurrentHistory {
    /// Trapezoidal integral of the current over the run so far
    pub integral: f64,
    /// Value at the last accepted step
    pub previous: f64,
}

/// All histories of a run.
///
/// Reactive companion models read `previous` from here; the integrals are
/// diagnostics only.
#[derive(Debug, Clone, Default)]
pub struct Histories {
    voltages: HashMap<(NodeId, NodeId), VoltageHistory>,
    currents: HashMap<ComponentIndex, CurrentHistory>,
}

impl Histories {
    /// Create empty histories.
    pub fn new() -> Self {
        Self::default()
    }

    /// Previous voltage across `(a, b)`, zero before the first step.
    pub fn previous_voltage(&self, a: NodeId, b: NodeId) -> f64 {
        self.voltages.get(&(a, b)).map_or(0.0, |h| h.previous)
    }

    /// Previous current through a component, zero before the first step.
    pub fn previous_current(&self, index: ComponentIndex) -> f64 {
        self.currents.get(&index).map_or(0.0, |h| h.previous)
    }

    /// Get the voltage history of a terminal pair.
    pub fn voltage(&self, a: NodeId, b: NodeId) -> Option<&VoltageHistory> {
        self.voltages.get(&(a, b))
    }

    /// Get the current history of a component.
    pub fn current(&self, index: ComponentIndex) -> Option<&CurrentHistory> {
        self.currents.get(&index)
    }

    /// Record a voltage sample. `dt` is `None` on the first step, which
    /// leaves the integral at zero.
    pub fn record_voltage(&mut self, a: NodeId, b: NodeId, value: f64, dt: Option<f64>) {
        let entry = self.voltages.entry((a, b)).or_default();
        if let Some(dt) = dt {
            entry.integral += dt * (value + entry.previous) / 2.0;
        }
        entry.previous = value;
    }

    /// Record a current sample, integrating as in [`Histories::record_voltage`].
    pub fn record_current(&mut self, index: ComponentIndex, value: f64, dt: Option<f64>) {
        let entry = self.currents.entry(index).or_default();
        if let Some(dt) = dt {
            entry.integral += dt * (value + entry.previous) / 2.0;
        }
        entry.previous = value;
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.voltages.clear();
        self.currents.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_defaults_to_zero() {
        let h = Histories::new();
        assert_eq!(h.previous_voltage(NodeId(1), NodeId(0)), 0.0);
        assert_eq!(h.previous_current(ComponentIndex(3)), 0.0);
        assert!(h.voltage(NodeId(1), NodeId(0)).is_none());
    }

    #[test]
    fn test_trapezoidal_integral() {
        let mut h = Histories::new();
        let a = NodeId(1);
        let b = NodeId::GROUND;
        h.record_voltage(a, b, 1.0, None);
        h.record_voltage(a, b, 3.0, Some(0.5));
        h.record_voltage(a, b, 3.0, Some(0.5));

        let v = h.voltage(a, b).unwrap();
        assert_relative_eq!(v.integral, 0.5 * 2.0 + 0.5 * 3.0);
        assert_eq!(v.previous, 3.0);

        // Orientation matters
        assert!(h.voltage(b, a).is_none());
    }

    #[test]
    fn test_current_history() {
        let mut h = Histories::new();
        h.record_current(ComponentIndex(0), 2.0, None);
        h.record_current(ComponentIndex(0), 4.0, Some(1.0));
        assert_relative_eq!(h.current(ComponentIndex(0)).unwrap().integral, 3.0);
        assert_eq!(h.previous_current(ComponentIndex(0)), 4.0);
        h.clear();
        assert!(h.current(ComponentIndex(0)).is_none());
    }
}
