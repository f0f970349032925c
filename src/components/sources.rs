//! Voltage and current sources and their time functions.

use std::f64::consts::PI;
use std::fmt;

use crate::circuit::NodeId;

/// Parameters of a damped sinusoid, as written in `SINE(...)`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Sinusoid {
    pub offset: f64,
    pub amplitude: f64,
    /// Hz
    pub frequency: f64,
    /// Seconds before the waveform starts
    pub delay: f64,
    /// Exponential damping factor (1/s)
    pub damping: f64,
    /// Degrees
    pub phase: f64,
    /// Number of periods before the source falls back to its offset.
    /// `None` runs forever.
    pub cycle_count: Option<f64>,
}

impl Sinusoid {
    /// Build from the positional `SINE(...)` fields. Missing trailing fields
    /// are zero; a zero cycle count means "no limit".
    pub fn from_fields(fields: &[f64]) -> Self {
        let field = |i: usize| fields.get(i).copied().unwrap_or(0.0);
        let cycles = field(6);
        Self {
            offset: field(0),
            amplitude: field(1),
            frequency: field(2),
            delay: field(3),
            damping: field(4),
            phase: field(5),
            cycle_count: if cycles != 0.0 { Some(cycles) } else { None },
        }
    }

    /// Value at time `t`.
    pub fn evaluate(&self, t: f64) -> f64 {
        if t < self.delay {
            return self.offset;
        }
        if let Some(cycles) = self.cycle_count {
            if self.frequency > 0.0 && t > self.delay + cycles / self.frequency {
                return self.offset;
            }
        }
        let elapsed = t - self.delay;
        let envelope = if self.damping != 0.0 {
            (-self.damping * elapsed).exp()
        } else {
            1.0
        };
        self.offset
            + self.amplitude
                * envelope
                * (2.0 * PI * self.frequency * elapsed + self.phase * PI / 180.0).sin()
    }
}

/// Time-dependent value driving a source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Function {
    /// Fixed value
    Constant { offset: f64 },
    /// `SINE(...)` waveform
    Sinusoid(Sinusoid),
}

impl Function {
    /// Value at time `t`.
    pub fn evaluate(&self, t: f64) -> f64 {
        match self {
            Function::Constant { offset } => *offset,
            Function::Sinusoid(s) => s.evaluate(t),
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Function::Constant { offset } => write!(f, "{}", offset),
            Function::Sinusoid(s) => write!(
                f,
                "SINE({} {} {} {} {} {} {})",
                s.offset,
                s.amplitude,
                s.frequency,
                s.delay,
                s.damping,
                s.phase,
                s.cycle_count.unwrap_or(0.0)
            ),
        }
    }
}

/// A voltage source component.
///
/// Voltage sources require an extra row/column in the MNA matrix for the
/// branch current. The source enforces: V+ - V- = V(t)
#[derive(Debug, Clone, PartialEq)]
pub struct VoltageSource {
    pub designator: u32,
    pub nodes: [NodeId; 2], // [positive, negative]
    pub function: Function,
}

impl VoltageSource {
    /// Create a new voltage source.
    pub fn new(designator: u32, nodes: [NodeId; 2], function: Function) -> Self {
        Self {
            designator,
            nodes,
            function,
        }
    }

    /// Get the source voltage at time `t`.
    pub fn voltage(&self, t: f64) -> f64 {
        self.function.evaluate(t)
    }
}

/// A current source component.
///
/// Current sources add directly to the RHS vector of the MNA equations:
/// I(t) is injected into the positive node and drawn from the negative one.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentSource {
    pub designator: u32,
    pub nodes: [NodeId; 2], // [positive, negative]
    pub function: Function,
}

impl CurrentSource {
    /// Create a new current source.
    pub fn new(designator: u32, nodes: [NodeId; 2], function: Function) -> Self {
        Self {
            designator,
            nodes,
            function,
        }
    }

    /// Get the source current at time `t`.
    pub fn current(&self, t: f64) -> f64 {
        self.function.evaluate(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_constant() {
        let f = Function::Constant { offset: 2.5 };
        assert_eq!(f.evaluate(0.0), 2.5);
        assert_eq!(f.evaluate(1e3), 2.5);
    }

    #[test]
    fn test_sine_before_delay_and_after_cycles() {
        let s = Sinusoid::from_fields(&[0.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(s.cycle_count, None);
        assert_eq!(s.evaluate(-0.5), 0.0);

        let delayed = Sinusoid::from_fields(&[0.0, 1.0, 1.0, 0.5, 0.0, 0.0, 2.0]);
        assert_eq!(delayed.evaluate(0.25), 0.0);
        assert_eq!(delayed.evaluate(2.75), 0.0);
        assert_abs_diff_eq!(delayed.evaluate(0.75), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_sine_never_expires_without_cycle_count() {
        let s = Sinusoid::from_fields(&[0.0, 1.0, 1.0]);
        assert_abs_diff_eq!(s.evaluate(1000.25), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_sine_offset_phase_damping() {
        let s = Sinusoid::from_fields(&[1.0, 2.0, 50.0, 0.0, 0.0, 90.0]);
        assert_abs_diff_eq!(s.evaluate(0.0), 3.0, epsilon = 1e-12);

        let damped = Sinusoid::from_fields(&[0.0, 1.0, 1.0, 0.0, 2.0]);
        assert_abs_diff_eq!(damped.evaluate(0.25), (-0.5f64).exp(), epsilon = 1e-12);
    }

    #[test]
    fn test_display() {
        let f = Function::Sinusoid(Sinusoid::from_fields(&[0.0, 1.0, 1000.0]));
        assert_eq!(f.to_string(), "SINE(0 1 1000 0 0 0 0)");
        assert_eq!(Function::Constant { offset: 0.5 }.to_string(), "0.5");
    }
}
