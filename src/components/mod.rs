//! Component models for circuit simulation.
//!
//! This module provides models for all supported circuit components:
//! - Linear: Resistor, Capacitor, Inductor
//! - Sources: Voltage Source, Current Source (constant or sinusoidal)
//! - Nonlinear: Diode, BJT
//!
//! The set of kinds is closed; the solver dispatches on [`Component`] with
//! `match`.

mod bjt;
mod diode;
mod linear;
mod sources;

pub use bjt::{Bjt, BjtLinearization, BjtModel, BjtParams};
pub use diode::{Diode, DiodeParams};
pub use linear::{Capacitor, Inductor, Resistor};
pub use sources::{CurrentSource, Function, Sinusoid, VoltageSource};

use std::fmt;

use crate::circuit::NodeId;

/// Component kinds, keyed by their netlist letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Capacitor,
    Diode,
    CurrentSource,
    Inductor,
    Transistor,
    Resistor,
    VoltageSource,
}

impl ComponentKind {
    /// All kinds, in designator-letter order.
    pub const ALL: [ComponentKind; 7] = [
        ComponentKind::Capacitor,
        ComponentKind::Diode,
        ComponentKind::CurrentSource,
        ComponentKind::Inductor,
        ComponentKind::Transistor,
        ComponentKind::Resistor,
        ComponentKind::VoltageSource,
    ];

    /// Parse a component kind from its netlist letter (case-insensitive).
    pub fn from_symbol(symbol: u8) -> Option<Self> {
        match symbol.to_ascii_uppercase() {
            b'C' => Some(Self::Capacitor),
            b'D' => Some(Self::Diode),
            b'I' => Some(Self::CurrentSource),
            b'L' => Some(Self::Inductor),
            b'Q' => Some(Self::Transistor),
            b'R' => Some(Self::Resistor),
            b'V' => Some(Self::VoltageSource),
            _ => None,
        }
    }

    /// Upper-case netlist letter.
    pub fn symbol(&self) -> u8 {
        match self {
            Self::Capacitor => b'C',
            Self::Diode => b'D',
            Self::CurrentSource => b'I',
            Self::Inductor => b'L',
            Self::Transistor => b'Q',
            Self::Resistor => b'R',
            Self::VoltageSource => b'V',
        }
    }

    /// Get the number of terminals for this kind.
    pub fn terminal_count(&self) -> usize {
        match self {
            Self::Transistor => 3,
            _ => 2,
        }
    }
}

/// A circuit component.
#[derive(Debug, Clone, PartialEq)]
pub enum Component {
    Resistor(Resistor),
    Capacitor(Capacitor),
    Inductor(Inductor),
    Diode(Diode),
    Transistor(Bjt),
    CurrentSource(CurrentSource),
    VoltageSource(VoltageSource),
}

impl Component {
    /// Get the component kind.
    pub fn kind(&self) -> ComponentKind {
        match self {
            Component::Resistor(_) => ComponentKind::Resistor,
            Component::Capacitor(_) => ComponentKind::Capacitor,
            Component::Inductor(_) => ComponentKind::Inductor,
            Component::Diode(_) => ComponentKind::Diode,
            Component::Transistor(_) => ComponentKind::Transistor,
            Component::CurrentSource(_) => ComponentKind::CurrentSource,
            Component::VoltageSource(_) => ComponentKind::VoltageSource,
        }
    }

    /// Get the serial number.
    pub fn designator(&self) -> u32 {
        match self {
            Component::Resistor(r) => r.designator,
            Component::Capacitor(c) => c.designator,
            Component::Inductor(l) => l.designator,
            Component::Diode(d) => d.designator,
            Component::Transistor(q) => q.designator,
            Component::CurrentSource(i) => i.designator,
            Component::VoltageSource(v) => v.designator,
        }
    }

    /// Get the full designator, e.g. `R1`.
    pub fn name(&self) -> String {
        format!("{}{}", self.kind().symbol() as char, self.designator())
    }

    /// Get the connected nodes in netlist order.
    pub fn nodes(&self) -> &[NodeId] {
        match self {
            Component::Resistor(r) => &r.nodes,
            Component::Capacitor(c) => &c.nodes,
            Component::Inductor(l) => &l.nodes,
            Component::Diode(d) => &d.nodes,
            Component::Transistor(q) => &q.nodes,
            Component::CurrentSource(i) => &i.nodes,
            Component::VoltageSource(v) => &v.nodes,
        }
    }

    /// Check if this component is nonlinear (requires Newton-Raphson iteration).
    pub fn is_nonlinear(&self) -> bool {
        matches!(self, Component::Diode(_) | Component::Transistor(_))
    }

    /// Check if this component stores energy (needs companion-model history).
    pub fn is_reactive(&self) -> bool {
        matches!(self, Component::Capacitor(_) | Component::Inductor(_))
    }
}

impl fmt::Display for Component {
    /// Writes the component as a netlist line that parses back to `self`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())?;
        for node in self.nodes() {
            write!(f, " {}", node)?;
        }
        match self {
            Component::Resistor(r) => write!(f, " {}", r.resistance),
            Component::Capacitor(c) => write!(f, " {}", c.capacitance),
            Component::Inductor(l) => write!(f, " {}", l.inductance),
            Component::Diode(d) => write!(f, " {}", d.model),
            Component::Transistor(q) => write!(f, " {}", q.model),
            Component::CurrentSource(i) => write!(f, " {}", i.function),
            Component::VoltageSource(v) => write!(f, " {}", v.function),
        }
    }
}
