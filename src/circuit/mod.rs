//! Circuit representation.
//!
//! A [`Schematic`] holds all components of a parsed netlist together with the
//! derived node and branch counts, in a form suitable for simulation.

mod schematic;
mod types;

pub use schematic::Schematic;
pub use types::*;
