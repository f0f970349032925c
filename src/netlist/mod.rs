//! Netlist parser.
//!
//! The netlist is line-oriented, in the style of SPICE / LTspice exports.
//!
//! # Grammar Overview
//!
//! ```text
//! netlist     = { line }
//! line        = comment | directive | component | empty
//! comment     = '*' { any_char }            (at the start of a line)
//!             | ';' { any_char }            (anywhere, to end of line)
//! directive   = ".tran" [step] stop [start [max_step]] | ".end" | '.' other
//! component   = passive | diode | bjt | source
//!
//! passive     = ('R' | 'C' | 'L') serial node node value
//! diode       = 'D' serial node node model
//! bjt         = 'Q' serial node node node ("NPN" | "PNP")
//! source      = ('V' | 'I') serial node node (["DC"] value | sine)
//! sine        = ("SINE" | "SIN") '(' value { value } ')'   (at most 7 values)
//!
//! serial      = digit { digit }
//! node        = '0' | ['N'] digit { digit }     (at most MAX_NODE_ID)
//! value       = number [prefix { letter }]
//! prefix      = 'f' | 'p' | 'n' | 'u' | 'm' | "meg" | 'k' | 'g' | 't'
//! ```
//!
//! # Component Types
//!
//! | Type | Description | Syntax |
//! |------|-------------|--------|
//! | R | Resistor | `R<n> <a> <b> <value>` |
//! | C | Capacitor | `C<n> <a> <b> <value>` |
//! | L | Inductor | `L<n> <a> <b> <value>` |
//! | D | Diode | `D<n> <anode> <cathode> <model>` |
//! | Q | BJT | `Q<n> <base> <collector> <emitter> <NPN\|PNP>` |
//! | V | Voltage Source | `V<n> <+> <-> <value \| SINE(...)>` |
//! | I | Current Source | `I<n> <+> <-> <value \| SINE(...)>` |
//!
//! Directives other than `.tran` and `.end` (`.model`, `.backanno`, ...) are
//! skipped with a warning.
//!
//! # Example
//!
//! ```text
//! * RC low-pass
//! V1 N001 0 SINE(0 1 1k)
//! R1 N001 N002 1k
//! C1 N002 0 100n
//! .tran 10u 5m
//! .end
//! ```

pub mod buffer;
pub mod metric;
mod parser;

pub use buffer::{ParseBuffer, Position, Skip};
pub use metric::{metric_exponent, parse_metric, MetricError};
pub use parser::{
    parse_component, parse_diode, parse_node, parse_passive, parse_source, parse_transistor,
    Parser,
};

use crate::components::Component;
use crate::error::Result;

/// Time step used when `.tran` gives zero or omits it.
pub const DEFAULT_TIME_STEP: f64 = 0.001;

/// Largest accepted node number. The MNA matrix is dense, so its size grows
/// with the square of the highest node.
pub const MAX_NODE_ID: usize = 4096;

/// The `.tran` directive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TranDirective {
    pub time_step: f64,
    pub stop_time: f64,
    pub start_time: f64,
}

/// A parsed component with the line it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct NetlistEntry {
    pub component: Component,
    pub line: usize,
}

/// Everything read from a netlist, in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Netlist {
    pub entries: Vec<NetlistEntry>,
    pub tran: Option<TranDirective>,
}

/// Parse a netlist string.
pub fn parse(input: &str) -> Result<Netlist> {
    Parser::new(input).parse()
}
