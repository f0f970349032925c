//! Parser for netlist text.

use super::buffer::{ParseBuffer, Position, Skip};
use super::metric::{parse_metric, MetricError};
use super::{Netlist, NetlistEntry, TranDirective, DEFAULT_TIME_STEP, MAX_NODE_ID};
use crate::circuit::NodeId;
use crate::components::{
    Bjt, BjtModel, Capacitor, Component, ComponentKind, CurrentSource, Diode, Function, Inductor,
    Resistor, Sinusoid, VoltageSource,
};
use crate::error::{Result, TranspiceError};

/// Number of positional fields in `SINE(...)`.
const SINE_FIELDS: usize = 7;

/// `.tran` keywords accepted and ignored.
const TRAN_FLAGS: [&str; 4] = ["uic", "startup", "steady", "nodiscard"];

/// Line-by-line netlist parser.
pub struct Parser<'a> {
    buf: ParseBuffer<'a>,
}

impl<'a> Parser<'a> {
    /// Create a new parser over `input`.
    pub fn new(input: &'a str) -> Self {
        Self {
            buf: ParseBuffer::new(input),
        }
    }

    /// Parse the entire netlist.
    pub fn parse(&mut self) -> Result<Netlist> {
        let mut netlist = Netlist::default();

        loop {
            self.buf.skip_whitespace(Skip::ALL);
            if self.buf.is_at_end() {
                break;
            }

            if self.buf.current() == b'.' {
                if !self.parse_directive(&mut netlist)? {
                    break;
                }
            } else {
                let line = self.buf.position().line;
                let component = parse_component(&mut self.buf)?;
                netlist.entries.push(NetlistEntry { component, line });
            }

            expect_line_end(&mut self.buf)?;
        }

        tracing::debug!(
            components = netlist.entries.len(),
            has_tran = netlist.tran.is_some(),
            "parsed netlist"
        );
        Ok(netlist)
    }

    /// Parse one directive line. Returns false on `.end`.
    fn parse_directive(&mut self, netlist: &mut Netlist) -> Result<bool> {
        let start = self.buf.position();
        self.buf.advance(1);
        let name = self.buf.read_word();

        match name.to_ascii_lowercase().as_str() {
            "tran" => {
                if netlist.tran.is_some() {
                    return Err(TranspiceError::syntax(start, "duplicate .tran directive"));
                }
                netlist.tran = Some(self.parse_tran(start)?);
            }
            "end" => return Ok(false),
            "" => return Err(TranspiceError::syntax(start, "expected directive name after '.'")),
            _ => {
                tracing::warn!(line = start.line, directive = name, "skipping unsupported directive");
                self.buf.skip_to_line_end();
            }
        }
        Ok(true)
    }

    fn parse_tran(&mut self, start: Position) -> Result<TranDirective> {
        let mut values = Vec::with_capacity(4);

        loop {
            self.buf.skip_whitespace(Skip::SPACES | Skip::COMMENTS);
            if self.buf.at_line_end() {
                break;
            }
            let pos = self.buf.position();
            let word = self.buf.read_word();
            if TRAN_FLAGS.iter().any(|flag| word.eq_ignore_ascii_case(flag)) {
                tracing::warn!(line = pos.line, flag = word, "ignoring .tran flag");
                continue;
            }
            if word.is_empty() || values.len() == 4 {
                return Err(TranspiceError::syntax(pos, format!("unexpected token '{}' in .tran", word)));
            }
            values.push(metric_at(word, pos)?);
        }

        let (time_step, stop_time, start_time) = match values.as_slice() {
            [] => return Err(TranspiceError::syntax(start, ".tran requires a stop time")),
            [stop] => (0.0, *stop, 0.0),
            [step, stop] => (*step, *stop, 0.0),
            [step, stop, begin, ..] => (*step, *stop, *begin),
        };

        if stop_time == 0.0 {
            return Err(TranspiceError::syntax(start, ".tran stop time must be non-zero"));
        }
        if time_step < 0.0 || stop_time < start_time {
            return Err(TranspiceError::syntax(
                start,
                format!(
                    "invalid .tran window: step {} from {} to {}",
                    time_step, start_time, stop_time
                ),
            ));
        }

        Ok(TranDirective {
            time_step: if time_step == 0.0 { DEFAULT_TIME_STEP } else { time_step },
            stop_time,
            start_time,
        })
    }
}

/// Parse one component line, dispatching on its first letter.
pub fn parse_component(buf: &mut ParseBuffer) -> Result<Component> {
    let symbol = buf.current();
    let kind = ComponentKind::from_symbol(symbol)
        .ok_or_else(|| TranspiceError::unknown_component(buf.position(), symbol as char))?;

    match kind {
        ComponentKind::Resistor | ComponentKind::Capacitor | ComponentKind::Inductor => {
            parse_passive(buf, kind)
        }
        ComponentKind::Diode => parse_diode(buf),
        ComponentKind::Transistor => parse_transistor(buf),
        ComponentKind::CurrentSource | ComponentKind::VoltageSource => parse_source(buf, kind),
    }
}

/// `R|C|L<n> <a> <b> <value>`
pub fn parse_passive(buf: &mut ParseBuffer, kind: ComponentKind) -> Result<Component> {
    let designator = parse_designator(buf, kind)?;
    let nodes = [parse_node(buf)?, parse_node(buf)?];
    let value = parse_value(buf)?;

    let component = match kind {
        ComponentKind::Resistor => Component::Resistor(Resistor::new(designator, nodes, value)),
        ComponentKind::Capacitor => Component::Capacitor(Capacitor::new(designator, nodes, value)),
        ComponentKind::Inductor => Component::Inductor(Inductor::new(designator, nodes, value)),
        _ => unreachable!("parse_passive called for {:?}", kind),
    };
    Ok(component)
}

/// `D<n> <anode> <cathode> <model>`
pub fn parse_diode(buf: &mut ParseBuffer) -> Result<Component> {
    let designator = parse_designator(buf, ComponentKind::Diode)?;
    let nodes = [parse_node(buf)?, parse_node(buf)?];
    let (pos, model) = next_word(buf);
    if model.is_empty() {
        return Err(TranspiceError::syntax(pos, "expected diode model"));
    }
    Ok(Component::Diode(Diode::new(designator, nodes, model.to_string())))
}

/// `Q<n> <base> <collector> <emitter> <NPN|PNP>`
pub fn parse_transistor(buf: &mut ParseBuffer) -> Result<Component> {
    let designator = parse_designator(buf, ComponentKind::Transistor)?;
    let nodes = [parse_node(buf)?, parse_node(buf)?, parse_node(buf)?];
    let (pos, word) = next_word(buf);
    let model: BjtModel = word.parse().map_err(|_| {
        TranspiceError::syntax(pos, format!("expected NPN or PNP, got '{}'", word))
    })?;
    Ok(Component::Transistor(Bjt::new(designator, nodes, model)))
}

/// `V|I<n> <+> <-> <value | SINE(...)>`
pub fn parse_source(buf: &mut ParseBuffer, kind: ComponentKind) -> Result<Component> {
    let designator = parse_designator(buf, kind)?;
    let nodes = [parse_node(buf)?, parse_node(buf)?];
    let function = parse_function(buf)?;

    let component = match kind {
        ComponentKind::VoltageSource => {
            Component::VoltageSource(VoltageSource::new(designator, nodes, function))
        }
        ComponentKind::CurrentSource => {
            Component::CurrentSource(CurrentSource::new(designator, nodes, function))
        }
        _ => unreachable!("parse_source called for {:?}", kind),
    };
    Ok(component)
}

/// `0` or `[N]digits` up to [`MAX_NODE_ID`]; `N000` is ground.
pub fn parse_node(buf: &mut ParseBuffer) -> Result<NodeId> {
    let (pos, word) = next_word(buf);
    let digits = word.strip_prefix(&['N', 'n'][..]).unwrap_or(word);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TranspiceError::syntax(pos, format!("expected node, got '{}'", word)));
    }
    match digits.parse::<usize>() {
        Ok(id) if id <= MAX_NODE_ID => Ok(NodeId(id)),
        _ => Err(TranspiceError::syntax(
            pos,
            format!("node number out of range (max {}): '{}'", MAX_NODE_ID, word),
        )),
    }
}

/// Kind letter followed immediately by the serial number.
fn parse_designator(buf: &mut ParseBuffer, kind: ComponentKind) -> Result<u32> {
    debug_assert_eq!(
        buf.current().to_ascii_uppercase(),
        kind.symbol(),
        "parser for {:?} called on the wrong line",
        kind
    );
    let pos = buf.position();
    buf.advance(1);
    let serial = buf.read_word();
    if serial.is_empty() || !serial.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TranspiceError::syntax(
            pos,
            format!(
                "expected serial number after '{}', got '{}'",
                kind.symbol() as char,
                serial
            ),
        ));
    }
    serial
        .parse()
        .map_err(|_| TranspiceError::syntax(pos, format!("serial number out of range: '{}'", serial)))
}

fn parse_value(buf: &mut ParseBuffer) -> Result<f64> {
    let (pos, word) = next_word(buf);
    if word.is_empty() {
        return Err(TranspiceError::syntax(pos, "expected value"));
    }
    metric_at(word, pos)
}

/// Bare value (optionally after `DC`) or `SINE(...)`.
fn parse_function(buf: &mut ParseBuffer) -> Result<Function> {
    buf.skip_whitespace(Skip::SPACES);
    let mut lookahead = buf.clone();
    let word = lookahead.read_word();

    if word.eq_ignore_ascii_case("SINE") || word.eq_ignore_ascii_case("SIN") {
        *buf = lookahead;
        return parse_sine(buf).map(Function::Sinusoid);
    }
    if word.eq_ignore_ascii_case("DC") {
        *buf = lookahead;
    }
    let offset = parse_value(buf)?;
    Ok(Function::Constant { offset })
}

/// `( offset [amplitude [frequency [delay [damping [phase [cycles]]]]]] )`
fn parse_sine(buf: &mut ParseBuffer) -> Result<Sinusoid> {
    buf.skip_whitespace(Skip::SPACES);
    if !buf.match_char(b'(') {
        return Err(TranspiceError::syntax(buf.position(), "expected '(' after SINE"));
    }

    let mut fields = Vec::with_capacity(SINE_FIELDS);
    while fields.len() < SINE_FIELDS {
        buf.skip_whitespace(Skip::ALL);
        if !starts_number(buf.current()) {
            break;
        }
        let pos = buf.position();
        let word = buf.read_word();
        fields.push(metric_at(word, pos)?);
    }

    buf.skip_whitespace(Skip::ALL);
    if !buf.match_char(b')') {
        return Err(TranspiceError::syntax(buf.position(), "expected ')' to close SINE"));
    }
    if fields.is_empty() {
        tracing::warn!(line = buf.position().line, "SINE() without fields is a zero source");
    }
    Ok(Sinusoid::from_fields(&fields))
}

fn starts_number(byte: u8) -> bool {
    byte.is_ascii_digit() || matches!(byte, b'+' | b'-' | b'.')
}

fn next_word<'a>(buf: &mut ParseBuffer<'a>) -> (Position, &'a str) {
    buf.skip_whitespace(Skip::SPACES);
    (buf.position(), buf.read_word())
}

fn metric_at(word: &str, pos: Position) -> Result<f64> {
    parse_metric(word).map_err(|e| match e {
        MetricError::MalformedNumber(token) => TranspiceError::MalformedNumber {
            token,
            line: pos.line,
            column: pos.column,
        },
        MetricError::UnknownPrefix { token, prefix } => TranspiceError::UnknownPrefix {
            token,
            prefix,
            line: pos.line,
            column: pos.column,
        },
    })
}

fn expect_line_end(buf: &mut ParseBuffer) -> Result<()> {
    buf.skip_whitespace(Skip::SPACES | Skip::COMMENTS);
    if buf.at_line_end() {
        return Ok(());
    }
    let pos = buf.position();
    let mut lookahead = buf.clone();
    let word = lookahead.read_word();
    let token = if word.is_empty() {
        (buf.current() as char).to_string()
    } else {
        word.to_string()
    };
    Err(TranspiceError::syntax(pos, format!("unexpected token '{}'", token)))
}
