//! Transient analysis time loop.

use std::collections::HashMap;

use super::history::{CurrentHistory, Histories, VoltageHistory};
use super::mna::{stamp_linear_components, MnaSystem};
use super::{EngineConfig, NewtonRaphson};
use crate::circuit::{ComponentIndex, NodeId, Schematic};
use crate::components::Component;
use crate::error::{Result, TranspiceError};
use crate::output::Row;

/// Slack added before flooring the step count, so `stop` lands on a step
/// despite rounding in `(stop - start) / h`.
const STEP_COUNT_SLACK: f64 = 1e-9;

/// Lifecycle of a [`TransientEngine`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EngineState {
    /// Matrices not yet sized
    Unconfigured,
    /// Matrices sized, no step taken
    Sized,
    /// At least one step taken
    Stepping { next_step: usize },
    /// All time points emitted
    Done,
    /// A step failed at `time`
    Failed { time: f64 },
}

/// Time-domain simulation of a schematic over its `.tran` window.
pub struct TransientEngine {
    /// The circuit being simulated
    schematic: Schematic,
    /// Newton-Raphson solver
    newton: NewtonRaphson,
    /// MNA matrix system
    system: MnaSystem,
    /// Per-pair voltage and per-component current histories
    histories: Histories,
    state: EngineState,
    start_time: f64,
    stop_time: f64,
    time_step: f64,
    /// Index of the last time point
    last_step: usize,
}

impl TransientEngine {
    /// Create an engine for `schematic`, which must carry a `.tran` directive.
    pub fn new(schematic: Schematic, config: EngineConfig) -> Result<Self> {
        let tran = *schematic.tran().ok_or(TranspiceError::MissingTransient)?;
        debug_assert!(tran.time_step > 0.0 && tran.stop_time >= tran.start_time);

        let span = (tran.stop_time - tran.start_time) / tran.time_step;
        let last_step = (span + STEP_COUNT_SLACK).floor() as usize;

        Ok(Self {
            newton: NewtonRaphson::with_config(&config),
            schematic,
            system: MnaSystem::new(),
            histories: Histories::new(),
            state: EngineState::Unconfigured,
            start_time: tran.start_time,
            stop_time: tran.stop_time,
            time_step: tran.time_step,
            last_step,
        })
    }

    /// Size the MNA system. Called implicitly by the first [`step`](Self::step).
    pub fn size(&mut self) {
        debug_assert_eq!(self.state, EngineState::Unconfigured);
        let node_count = self.schematic.node_count();
        let dimension = self.schematic.dimension();
        self.system.resize(node_count, dimension);
        self.state = EngineState::Sized;

        tracing::debug!(
            nodes = node_count,
            voltage_sources = self.schematic.voltage_source_count(),
            dimension,
            steps = self.last_step + 1,
            "sized MNA system"
        );
    }

    /// Advance one time point.
    ///
    /// Returns `Ok(None)` once the window is exhausted, and after a failure
    /// has been reported.
    pub fn step(&mut self) -> Result<Option<Row>> {
        let k = match self.state {
            EngineState::Unconfigured => {
                self.size();
                0
            }
            EngineState::Sized => 0,
            EngineState::Stepping { next_step } => next_step,
            EngineState::Done | EngineState::Failed { .. } => return Ok(None),
        };

        if k > self.last_step {
            self.state = EngineState::Done;
            return Ok(None);
        }

        let time = self.start_time + k as f64 * self.time_step;
        if let Err(e) = self.solve_at(time) {
            tracing::debug!(time, error = %e, "step failed");
            self.state = EngineState::Failed { time };
            return Err(e);
        }

        let row = Row {
            time,
            voltages: self.system.node_voltages().to_vec(),
        };
        self.update_histories(time, k > 0);
        self.state = EngineState::Stepping { next_step: k + 1 };

        tracing::trace!(step = k, time, "step accepted");
        Ok(Some(row))
    }

    fn solve_at(&mut self, time: f64) -> Result<()> {
        self.system.clear();
        stamp_linear_components(
            &self.schematic,
            &mut self.system,
            &self.histories,
            time,
            self.time_step,
        );

        if self.schematic.is_nonlinear() {
            self.newton.solve(&self.schematic, &mut self.system, time)?;
        } else {
            self.system.solve(time)?;
        }
        Ok(())
    }

    /// Record branch voltages and currents at the accepted solution.
    ///
    /// Currents are computed from the old histories before any is replaced.
    /// A terminal pair shared by several components is recorded once.
    fn update_histories(&mut self, time: f64, integrate: bool) {
        let dt = integrate.then_some(self.time_step);
        let mut pair_voltages: HashMap<(NodeId, NodeId), f64> = HashMap::new();
        let mut currents = Vec::with_capacity(self.schematic.components().len());

        for (index, component) in self.schematic.iter() {
            let (pair, current) = self.branch_sample(index, component, time);
            if let Some((a, b, v)) = pair {
                pair_voltages.insert((a, b), v);
            }
            currents.push((index, current));
        }

        for ((a, b), v) in pair_voltages {
            self.histories.record_voltage(a, b, v, dt);
        }
        for (index, current) in currents {
            self.histories.record_current(index, current, dt);
        }
    }

    /// Terminal-pair voltage (two-terminal parts only) and branch current.
    fn branch_sample(
        &self,
        index: ComponentIndex,
        component: &Component,
        time: f64,
    ) -> (Option<(NodeId, NodeId, f64)>, f64) {
        let nodes = component.nodes();
        let dt = self.time_step;

        if let Component::Transistor(q) = component {
            let v_c = self.system.voltage(q.collector());
            let v_b = self.system.voltage(q.base());
            let v_e = self.system.voltage(q.emitter());
            return (None, q.i_c(v_b - v_e, v_b - v_c));
        }

        let (a, b) = (nodes[0], nodes[1]);
        let v = self.system.voltage(a) - self.system.voltage(b);
        let v_prev = self.histories.previous_voltage(a, b);
        let i_prev = self.histories.previous_current(index);

        let current = match component {
            Component::Resistor(r) => r.current(v),
            Component::Capacitor(c) => c.current(dt, v, v_prev, i_prev),
            Component::Inductor(l) => l.current(dt, v, v_prev, i_prev),
            Component::Diode(d) => d.current(v),
            Component::CurrentSource(i) => i.current(time),
            Component::VoltageSource(_) => self
                .schematic
                .branch_row(index)
                .map_or(0.0, |row| self.system.result[(row, 0)]),
            Component::Transistor(_) => unreachable!(),
        };
        (Some((a, b, v)), current)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// The simulated schematic.
    pub fn schematic(&self) -> &Schematic {
        &self.schematic
    }

    /// Solution vector of the last solved step: node voltages, then voltage
    /// source branch currents.
    pub fn solution(&self) -> &[f64] {
        self.system.result.as_slice()
    }

    /// Time step of the run.
    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    /// Start and stop time of the run.
    pub fn window(&self) -> (f64, f64) {
        (self.start_time, self.stop_time)
    }

    /// Trapezoidal integral of the voltage across `(a, b)`, if some
    /// two-terminal component connects `a` to `b` in that order.
    pub fn voltage_integral(&self, a: NodeId, b: NodeId) -> Option<f64> {
        self.histories.voltage(a, b).map(|h: &VoltageHistory| h.integral)
    }

    /// Trapezoidal integral of a component's current.
    pub fn current_integral(&self, index: ComponentIndex) -> Option<f64> {
        self.histories.current(index).map(|h: &CurrentHistory| h.integral)
    }

    /// Current through a component at the last accepted step.
    pub fn branch_current(&self, index: ComponentIndex) -> Option<f64> {
        self.histories.current(index).map(|h| h.previous)
    }
}

/// Forward-only stream of result rows.
///
/// Yields one `Ok(Row)` per time point. A failed step yields one `Err` and
/// ends the stream.
pub struct RowStream {
    engine: TransientEngine,
}

impl RowStream {
    /// Wrap an engine.
    pub fn new(engine: TransientEngine) -> Self {
        Self { engine }
    }

    /// The underlying engine, for diagnostics.
    pub fn engine(&self) -> &TransientEngine {
        &self.engine
    }

    /// Unwrap the engine.
    pub fn into_engine(self) -> TransientEngine {
        self.engine
    }
}

impl Iterator for RowStream {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.engine.step().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlist::parse;
    use approx::assert_relative_eq;

    fn engine(input: &str) -> TransientEngine {
        let schematic = Schematic::from_netlist(parse(input).unwrap()).unwrap();
        TransientEngine::new(schematic, EngineConfig::default()).unwrap()
    }

    #[test]
    fn test_missing_transient() {
        let schematic = Schematic::from_netlist(parse("R1 1 0 1").unwrap()).unwrap();
        assert!(matches!(
            TransientEngine::new(schematic, EngineConfig::default()),
            Err(TranspiceError::MissingTransient)
        ));
    }

    #[test]
    fn test_state_transitions() {
        let mut e = engine("V1 1 0 1\nR1 1 0 1\n.tran 0.5 1");
        assert_eq!(e.state(), EngineState::Unconfigured);

        let times: Vec<f64> = std::iter::from_fn(|| e.step().unwrap()).map(|r| r.time).collect();
        assert_eq!(times, vec![0.0, 0.5, 1.0]);
        assert_eq!(e.state(), EngineState::Done);
        assert!(e.step().unwrap().is_none());
    }

    #[test]
    fn test_start_time_offsets_rows() {
        let e = engine("V1 1 0 1\nR1 1 0 1\n.tran 0.1 0.3 0.1");
        let times: Vec<f64> = RowStream::new(e).map(|r| r.unwrap().time).collect();
        assert_eq!(times.len(), 3);
        assert_relative_eq!(times[0], 0.1);
        assert_relative_eq!(times[2], 0.3, epsilon = 1e-12);
    }

    #[test]
    fn test_failure_is_reported_once() {
        let mut e = engine("V1 2 0 1\nR1 2 0 1\n.tran 1m 10m");
        assert!(matches!(e.step(), Err(TranspiceError::SingularSystem { time }) if time == 0.0));
        assert_eq!(e.state(), EngineState::Failed { time: 0.0 });
        assert!(e.step().unwrap().is_none());
    }

    #[test]
    fn test_resistor_current_and_integrals() {
        let mut stream = RowStream::new(engine("V1 1 0 2\nR1 1 0 4\n.tran 0.5 2"));
        let rows: Vec<Row> = stream.by_ref().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 5);

        let e = stream.engine();
        assert_relative_eq!(e.branch_current(ComponentIndex(1)).unwrap(), 0.5);
        // Voltage source branch unknown is the current into its + terminal
        assert_relative_eq!(e.branch_current(ComponentIndex(0)).unwrap(), -0.5);
        assert_relative_eq!(e.voltage_integral(NodeId(1), NodeId(0)).unwrap(), 4.0, epsilon = 1e-12);
        assert_relative_eq!(e.current_integral(ComponentIndex(1)).unwrap(), 1.0, epsilon = 1e-12);
        assert!(e.voltage_integral(NodeId(0), NodeId(1)).is_none());
        assert_eq!(e.solution().len(), 2);
    }

    #[test]
    fn test_shared_pair_integrated_once() {
        // Three components across (1, 0): the pair integral is still 2V * 2s
        let mut stream = RowStream::new(engine("V1 1 0 2\nR1 1 0 4\nR2 1 0 4\n.tran 0.5 2"));
        for row in stream.by_ref() {
            row.unwrap();
        }
        let e = stream.engine();
        assert_relative_eq!(e.voltage_integral(NodeId(1), NodeId(0)).unwrap(), 4.0, epsilon = 1e-12);
        assert_relative_eq!(e.current_integral(ComponentIndex(1)).unwrap(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(e.current_integral(ComponentIndex(2)).unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_inductor_current_ramps() {
        // 1V across 1H: i(t) = t
        let mut stream = RowStream::new(engine("V1 1 0 1\nL1 1 0 1\n.tran 0.1 1"));
        for row in stream.by_ref() {
            row.unwrap();
        }
        assert_relative_eq!(
            stream.engine().branch_current(ComponentIndex(1)).unwrap(),
            1.05,
            epsilon = 1e-9
        );
    }
}
