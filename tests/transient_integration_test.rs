//! Integration tests for transient analysis.

use approx::{assert_abs_diff_eq, assert_relative_eq};
use transpice::circuit::{ComponentIndex, NodeId};
use transpice::solver::EngineState;
use transpice::{parse_and_run, parse_and_run_with_config, EngineConfig, Row, TranspiceError};

/// Helper: parse + run, collecting every row
fn tran_rows(netlist: &str) -> Vec<Row> {
    parse_and_run(netlist)
        .expect("setup failed")
        .collect::<Result<Vec<_>, _>>()
        .expect("transient analysis failed")
}

#[test]
fn test_voltage_divider() {
    let netlist = "\
* two 1 ohm resistors across 2V
V1 N001 0 2
R1 N001 N002 1
R2 N002 0 1
.tran 1m 10m
.end
";
    let rows = tran_rows(netlist);
    assert_eq!(rows.len(), 11);
    for row in &rows {
        assert_abs_diff_eq!(row.voltages[0], 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(row.voltages[1], 1.0, epsilon = 1e-12);
    }
}

#[test]
fn test_rc_charging() {
    // V(out) = 1 - exp(-t/RC), RC = 1s
    let netlist = "\
V1 N001 0 1
R1 N001 N002 1
C1 N002 0 1
.tran 0.01 5
";
    let rows = tran_rows(netlist);
    assert_eq!(rows.len(), 501);

    for row in &rows {
        let expected = 1.0 - (-row.time).exp();
        assert_abs_diff_eq!(row.voltages[1], expected, epsilon = 1e-2);
    }
    assert_abs_diff_eq!(rows.last().unwrap().time, 5.0, epsilon = 1e-9);
}

#[test]
fn test_rl_current_rise() {
    // i(t) = (1 - exp(-t R/L)), so V(N002) across the inductor is exp(-t)
    let netlist = "\
V1 N001 0 1
R1 N001 N002 1
L1 N002 0 1
.tran 10m 5
";
    let mut stream = parse_and_run(netlist).unwrap();
    for row in stream.by_ref() {
        let row = row.unwrap();
        assert_abs_diff_eq!(row.voltages[1], (-row.time).exp(), epsilon = 1e-2);
    }

    let engine = stream.engine();
    assert_eq!(engine.state(), EngineState::Done);
    let i_l = engine.branch_current(ComponentIndex(2)).unwrap();
    assert_abs_diff_eq!(i_l, 1.0 - (-5.0f64).exp(), epsilon = 1e-2);

    // Flux linkage: the integral of V(L) over the run is L·i
    let flux = engine.voltage_integral(NodeId(2), NodeId::GROUND).unwrap();
    assert_abs_diff_eq!(flux, i_l, epsilon = 1e-2);
}

#[test]
fn test_capacitor_charge_matches_current_integral() {
    let netlist = "\
I1 0 N001 1m
C1 N001 0 1u
R1 N001 0 1Meg
.tran 10u 1m
";
    let mut stream = parse_and_run(netlist).unwrap();
    let rows: Vec<Row> = stream.by_ref().map(|r| r.unwrap()).collect();

    // I1 draws 1mA out of N001, so the capacitor charges negative
    let v_start = rows[0].voltages[0];
    let v_end = rows.last().unwrap().voltages[0];
    let charge = stream.engine().current_integral(ComponentIndex(1)).unwrap();
    assert_abs_diff_eq!(charge, 1e-6 * (v_end - v_start), epsilon = 1e-12);
    assert!(v_end < -0.9 && v_end > -1.1, "V(end)={}", v_end);
}

#[test]
fn test_shared_pair_voltage_integral() {
    // R2 and C1 share (N002, 0). Thevenin: 0.5V behind 1 ohm, tau = 1s,
    // so v(t) = 0.5(1 - exp(-t)) and its integral is 0.5(t - 1 + exp(-t)).
    let netlist = "\
V1 N001 0 1
R1 N001 N002 2
R2 N002 0 2
C1 N002 0 1
.tran 0.01 5
";
    let mut stream = parse_and_run(netlist).unwrap();
    let rows: Vec<Row> = stream.by_ref().map(|r| r.unwrap()).collect();
    let engine = stream.engine();

    let t_end = rows.last().unwrap().time;
    let expected = 0.5 * (t_end - 1.0 + (-t_end).exp());
    let flux = engine.voltage_integral(NodeId(2), NodeId::GROUND).unwrap();
    assert_abs_diff_eq!(flux, expected, epsilon = 1e-3);

    // The source pair holds 1V for the whole run
    let source_flux = engine.voltage_integral(NodeId(1), NodeId::GROUND).unwrap();
    assert_relative_eq!(source_flux, t_end, max_relative = 1e-12);

    // Per-component current integrals are unaffected by the shared pair
    let v_end = rows.last().unwrap().voltages[1];
    let r2_charge = engine.current_integral(ComponentIndex(2)).unwrap();
    assert_relative_eq!(r2_charge, flux / 2.0, max_relative = 1e-9);
    let c1_charge = engine.current_integral(ComponentIndex(3)).unwrap();
    assert_abs_diff_eq!(c1_charge, v_end - rows[0].voltages[1], epsilon = 1e-9);
}

#[test]
fn test_mixed_scale_divider_is_reported_singular() {
    // Two 100T resistors behind 1V: conductances of 1e-14 next to the unit
    // source coupling fall under the relative pivot threshold.
    let netlist = "\
V1 N001 0 1
R1 N001 N002 100T
R2 N002 0 100T
.tran 1m 2m
";
    let mut rows = parse_and_run(netlist).unwrap();
    assert!(matches!(
        rows.next(),
        Some(Err(TranspiceError::SingularSystem { time })) if time == 0.0
    ));
}

#[test]
fn test_sine_source_waits_for_delay() {
    let netlist = "\
V1 N001 0 SINE(0 1 1 0.5 0 0 0)
R1 N001 0 1k
.tran 0.1 1
";
    let rows = tran_rows(netlist);
    let before: Vec<&Row> = rows.iter().filter(|r| r.time < 0.5 - 1e-9).collect();
    assert_eq!(before.len(), 5);
    for row in before {
        assert_eq!(row.voltages[0], 0.0);
    }
    // A quarter period after the delay the sine peaks
    let peak = rows.iter().find(|r| (r.time - 0.8).abs() < 1e-9).unwrap();
    assert_abs_diff_eq!(
        peak.voltages[0],
        (2.0 * std::f64::consts::PI * 0.3).sin(),
        epsilon = 1e-9
    );
}

#[test]
fn test_sine_source_expires_to_offset() {
    let netlist = "\
V1 N001 0 SINE(0.5 1 1 0 0 0 1)
R1 N001 0 1
.tran 0.25 2
";
    let rows = tran_rows(netlist);
    for row in rows.iter().filter(|r| r.time > 1.0 + 1e-9) {
        assert_eq!(row.voltages[0], 0.5, "t={}", row.time);
    }
}

#[test]
fn test_half_wave_rectifier() {
    let netlist = "\
V1 N001 0 SINE(0 5 50)
D1 N001 N002 1N4148
R1 N002 0 1k
.tran 0.5m 40m
";
    let rows = tran_rows(netlist);
    let peak = rows.iter().map(|r| r.voltages[1]).fold(f64::MIN, f64::max);
    let floor = rows.iter().map(|r| r.voltages[1]).fold(f64::MAX, f64::min);
    assert!(peak > 4.0 && peak < 4.6, "peak {}", peak);
    assert!(floor > -1e-6, "reverse leakage {}", floor);
}

#[test]
fn test_isolated_node_is_singular() {
    let netlist = "\
V1 N002 0 1
R1 N002 0 1k
.tran 1m 10m
";
    let mut rows = parse_and_run(netlist).unwrap();
    match rows.next() {
        Some(Err(TranspiceError::SingularSystem { time })) => assert_eq!(time, 0.0),
        other => panic!("expected SingularSystem, got {:?}", other),
    }
    assert!(rows.next().is_none());
}

#[test]
fn test_non_convergence_with_one_iteration() {
    let netlist = "\
V1 N001 0 5
R1 N001 N002 1k
D1 N002 0 D
.tran 1m 2m
";
    let config = EngineConfig::default().with_max_iterations(1);
    let mut rows = parse_and_run_with_config(netlist, config).unwrap();
    assert!(matches!(
        rows.next(),
        Some(Err(TranspiceError::NonConvergence { iterations: 1, .. }))
    ));
    assert_eq!(rows.engine().state(), EngineState::Failed { time: 0.0 });
    assert!(rows.next().is_none());
}

#[test]
fn test_setup_errors() {
    assert!(matches!(
        parse_and_run("R1 1 0 1k\nR2 1 0 2k\n"),
        Err(TranspiceError::MissingTransient)
    ));
    assert!(matches!(
        parse_and_run("R1 1 0 1k\nR1 1 0 2k\n.tran 1m 1"),
        Err(TranspiceError::DuplicateDesignator { line: 2, .. })
    ));
    assert!(matches!(
        parse_and_run("V1 N001 0 1\nR1 N001 N002 abc\n.tran 1m 1"),
        Err(TranspiceError::MalformedNumber { line: 2, .. })
    ));
}
