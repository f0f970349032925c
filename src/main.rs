//! Transpice - transient circuit simulator
//!
//! Reads a netlist and prints one row of node voltages per time point.
//!
//! # Usage
//!
//! ```bash
//! transpice circuit.net > result.txt
//! RUST_LOG=debug transpice circuit.net --header -o result.txt
//! ```

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use clap::Parser;
use transpice::{
    error::Result,
    solver::{CONVERGENCE_TOLERANCE, MAX_ITERATIONS},
    EngineConfig, RowWriter,
};

/// Transient circuit simulator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the netlist file
    #[arg(value_name = "NETLIST")]
    netlist: PathBuf,

    /// Write rows to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Print a `time, V(1), ...` header line first
    #[arg(long)]
    header: bool,

    /// Maximum Newton-Raphson iterations per time step
    #[arg(long, default_value_t = MAX_ITERATIONS)]
    max_iterations: usize,

    /// Newton-Raphson convergence tolerance (volts)
    #[arg(long, default_value_t = CONVERGENCE_TOLERANCE)]
    tolerance: f64,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let text = std::fs::read_to_string(&args.netlist)?;

    let config = EngineConfig::new()
        .with_max_iterations(args.max_iterations)
        .with_tolerance(args.tolerance);
    let rows = transpice::parse_and_run_with_config(&text, config)?;

    let sink: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    let mut writer = RowWriter::new(sink);

    if args.header {
        writer.write_header(rows.engine().schematic().node_count())?;
    }
    let written = writer.write_stream(rows)?;
    tracing::info!(rows = written, "simulation finished");

    Ok(())
}
