//! Error types for the transpice simulator.
//!
//! This module provides a unified error type [`TranspiceError`] that covers
//! all error conditions that can occur during netlist parsing, schematic
//! assembly, matrix algebra, and transient simulation.

use thiserror::Error;

use crate::netlist::Position;

/// Result type alias using [`TranspiceError`].
pub type Result<T> = std::result::Result<T, TranspiceError>;

/// Unified error type for all transpice operations.
#[derive(Error, Debug)]
pub enum TranspiceError {
    // ============ Netlist Parsing Errors ============
    /// Numeric literal could not be read
    #[error("Malformed number '{token}' at line {line}, column {column}")]
    MalformedNumber {
        token: String,
        line: usize,
        column: usize,
    },

    /// Trailing letter is not a recognised metric prefix
    #[error("Unknown metric prefix '{prefix}' in '{token}' at line {line}, column {column}")]
    UnknownPrefix {
        token: String,
        prefix: char,
        line: usize,
        column: usize,
    },

    /// Line starts with a letter that names no component kind
    #[error("Unknown component '{symbol}' at line {line}, column {column}")]
    UnknownComponent {
        symbol: char,
        line: usize,
        column: usize,
    },

    /// Wrong or missing token
    #[error("Syntax error at line {line}, column {column}: {message}")]
    SyntaxError {
        line: usize,
        column: usize,
        message: String,
    },

    // ============ Schematic Errors ============
    /// Same kind letter and serial number used twice
    #[error("Duplicate designator '{designator}' at line {line}")]
    DuplicateDesignator { designator: String, line: usize },

    /// Netlist has no `.tran` directive
    #[error("No transient analysis specified (use '.tran <step> <stop>')")]
    MissingTransient,

    // ============ Matrix Errors ============
    /// Matrix has no inverse
    #[error("Singular matrix")]
    SingularMatrix,

    /// Operand shapes do not agree
    #[error("Dimension mismatch in {operation}: {}x{} vs {}x{}", left.0, left.1, right.0, right.1)]
    DimensionMismatch {
        operation: &'static str,
        left: (usize, usize),
        right: (usize, usize),
    },

    // ============ Simulation Errors ============
    /// Conductance matrix could not be inverted at a time step
    #[error("Singular system at t={time:.6e} - circuit may have a floating node or a voltage source loop")]
    SingularSystem { time: f64 },

    /// Newton-Raphson iteration did not converge
    #[error("Newton-Raphson did not converge at t={time:.6e} after {iterations} iterations (residual: {residual:.2e})")]
    NonConvergence {
        time: f64,
        iterations: usize,
        residual: f64,
    },

    // ============ I/O Errors ============
    /// Error writing result rows
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TranspiceError {
    /// Create a syntax error at a buffer position
    pub fn syntax(position: Position, message: impl Into<String>) -> Self {
        Self::SyntaxError {
            line: position.line,
            column: position.column,
            message: message.into(),
        }
    }

    /// Create an unknown component error
    pub fn unknown_component(position: Position, symbol: char) -> Self {
        Self::UnknownComponent {
            symbol,
            line: position.line,
            column: position.column,
        }
    }

    /// Create a convergence failure error
    pub fn non_convergence(time: f64, iterations: usize, residual: f64) -> Self {
        Self::NonConvergence {
            time,
            iterations,
            residual,
        }
    }

    /// Line number for errors that carry a source position.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::MalformedNumber { line, .. }
            | Self::UnknownPrefix { line, .. }
            | Self::UnknownComponent { line, .. }
            | Self::SyntaxError { line, .. }
            | Self::DuplicateDesignator { line, .. } => Some(*line),
            _ => None,
        }
    }
}
