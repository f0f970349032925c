//! Result rows and their text output.
//!
//! Format, one line per time point:
//! ```text
//! time, V(1), V(2)
//! 0, 1, 0.5
//! 0.001, 1, 0.49875
//! ```
//! The header line is optional.

use std::fmt;
use std::io::Write;

use crate::error::Result;
use crate::solver::RowStream;

/// Node voltages at one time point.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub time: f64,
    /// `voltages[i]` is the voltage of node `i + 1`
    pub voltages: Vec<f64>,
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.time)?;
        for v in &self.voltages {
            write!(f, ", {}", v)?;
        }
        Ok(())
    }
}

/// Writes rows as delimited text.
pub struct RowWriter<W: Write> {
    writer: W,
}

impl<W: Write> RowWriter<W> {
    /// Create a new writer.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Write `time, V(1), ..., V(n)`.
    pub fn write_header(&mut self, node_count: usize) -> Result<()> {
        write!(self.writer, "time")?;
        for node in 1..=node_count {
            write!(self.writer, ", V({})", node)?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    /// Write one row.
    pub fn write_row(&mut self, row: &Row) -> Result<()> {
        writeln!(self.writer, "{}", row)?;
        Ok(())
    }

    /// Write every row of `rows` and flush.
    ///
    /// A simulation error is returned after the rows before it have been
    /// written and flushed. Returns the number of rows written.
    pub fn write_stream(&mut self, rows: RowStream) -> Result<usize> {
        let mut written = 0;
        for row in rows {
            match row {
                Ok(row) => {
                    self.write_row(&row)?;
                    written += 1;
                }
                Err(e) => {
                    self.writer.flush()?;
                    return Err(e);
                }
            }
        }
        self.writer.flush()?;
        Ok(written)
    }

    /// Unwrap the inner writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Render every row of `rows` into a string.
pub fn rows_to_string(rows: RowStream) -> Result<String> {
    let mut writer = RowWriter::new(Vec::new());
    writer.write_stream(rows)?;
    Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
}
