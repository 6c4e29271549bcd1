//! File writers for per-bin records.

use crate::Result;
use mockifu_core::{BinStatRecord, RECORD_COLUMNS};
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Formats a value like C's `%+e`: explicit sign, six fraction digits and a
/// signed exponent of at least two digits (`+1.234560e+01`).
#[must_use]
pub fn format_exp(value: f64) -> String {
    if value.is_nan() {
        return "+nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "+inf" } else { "-inf" }.to_string();
    }
    let formatted = format!("{value:+.6e}");
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => match exponent.parse::<i32>() {
            Ok(exp) => {
                let sign = if exp < 0 { '-' } else { '+' };
                format!("{mantissa}e{sign}{:02}", exp.unsigned_abs())
            }
            Err(_) => formatted,
        },
        None => formatted,
    }
}

/// One `IFU_data` line: the bin id padded to three characters, then the 14
/// record values in `%+e` notation, separated by single spaces.
#[must_use]
pub fn format_ifu_row(record: &BinStatRecord) -> String {
    let mut line = format!("{:3}", record.bin_id);
    for value in record.values() {
        line.push(' ');
        line.push_str(&format_exp(value));
    }
    line
}

/// Writer for per-bin record tables.
pub struct IfuDataWriter {
    writer: BufWriter<File>,
}

impl IfuDataWriter {
    /// Creates a new file writer.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        Ok(Self { writer })
    }

    /// Writes records in the `IFU_data` text layout, one line per bin.
    ///
    /// # Errors
    /// Returns an error if writing fails.
    pub fn write_records(&mut self, records: &[BinStatRecord]) -> Result<()> {
        for record in records {
            writeln!(self.writer, "{}", format_ifu_row(record))?;
        }

        self.writer.flush()?;
        Ok(())
    }

    /// Writes records as CSV with a header row.
    ///
    /// # Errors
    /// Returns an error if writing fails.
    pub fn write_csv(&mut self, records: &[BinStatRecord]) -> Result<()> {
        writeln!(self.writer, "{}", RECORD_COLUMNS.join(","))?;

        let mut line = String::new();
        for record in records {
            line.clear();
            // Writing into a String cannot fail.
            let _ = write!(line, "{}", record.bin_id);
            for value in record.values() {
                let _ = write!(line, ",{value}");
            }
            writeln!(self.writer, "{line}")?;
        }

        self.writer.flush()?;
        Ok(())
    }

    /// Flushes the writer.
    ///
    /// # Errors
    /// Returns an error if flushing fails.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
