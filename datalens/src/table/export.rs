//! CSV export and terminal rendering.

use std::io::Write;

use arrow::csv::WriterBuilder;
use arrow::util::pretty::pretty_format_batches;

use super::Table;
use crate::error::{LensError, Result};

impl Table {
    /// Writes the table as UTF-8 CSV: a header row of column names, then one
    /// line per row. Missing values become empty fields.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let batch = self.to_record_batch()?;
        let mut csv_writer = WriterBuilder::new().with_header(true).build(writer);
        csv_writer.write(&batch)?;
        Ok(())
    }

    /// Renders the table as CSV text.
    pub fn to_csv_string(&self) -> Result<String> {
        let mut buffer = Vec::new();
        self.write_csv(&mut buffer)?;
        String::from_utf8(buffer).map_err(|e| LensError::Internal(e.to_string()))
    }

    /// Renders the table as a boxed ASCII grid.
    pub fn pretty(&self) -> Result<String> {
        if self.columns.is_empty() {
            return Ok("(no columns)".to_string());
        }
        let batch = self.to_record_batch()?;
        Ok(pretty_format_batches(&[batch])?.to_string())
    }
}
