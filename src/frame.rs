//! Minimal tabular payload used for dataset round-trips.
//!
//! Persisted form is UTF-8 CSV with a header row and no index column.
//! Column order, values, and row count survive a round-trip; rows are
//! string-typed, interpretation is up to the caller.

use crate::error::{Result, StoreError};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DataFrame {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl DataFrame {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row. Width must match the header.
    pub fn push_row(&mut self, row: Vec<String>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(StoreError::DataFormat(format!(
                "row has {} fields, expected {}",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of data rows (header excluded).
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Write as CSV to a local path, creating parent directories as needed.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }
        let file = File::create(path).map_err(|e| StoreError::io(path, e))?;
        self.write_csv_to(BufWriter::new(file))
    }

    fn write_csv_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer
            .write_record(&self.columns)
            .map_err(|e| StoreError::DataFormat(e.to_string()))?;
        for row in &self.rows {
            csv_writer
                .write_record(row)
                .map_err(|e| StoreError::DataFormat(e.to_string()))?;
        }
        csv_writer
            .flush()
            .map_err(|e| StoreError::DataFormat(e.to_string()))?;
        Ok(())
    }

    /// Parse CSV from a local path.
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| StoreError::io(path, e))?;
        Self::from_csv_reader(BufReader::new(file))
    }

    /// Parse CSV from any reader. Header row required; ragged rows are a
    /// [`StoreError::DataFormat`].
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(reader);

        let columns: Vec<String> = csv_reader
            .headers()
            .map_err(|e| StoreError::DataFormat(e.to_string()))?
            .iter()
            .map(str::to_string)
            .collect();
        if columns.is_empty() || (columns.len() == 1 && columns[0].is_empty()) {
            return Err(StoreError::DataFormat(
                "content is empty or has no header row".to_string(),
            ));
        }

        let mut frame = Self::new(columns);
        for record in csv_reader.records() {
            let record = record.map_err(|e| StoreError::DataFormat(e.to_string()))?;
            frame.push_row(record.iter().map(str::to_string).collect())?;
        }
        Ok(frame)
    }
}
