//! Input extraction.
//!
//! Reads the configured input into a typed [`DataFrame`] whose column names
//! are cleaned, unique identifiers, then classifies every column into the
//! target schema:
//!
//! - [`spreadsheet`]: first worksheet of a workbook, cell-by-cell typing
//! - [`delimited`]: CSV and other delimited text through Polars
//! - [`dataset`]: the classified result and the normalized extract writer

pub mod dataset;
pub mod delimited;
pub mod spreadsheet;

pub use dataset::ExtractedDataset;

use crate::config::{GeneratorConfig, InputKind, delimiter_byte};
use crate::error::{OraloadError, Result};
use crate::schema::table_identifier;
use tracing::info;

/// Reads and classifies the configured input.
///
/// # Errors
///
/// Returns an error if the input does not exist, is of an unsupported kind,
/// cannot be parsed, or yields no usable column.
pub fn extract(config: &GeneratorConfig) -> Result<ExtractedDataset> {
    let path = config.input_path.as_path();
    let kind = config.resolve_input_kind()?;

    if !path.is_file() {
        return Err(OraloadError::InvalidPath(format!(
            "Input file not found: {}",
            path.display()
        )));
    }

    let table_name = table_identifier(path, &config.naming);
    info!(
        "Reading {} input {} into table {table_name}",
        kind.as_str(),
        path.display()
    );

    let frame = match kind {
        InputKind::Excel => spreadsheet::read_workbook(path, &config.sheet, &config.naming)?,
        InputKind::Csv => delimited::read_delimited(
            path,
            delimiter_byte(config.input_delimiter)?,
            &config.naming,
        )?,
    };

    if frame.width() == 0 {
        return Err(OraloadError::DataProcessing(format!(
            "No usable column headers found in {}",
            path.display()
        )));
    }

    info!("Read {} rows and {} columns", frame.height(), frame.width());
    ExtractedDataset::classify(table_name, frame, &config.naming)
}
