//! Delimited text reading.
//!
//! Column types come from Polars' schema inference (dates included). The
//! header record is read separately as raw text, since Polars renames
//! repeated names on its own. Headers are then cleaned and deduplicated like
//! worksheet headers, except that headers cleaning to nothing keep the
//! placeholder name instead of being dropped.

use crate::error::{OraloadError, Result};
use crate::schema::{NamingRules, normalize, resolve_headers};
use polars::prelude::*;
use std::path::Path;
use tracing::debug;

/// Rows used to infer column types.
const INFER_SCHEMA_ROWS: usize = 10_000;

/// Reads a delimited text file with a header line.
///
/// # Errors
///
/// Returns an error if the file cannot be parsed.
pub fn read_delimited(path: &Path, delimiter: u8, rules: &NamingRules) -> Result<DataFrame> {
    let frame = LazyCsvReader::new(path)
        .with_has_header(true)
        .with_separator(delimiter)
        .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
        .with_try_parse_dates(true)
        .finish()?
        .collect()?;

    let raw_headers = read_header_record(path, delimiter)?;
    debug!("Raw headers: {raw_headers:?}");
    if raw_headers.len() != frame.width() {
        return Err(OraloadError::DataProcessing(format!(
            "Header has {} fields but the data has {} columns",
            raw_headers.len(),
            frame.width()
        )));
    }

    let headers = resolve_headers(&raw_headers, rules, false);
    let columns = frame
        .get_columns()
        .iter()
        .zip(&headers)
        .map(|(column, header)| normalize_column(column, &header.name))
        .collect::<Result<Vec<_>>>()?;

    Ok(DataFrame::new(columns)?)
}

/// The first record of the file, untouched by Polars' header renaming.
/// Quoting follows the CSV rules; empty fields come back as empty strings.
fn read_header_record(path: &Path, delimiter: u8) -> Result<Vec<String>> {
    let header_row = LazyCsvReader::new(path)
        .with_has_header(false)
        .with_separator(delimiter)
        .with_infer_schema_length(Some(0))
        .with_n_rows(Some(1))
        .finish()?
        .collect()?;

    header_row
        .get_columns()
        .iter()
        .map(|column| {
            let text = column.cast(&DataType::String)?;
            let value = text
                .as_materialized_series()
                .str()?
                .get(0)
                .unwrap_or_default()
                .to_owned();
            Ok(value)
        })
        .collect()
}

/// Renames the column; text values are normalized too.
fn normalize_column(column: &Column, name: &str) -> Result<Column> {
    if column.dtype() != &DataType::String {
        return Ok(column.clone().with_name(name.into()));
    }

    let values: Vec<Option<String>> = column
        .as_materialized_series()
        .str()?
        .into_iter()
        .map(|value| value.map(normalize))
        .collect();
    Ok(Column::new(name.into(), values))
}
