//! Workbook reading.
//!
//! Only the first worksheet is read. Header and data rows are absolute,
//! 1-based sheet rows, so leading blank rows in the sheet do not shift them.
//! Each column is typed from its cells:
//!
//! | cells                          | column     |
//! |--------------------------------|------------|
//! | integers, integral floats      | `Int64`    |
//! | any non-integral number        | `Float64`  |
//! | dates and datetimes            | `Datetime` |
//! | booleans                       | `Boolean`  |
//! | text, errors or a mix of kinds | `String`   |
//!
//! Empty cells are nulls and do not take part in typing. Text cells are
//! normalized.

use crate::config::SheetLayout;
use crate::error::{OraloadError, Result};
use crate::schema::{NamingRules, ValueShape, normalize, resolve_headers};
use calamine::{Data, DataType as _, Range, Reader as _, open_workbook_auto};
use chrono::NaiveDateTime;
use polars::prelude::{Column, DataFrame};
use std::path::Path;
use tracing::{debug, warn};

/// Largest magnitude at which every integral `f64` is exact.
const MAX_EXACT_FLOAT: f64 = 9_007_199_254_740_992.0;

/// Reads the first worksheet of the workbook at `path`.
///
/// # Errors
///
/// Returns an error if the workbook cannot be opened, has no worksheet, or
/// the worksheet is empty.
pub fn read_workbook(path: &Path, layout: &SheetLayout, rules: &NamingRules) -> Result<DataFrame> {
    let mut workbook = open_workbook_auto(path).map_err(|e| {
        OraloadError::Spreadsheet(format!("Failed to open {}: {e}", path.display()))
    })?;

    let sheet_name = workbook.sheet_names().first().cloned().unwrap_or_default();
    let range = workbook.worksheet_range_at(0).ok_or_else(|| {
        OraloadError::Spreadsheet(format!("{} has no worksheets", path.display()))
    })??;

    debug!(
        "Worksheet '{sheet_name}' spans {:?} to {:?}",
        range.start(),
        range.end()
    );
    frame_from_range(&range, layout, rules)
}

/// Builds the typed frame from a worksheet range.
///
/// # Errors
///
/// Returns an error if the range is empty or the frame cannot be assembled.
pub fn frame_from_range(
    range: &Range<Data>,
    layout: &SheetLayout,
    rules: &NamingRules,
) -> Result<DataFrame> {
    let Some((last_row, last_col)) = range.end() else {
        return Err(OraloadError::Spreadsheet("Worksheet is empty".to_owned()));
    };

    let header_row = layout.header_row.saturating_sub(1);
    let raw_headers: Vec<String> = (0..=last_col)
        .map(|col| cell(range, header_row, col).map(header_text).unwrap_or_default())
        .collect();

    let headers = resolve_headers(&raw_headers, rules, true);
    if headers.len() != layout.expected_columns {
        warn!(
            "Found {} usable columns, expected {}",
            headers.len(),
            layout.expected_columns
        );
    }

    let data_rows: Vec<u32> = (layout.data_start_row.saturating_sub(1)..=last_row).collect();
    debug!("Reading {} data rows", data_rows.len());

    let mut columns = Vec::with_capacity(headers.len());
    for header in &headers {
        let col = u32::try_from(header.source_index).map_err(|_| {
            OraloadError::Spreadsheet(format!("Column index {} out of range", header.source_index))
        })?;
        let cells: Vec<Option<&Data>> = data_rows.iter().map(|row| cell(range, *row, col)).collect();
        columns.push(build_column(&header.name, &cells));
    }

    Ok(DataFrame::new(columns)?)
}

/// Cell at an absolute, 0-based sheet position. Positions outside the used
/// area are `None`.
fn cell(range: &Range<Data>, row: u32, col: u32) -> Option<&Data> {
    range.get_value((row, col))
}

fn header_text(data: &Data) -> String {
    match data {
        Data::String(s) => s.clone(),
        Data::Empty => String::new(),
        other => render(other),
    }
}

/// Shape of one cell; `None` for empty cells.
fn cell_shape(data: &Data) -> Option<ValueShape> {
    match data {
        Data::Empty => None,
        Data::Int(_) => Some(ValueShape::Integer),
        Data::Float(f) if is_integral(*f) => Some(ValueShape::Integer),
        Data::Float(_) => Some(ValueShape::Float),
        Data::Bool(_) => Some(ValueShape::Boolean),
        Data::DateTime(_) | Data::DateTimeIso(_) if data.as_datetime().is_some() => {
            Some(ValueShape::DateTime)
        }
        _ => Some(ValueShape::Text),
    }
}

fn merge_shapes(a: ValueShape, b: ValueShape) -> ValueShape {
    match (a, b) {
        _ if a == b => a,
        (ValueShape::Integer | ValueShape::Float, ValueShape::Integer | ValueShape::Float) => {
            ValueShape::Float
        }
        _ => ValueShape::Text,
    }
}

/// Common shape of the non-empty cells; all-empty columns are text.
fn column_shape(cells: &[Option<&Data>]) -> ValueShape {
    cells
        .iter()
        .flatten()
        .filter_map(|data| cell_shape(data))
        .reduce(merge_shapes)
        .unwrap_or(ValueShape::Text)
}

fn build_column(name: &str, cells: &[Option<&Data>]) -> Column {
    let name = name.into();
    match column_shape(cells) {
        ValueShape::Integer => {
            let values: Vec<Option<i64>> = cells.iter().map(|c| c.and_then(as_integer)).collect();
            Column::new(name, values)
        }
        ValueShape::Float => {
            let values: Vec<Option<f64>> = cells.iter().map(|c| c.and_then(as_float)).collect();
            Column::new(name, values)
        }
        ValueShape::DateTime => {
            let values: Vec<Option<NaiveDateTime>> =
                cells.iter().map(|c| c.and_then(|d| d.as_datetime())).collect();
            Column::new(name, values)
        }
        ValueShape::Boolean => {
            let values: Vec<Option<bool>> = cells
                .iter()
                .map(|c| match c {
                    Some(Data::Bool(b)) => Some(*b),
                    _ => None,
                })
                .collect();
            Column::new(name, values)
        }
        ValueShape::Text => {
            let values: Vec<Option<String>> = cells.iter().map(|c| c.and_then(as_text)).collect();
            Column::new(name, values)
        }
    }
}

fn is_integral(value: f64) -> bool {
    value.is_finite() && value.fract() == 0.0 && value.abs() < MAX_EXACT_FLOAT
}

fn as_integer(data: &Data) -> Option<i64> {
    match data {
        Data::Int(i) => Some(*i),
        Data::Float(f) if is_integral(*f) => Some(*f as i64),
        _ => None,
    }
}

fn as_float(data: &Data) -> Option<f64> {
    match data {
        Data::Int(i) => Some(*i as f64),
        Data::Float(f) => Some(*f),
        _ => None,
    }
}

fn as_text(data: &Data) -> Option<String> {
    match data {
        Data::Empty => None,
        Data::String(s) => Some(normalize(s)),
        other => Some(render(other)),
    }
}

/// Text form of a non-text cell inside a text column.
fn render(data: &Data) -> String {
    match data {
        Data::DateTime(_) | Data::DateTimeIso(_) => data
            .as_datetime()
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| data.to_string()),
        other => other.to_string(),
    }
}
