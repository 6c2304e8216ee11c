//! File encodings of [`Table`].
//!
//! `.xlsx`/`.xls` workbooks are read from their first sheet. `.csv` uses
//! commas; `.tsv` and `.txt` use tabs. The first row is the header row.

use crate::domain::table::Table;
use crate::utils::error::{Result, WranglerError};
use calamine::{Data, DataType, Reader};
use std::collections::HashSet;
use std::io::{Cursor, Write};
use std::path::Path;

pub const SUPPORTED_EXTENSIONS: &[&str] = &["xlsx", "xls", "csv", "tsv", "txt"];

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Workbook,
    Delimited(u8),
}

pub fn format_for(path: &Path) -> Result<TableFormat> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "xlsx" | "xls" => Ok(TableFormat::Workbook),
        "csv" => Ok(TableFormat::Delimited(b',')),
        "tsv" | "txt" => Ok(TableFormat::Delimited(b'\t')),
        _ => Err(WranglerError::UnsupportedFormat {
            path: path.display().to_string(),
            extension,
        }),
    }
}

/// Decode `data` as a table. `path` picks the format and labels errors.
pub fn parse_table(data: &[u8], path: &Path) -> Result<Table> {
    match format_for(path)? {
        TableFormat::Workbook => parse_workbook(data, path),
        TableFormat::Delimited(delimiter) => parse_delimited(data, delimiter, path),
    }
}

fn parse_delimited(data: &[u8], delimiter: u8, path: &Path) -> Result<Table> {
    let malformed = |source: csv::Error| WranglerError::MalformedTable {
        path: path.display().to_string(),
        source,
    };

    // Excel "CSV UTF-8" exports start with a byte-order mark
    let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(false)
        .from_reader(data);

    let headers: Vec<String> = reader
        .headers()
        .map_err(malformed)?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    ensure_unique_headers(&headers, path)?;

    let mut table = Table::new(headers);
    for record in reader.records() {
        let record = record.map_err(malformed)?;
        table.push_row(record.iter().map(str::to_string).collect())?;
    }

    Ok(table)
}

fn parse_workbook(data: &[u8], path: &Path) -> Result<Table> {
    let malformed = |source: calamine::Error| WranglerError::MalformedWorkbook {
        path: path.display().to_string(),
        source,
    };

    let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(data)).map_err(malformed)?;
    let range = workbook
        .worksheet_range_at(0)
        .unwrap_or(Err(calamine::Error::Msg("workbook has no sheets")))
        .map_err(malformed)?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .map(|row| row.iter().map(|cell| cell_text(cell).trim().to_string()).collect())
        .unwrap_or_default();
    ensure_unique_headers(&headers, path)?;

    let mut table = Table::new(headers);
    for row in rows {
        table.push_row(row.iter().map(cell_text).collect())?;
    }

    tracing::debug!("Read {} rows from first sheet of {}", table.len(), path.display());
    Ok(table)
}

/// Render a cell the way it reads in the spreadsheet.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::DateTime(_) => cell
            .as_datetime()
            .map(|dt| dt.format(DATETIME_FORMAT).to_string())
            .unwrap_or_else(|| cell.to_string()),
        other => other.to_string(),
    }
}

fn ensure_unique_headers(headers: &[String], path: &Path) -> Result<()> {
    let mut seen = HashSet::new();
    match headers
        .iter()
        .filter(|h| !h.is_empty())
        .find(|h| !seen.insert(h.as_str()))
    {
        Some(column) => Err(WranglerError::DuplicateColumn {
            path: path.display().to_string(),
            column: column.clone(),
        }),
        None => Ok(()),
    }
}

pub fn write_csv<W: Write>(table: &Table, writer: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(table.headers())?;
    for row in table.rows() {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}
