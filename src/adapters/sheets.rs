//! Spreadsheet decoding.
//!
//! Excel workbooks (`xlsx`, `xls`, `xlsb`, `ods`) are read with calamine from
//! their first worksheet; `csv` files with the csv crate. In both cases the
//! first row is the header.

use crate::domain::model::{CellValue, RawTable};
use crate::utils::error::{CarmsError, Result};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::Cursor;
use std::path::Path;

pub const SHEET_EXTENSIONS: &[&str] = &["xlsx", "xls", "xlsb", "ods", "csv"];

pub fn parse_sheet(file_name: &str, bytes: Vec<u8>) -> Result<RawTable> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    let table = match extension.as_str() {
        "csv" => parse_csv(file_name, &bytes)?,
        "xlsx" | "xls" | "xlsb" | "ods" => parse_workbook(file_name, bytes)?,
        other => {
            return Err(CarmsError::InvalidConfigValueError {
                field: "sources".to_string(),
                value: file_name.to_string(),
                reason: format!(
                    "Unsupported sheet format '{}'. Allowed extensions: {}",
                    other,
                    SHEET_EXTENSIONS.join(", ")
                ),
            })
        }
    };

    tracing::debug!(
        "Parsed {} ({} columns, {} rows)",
        file_name,
        table.headers.len(),
        table.rows.len()
    );
    Ok(table)
}

fn parse_workbook(file_name: &str, bytes: Vec<u8>) -> Result<RawTable> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let range = workbook.worksheet_range_at(0).ok_or_else(|| {
        CarmsError::processing("extract", format!("{} contains no worksheet", file_name))
    })??;

    let mut rows = range.rows();
    let headers = match rows.next() {
        Some(header) => header.iter().map(header_text).collect(),
        None => Vec::new(),
    };
    let rows = rows
        .map(|row| row.iter().map(cell_value).collect::<Vec<_>>())
        .filter(|row| !row.iter().all(CellValue::is_blank))
        .collect();

    Ok(RawTable {
        source: file_name.to_string(),
        headers,
        rows,
    })
}

fn header_text(cell: &Data) -> String {
    cell_value(cell).as_text().unwrap_or_default()
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => CellValue::Float(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => {
            tracing::debug!("Treating spreadsheet error cell {:?} as empty", e);
            CellValue::Empty
        }
    }
}

fn parse_csv(file_name: &str, bytes: &[u8]) -> Result<RawTable> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: Vec<CellValue> = record
            .iter()
            .map(|field| {
                if field.trim().is_empty() {
                    CellValue::Empty
                } else {
                    CellValue::Text(field.to_string())
                }
            })
            .collect();
        if !row.iter().all(CellValue::is_blank) {
            rows.push(row);
        }
    }

    Ok(RawTable {
        source: file_name.to_string(),
        headers,
        rows,
    })
}
