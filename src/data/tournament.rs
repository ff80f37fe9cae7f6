//! Raw tournament export reader. Produces the header row and every data row as plain strings;
//! column meaning is assigned later by the fleet parser.
//!
//! CSV is read header-less and flexible: rows may be ragged and cells may span lines.
//! `.xlsx`/`.xls`/`.ods` exports are read from their first sheet.

use std::path::Path;

use calamine::Reader;

use crate::error::{Result, StarforgeError};

pub const DEFAULT_TOURNAMENT_PATH: &str = "data/import/tournament-fleets.csv";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

pub fn is_workbook(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "xlsx" | "xlsm" | "xls" | "ods"))
        .unwrap_or(false)
}

pub fn read_table(path: &Path) -> Result<RawTable> {
    if is_workbook(path) {
        read_workbook(path)
    } else {
        read_csv(path)
    }
}

pub fn read_csv(path: &Path) -> Result<RawTable> {
    let map_err = |source| StarforgeError::TournamentRead {
        path: path.display().to_string(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(map_err)?;
    let mut records = Vec::new();
    for record in reader.records() {
        let record = record.map_err(map_err)?;
        records.push(record.iter().map(str::to_string).collect());
    }
    Ok(split_header(records))
}

/// Parse CSV text already in memory.
pub fn read_csv_str(raw: &str) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(raw.as_bytes());
    let mut records = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|source| StarforgeError::TournamentRead {
            path: "<memory>".to_string(),
            source,
        })?;
        records.push(record.iter().map(str::to_string).collect());
    }
    Ok(split_header(records))
}

pub fn read_workbook(path: &Path) -> Result<RawTable> {
    let workbook_err = |message: String| StarforgeError::Workbook {
        path: path.display().to_string(),
        message,
    };
    let mut workbook = calamine::open_workbook_auto(path).map_err(|e| workbook_err(e.to_string()))?;
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| workbook_err("workbook has no sheets".to_string()))?;
    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| workbook_err(e.to_string()))?;
    tracing::debug!(sheet = %sheet, rows = range.height(), cols = range.width(), "reading workbook sheet");
    let records = range
        .rows()
        .map(|row| row.iter().map(cell_str).collect())
        .collect();
    Ok(split_header(records))
}

pub fn cell_str(d: &calamine::Data) -> String {
    match d {
        calamine::Data::Empty => String::new(),
        calamine::Data::String(s) => s.clone(),
        calamine::Data::Float(f) => format!("{}", f),
        calamine::Data::Int(i) => format!("{}", i),
        calamine::Data::Bool(b) => format!("{}", b),
        _ => format!("{:?}", d),
    }
}

fn split_header(mut records: Vec<Vec<String>>) -> RawTable {
    if records.is_empty() {
        return RawTable::default();
    }
    let mut headers = records.remove(0);
    if let Some(first) = headers.first_mut() {
        if let Some(stripped) = first.strip_prefix('\u{feff}') {
            *first = stripped.to_string();
        }
    }
    RawTable {
        headers,
        rows: records,
    }
}
