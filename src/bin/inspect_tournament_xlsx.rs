//! Inspect a tournament export workbook (or CSV): sheet names, header classification and the
//! first rows.
//! Usage: cargo run --bin inspect_tournament_xlsx -- path/to/tournament.xlsx [rows]

use std::path::Path;

use calamine::Reader;
use starforge::data::tournament::{is_workbook, read_table};
use starforge::fleet::Column;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .ok_or("Usage: inspect_tournament_xlsx <path-to.xlsx> [rows]")?;
    let rows: usize = std::env::args()
        .nth(2)
        .map(|raw| raw.parse())
        .transpose()?
        .unwrap_or(10);
    let path = Path::new(&path);
    if !path.exists() {
        return Err(format!("File not found: {}", path.display()).into());
    }

    if is_workbook(path) {
        let wb = calamine::open_workbook_auto(path)?;
        let names = wb.sheet_names();
        println!("Sheets ({}): {}", names.len(), names.join(", "));
        println!("Using first sheet: {}", names.first().ok_or("No sheets")?);
    }

    let table = read_table(path)?;
    println!("\nHeader ({} columns):", table.headers.len());
    for (i, header) in table.headers.iter().enumerate() {
        println!("  {:>3}: {:<24} {}", i + 1, header, Column::classify(header).as_str());
    }

    println!("\n{} data rows, first {}:", table.rows.len(), rows.min(table.rows.len()));
    for (i, row) in table.rows.iter().take(rows).enumerate() {
        let cells: Vec<String> = row
            .iter()
            .filter(|cell| !cell.trim().is_empty())
            .map(|cell| cell.split_whitespace().collect::<Vec<_>>().join(" "))
            .collect();
        println!("  {}: {}", i + 2, cells.join(" | "));
    }
    Ok(())
}
