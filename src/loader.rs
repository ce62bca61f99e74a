//! CSV ingestion of raw registration rows.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::Read;
use tracing::debug;

use crate::record::RawRow;

/// Reads every row of the CSV file at `path`.
///
/// Columns beyond the known ones are ignored; missing or empty cells become
/// `None` and are left for the normalizer to reject.
pub fn load_rows(path: &str) -> Result<Vec<RawRow>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path))?;
    let rows = read_rows(file).with_context(|| format!("failed to read {}", path))?;
    debug!(path, rows = rows.len(), "Loaded raw rows");
    Ok(rows)
}

/// Reads raw rows from any CSV source with a header line.
pub fn read_rows<R: Read>(reader: R) -> Result<Vec<RawRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let row: RawRow = result?;
        rows.push(row);
    }

    Ok(rows)
}
