//! Reading written tables back.

use crate::error::SinkError;
use crate::schema::{RawRidership, RawRidershipRecord, RAW_COLUMNS};
use serde_json::Value;
use std::path::Path;
use subway_types::{Dataset, Record};

/// Read a CSV file into a dataset, every cell as a string.
///
/// Column order follows the header. Empty cells are read back as empty
/// strings, so types are not recovered; use [`read_ridership`] for typed
/// rows.
pub fn read_dataset(path: impl AsRef<Path>) -> Result<Dataset, SinkError> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let record: Record = headers
            .iter()
            .zip(row.iter())
            .map(|(name, value)| (name.to_string(), Value::String(value.to_string())))
            .collect();
        records.push(record);
    }

    Ok(Dataset::new(records))
}

/// Check that a file carries every column downstream consumers need.
///
/// # Errors
///
/// Returns [`SinkError::MissingColumns`] listing the absent names, in
/// schema order.
pub fn check_columns(path: impl AsRef<Path>) -> Result<(), SinkError> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?;

    let missing: Vec<String> = RAW_COLUMNS
        .iter()
        .filter(|column| !headers.iter().any(|h| h == **column))
        .map(|column| column.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(SinkError::MissingColumns(missing))
    }
}

/// Read a raw ridership file into typed rows.
///
/// Extra columns are ignored.
pub fn read_ridership(path: impl AsRef<Path>) -> Result<Vec<RawRidership>, SinkError> {
    let path = path.as_ref();
    check_columns(path)?;

    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();

    for result in reader.deserialize() {
        let record: RawRidershipRecord = result?;
        let line = rows.len() as u64 + 2;
        let row = RawRidership::try_from(record)
            .map_err(|reason| SinkError::InvalidRow { line, reason })?;
        rows.push(row);
    }

    Ok(rows)
}

/// Values of one column, in file order. Used to feed station names to the
/// geocoder.
pub fn read_column(path: impl AsRef<Path>, column: &str) -> Result<Vec<String>, SinkError> {
    let mut reader = csv::Reader::from_path(path)?;
    let index = reader
        .headers()?
        .iter()
        .position(|h| h == column)
        .ok_or_else(|| SinkError::MissingColumns(vec![column.to_string()]))?;

    let mut values = Vec::new();
    for row in reader.records() {
        let row = row?;
        if let Some(value) = row.get(index) {
            values.push(value.to_string());
        }
    }
    Ok(values)
}
