//! Atomic CSV writer.
//!
//! Files are written to a hidden temporary sibling (`.{name}.tmp`) and
//! renamed over the target only after the data is flushed and synced.
//! Readers therefore see either the previous file or the complete new one.

use crate::error::SinkError;
use serde::Serialize;
use serde_json::Value;
use std::borrow::Cow;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use subway_types::{Dataset, Record};

/// Write a dataset as UTF-8 CSV, replacing `path` atomically.
///
/// The header is [`Dataset::columns`], i.e. the source's field order.
/// Strings are written verbatim, numbers in JSON notation, and missing or
/// null fields as empty cells.
///
/// # Errors
///
/// - `EmptyDataset` if there are no rows; no file is touched
/// - `Io`/`Csv` if writing fails; the previous file at `path` is left intact
///
/// # Returns
///
/// The number of data rows written.
pub fn write_dataset(dataset: &Dataset, path: impl AsRef<Path>) -> Result<usize, SinkError> {
    if dataset.is_empty() {
        return Err(SinkError::EmptyDataset);
    }

    let path = path.as_ref();
    let columns = dataset.columns();

    write_atomic(path, |writer| {
        writer.write_record(&columns)?;
        for record in dataset {
            writer.write_record(columns.iter().map(|c| render(record, c).into_owned()))?;
        }
        Ok(())
    })?;

    tracing::info!("Saved {} rows to {}", dataset.len(), path.display());
    Ok(dataset.len())
}

/// Write serializable rows under `header`, replacing `path` atomically.
///
/// The header is always written, so an empty `rows` still leaves a file
/// downstream readers accept. Field order of `T` must match `header`.
pub fn write_rows<T: Serialize>(
    header: &[&str],
    rows: &[T],
    path: impl AsRef<Path>,
) -> Result<usize, SinkError> {
    let path = path.as_ref();
    write_atomic(path, |writer| {
        writer.write_record(header)?;
        for row in rows {
            writer.serialize(row)?;
        }
        Ok(())
    })?;

    tracing::info!("Saved {} rows to {}", rows.len(), path.display());
    Ok(rows.len())
}

/// Text form of one cell.
fn render<'a>(record: &'a Record, column: &str) -> Cow<'a, str> {
    match record.get(column) {
        None | Some(Value::Null) => Cow::Borrowed(""),
        Some(Value::String(s)) => Cow::Borrowed(s),
        Some(other) => Cow::Owned(other.to_string()),
    }
}

/// Hidden sibling used while the new file is being written.
fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    path.with_file_name(format!(".{}.tmp", name))
}

fn write_atomic<F>(path: &Path, fill: F) -> Result<(), SinkError>
where
    F: FnOnce(&mut csv::Writer<File>) -> Result<(), SinkError>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = temp_path(path);
    let written = (|| {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&tmp_path)?;
        fill(&mut writer)?;
        let file = writer.into_inner().map_err(|e| SinkError::Io(e.into_error()))?;
        file.sync_all()?;
        Ok::<(), SinkError>(())
    })();

    if let Err(e) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }

    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    Ok(())
}
