// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/wattlog

//! CSV encoding of the record log
//!
//! ```text
//! timestamp,power_watts,cumulative_energy_kwh,cost
//! 2024-01-01 00:00:00.000,1234,0.0343,0.0041
//! ```

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::core::PersistenceError;
use crate::recording::Record;

/// Header row of every persisted sink
pub const HEADER: [&str; 4] = ["timestamp", "power_watts", "cumulative_energy_kwh", "cost"];

/// Write the header followed by one row per record
pub fn write_records<W: Write>(writer: W, records: &[Record]) -> Result<(), csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    writer.write_record(HEADER)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Parse a header + rows stream back into records
pub fn read_records<R: Read>(reader: R) -> Result<Vec<Record>, PersistenceError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers().map_err(|e| PersistenceError::Malformed {
        line: 1,
        reason: e.to_string(),
    })?;
    if headers.iter().ne(HEADER.iter().copied()) {
        return Err(PersistenceError::Malformed {
            line: 1,
            reason: format!("unexpected header {:?}", headers.iter().collect::<Vec<_>>()),
        });
    }

    let mut records = Vec::new();
    for (idx, row) in reader.deserialize::<Record>().enumerate() {
        let record = row.map_err(|e| PersistenceError::Malformed {
            line: e.position().map(|p| p.line() as usize).unwrap_or(idx + 2),
            reason: e.to_string(),
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Replace `path` with a CSV of `records`.
///
/// Rows go to a uniquely named temp file in the same directory which is
/// renamed over the target, so a reader never sees a half-written sink and
/// concurrent writers never share a temp file. The temp file is removed if
/// any step fails.
pub fn persist_records(path: &Path, records: &[Record]) -> Result<(), PersistenceError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| PersistenceError::io(dir, e))?;
    write_records(BufWriter::new(tmp.as_file_mut()), records)
        .map_err(|e| PersistenceError::csv(tmp.path(), e))?;
    tmp.persist(path)
        .map_err(|e| PersistenceError::io(path, e.error))?;

    debug!("Persisted {} records to {:?}", records.len(), path);
    Ok(())
}

/// Read a persisted sink back from disk
pub fn load_records(path: &Path) -> Result<Vec<Record>, PersistenceError> {
    let file = File::open(path).map_err(|e| PersistenceError::io(path, e))?;
    read_records(file)
}
