//! On-demand export of a session to a derived filename

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::info;

use super::persist_records;
use crate::core::PersistenceError;
use crate::recording::Record;

const FILE_STAMP: &str = "%Y%m%d_%H%M%S";

/// `<start_yyyyMMdd_HHmmss>_to_<end_yyyyMMdd_HHmmss>_energy_data.csv`
pub fn export_file_name(start: NaiveDateTime, end: NaiveDateTime) -> String {
    format!(
        "{}_to_{}_energy_data.csv",
        start.format(FILE_STAMP),
        end.format(FILE_STAMP)
    )
}

/// Write `records` to `dir/file_name`, creating `dir` if needed
pub fn export_records(
    dir: &Path,
    file_name: &str,
    records: &[Record],
) -> Result<PathBuf, PersistenceError> {
    fs::create_dir_all(dir).map_err(|e| PersistenceError::io(dir, e))?;

    let path = dir.join(file_name);
    persist_records(&path, records)?;
    info!("Exported {} records to {:?}", records.len(), path);
    Ok(path)
}
