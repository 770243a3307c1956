//! Storage module - CSV persistence and export of the record log

mod codec;
mod export;

pub use codec::{load_records, persist_records, read_records, write_records, HEADER};
pub use export::{export_file_name, export_records};
