//! Event log loading and report persistence
//!
//! Mechanical I/O collaborators for the analytic core: read raw records
//! from newline-delimited JSON or CSV event logs, and persist the final
//! report as pretty-printed JSON. No validation happens here beyond the
//! file formats themselves; structurally incomplete records flow through
//! as-is for the normalizer to judge.

pub mod jsonl;
pub mod tabular;
pub mod writer;

pub use jsonl::{load_jsonl, parse_jsonl};
pub use tabular::{load_csv, parse_csv};
pub use writer::write_report;

use delivery_kpi_types::RawRecord;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed JSON on line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to serialize report: {0}")]
    Serialize(#[source] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LoaderError>;

/// Input file format, picked from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Newline-delimited JSON objects (the default)
    Jsonl,
    /// Comma-separated values with a header row
    Csv,
}

impl LogFormat {
    /// `.csv` means CSV; everything else is treated as JSONL.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => LogFormat::Csv,
            _ => LogFormat::Jsonl,
        }
    }
}

/// Load an event log, dispatching on the file extension.
pub async fn load_records(path: impl AsRef<Path>) -> Result<Vec<RawRecord>> {
    let path = path.as_ref();
    match LogFormat::from_path(path) {
        LogFormat::Jsonl => load_jsonl(path).await,
        LogFormat::Csv => load_csv(path).await,
    }
}
