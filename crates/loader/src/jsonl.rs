//! Newline-delimited JSON event logs

use crate::{LoaderError, Result};
use delivery_kpi_types::RawRecord;
use std::path::Path;
use tracing::debug;

/// Read a JSONL event log from disk.
pub async fn load_jsonl(path: impl AsRef<Path>) -> Result<Vec<RawRecord>> {
    let text = tokio::fs::read_to_string(path.as_ref()).await?;
    let records = parse_jsonl(&text)?;
    debug!(
        path = %path.as_ref().display(),
        records = records.len(),
        "loaded JSONL event log"
    );
    Ok(records)
}

/// Parse JSONL text: one record per non-blank line.
///
/// A malformed line is a hard error carrying its 1-based line number;
/// the log file itself being broken is a deployment problem, unlike a
/// well-formed record with missing fields, which the normalizer handles.
pub fn parse_jsonl(text: &str) -> Result<Vec<RawRecord>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line.trim()).map_err(|source| LoaderError::Json {
                line: index + 1,
                source,
            })
        })
        .collect()
}
