//! Report persistence

use crate::{LoaderError, Result};
use delivery_kpi_types::KpiReport;
use std::path::Path;
use tracing::info;

/// Persist a report as pretty-printed JSON, creating parent directories.
pub async fn write_report(path: impl AsRef<Path>, report: &KpiReport) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let mut json = serde_json::to_string_pretty(report).map_err(LoaderError::Serialize)?;
    json.push('\n');
    tokio::fs::write(path, json).await?;

    info!(path = %path.display(), "wrote KPI report");
    Ok(())
}
