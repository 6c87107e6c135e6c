//! Configuration management for the delivery KPI analytics engine

use figment::{
    providers::{Env, Format, Yaml},
    Figment,
};
use delivery_kpi_types::{StageSegment, StageTable};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadError(String),

    #[error("invalid configuration: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Main analytics configuration
///
/// Every field has a default, so a missing file or a partial YAML
/// document is fine. A structurally invalid value here is the only
/// condition that aborts a run; noisy input data never does.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KpiConfig {
    /// Maximum acceptable total lead time in seconds
    pub sla_seconds: u64,

    /// Dimension field the group breakdown partitions by
    pub group_key: String,

    /// Stage table as raw event type names, in declared order
    pub stages: Vec<StageEntry>,

    /// Event type the total lead time starts at
    pub total_from: String,

    /// Event type the total lead time ends at
    pub total_to: String,
}

/// One stage table row as written in the configuration file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageEntry {
    /// Segment code the stage is reported under
    pub code: String,
    /// Opening event type name
    pub from: String,
    /// Closing event type name
    pub to: String,
}

impl Default for KpiConfig {
    fn default() -> Self {
        let table = StageTable::default();
        Self {
            sla_seconds: 2700, // 45 minutes
            group_key: "region".to_string(),
            stages: table
                .segments
                .iter()
                .map(|segment| StageEntry {
                    code: segment.code.clone(),
                    from: segment.from.to_string(),
                    to: segment.to.to_string(),
                })
                .collect(),
            total_from: table.total_from.to_string(),
            total_to: table.total_to.to_string(),
        }
    }
}

impl KpiConfig {
    /// Load configuration from an optional YAML file layered under
    /// `KPI_`-prefixed environment variables.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let mut figment = Figment::new();

        if let Some(path) = config_path {
            figment = figment.merge(Yaml::file(path));
        }

        figment = figment.merge(Env::prefixed("KPI_").split("__"));

        figment
            .extract()
            .map_err(|e| ConfigError::LoadError(e.to_string()))
    }

    /// Validate the structural invariants the pipeline relies on.
    pub fn validate(&self) -> Result<()> {
        if self.sla_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "sla_seconds must be greater than zero".to_string(),
            ));
        }

        if self.group_key.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "group_key must not be empty".to_string(),
            ));
        }

        if self.stages.is_empty() {
            return Err(ConfigError::ValidationError(
                "stage table must declare at least one segment".to_string(),
            ));
        }

        let mut codes = HashSet::new();
        for entry in &self.stages {
            if entry.code.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "stage segment code must not be empty".to_string(),
                ));
            }
            if !codes.insert(entry.code.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate stage segment code: {}",
                    entry.code
                )));
            }
        }

        // Event type names are checked when the typed table is built
        self.stage_table().map(|_| ())
    }

    /// Convert the raw stage entries into the typed table the calculator
    /// consumes. An unrecognized event type name is a deployment mistake.
    pub fn stage_table(&self) -> Result<StageTable> {
        let segments = self
            .stages
            .iter()
            .map(|entry| {
                Ok(StageSegment::new(
                    entry.code.clone(),
                    parse_event_type(&entry.from)?,
                    parse_event_type(&entry.to)?,
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(StageTable {
            segments,
            total_from: parse_event_type(&self.total_from)?,
            total_to: parse_event_type(&self.total_to)?,
        })
    }
}

fn parse_event_type(name: &str) -> Result<delivery_kpi_types::EventType> {
    name.parse().map_err(|_| {
        ConfigError::ValidationError(format!(
            "stage table references unknown event type: {name}"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = KpiConfig::default();
        assert_eq!(config.sla_seconds, 2700);
        assert_eq!(config.group_key, "region");
        assert_eq!(config.stages.len(), 6);
        assert!(config.validate().is_ok());
        assert_eq!(config.stage_table().unwrap(), StageTable::default());
    }

    #[test]
    fn test_zero_sla_rejected() {
        let mut config = KpiConfig::default();
        config.sla_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_group_key_rejected() {
        let mut config = KpiConfig::default();
        config.group_key = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_stage_table_rejected() {
        let mut config = KpiConfig::default();
        config.stages.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duplicate_stage_code_rejected() {
        let mut config = KpiConfig::default();
        config.stages[1].code = "S1".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_event_type_rejected() {
        let mut config = KpiConfig::default();
        config.stages[0].from = "ORDER_TELEPORTED".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("ORDER_TELEPORTED"));
    }

    #[test]
    fn test_load_partial_yaml_keeps_defaults() {
        let mut file = tempfile::Builder::new()
            .suffix(".yaml")
            .tempfile()
            .unwrap();
        writeln!(file, "sla_seconds: 600\ngroup_key: store_id").unwrap();

        let config = KpiConfig::load(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.sla_seconds, 600);
        assert_eq!(config.group_key, "store_id");
        assert_eq!(config.stages.len(), 6);
    }

    #[test]
    fn test_load_missing_file_is_defaults() {
        let config = KpiConfig::load(None).unwrap();
        assert_eq!(config.sla_seconds, KpiConfig::default().sla_seconds);
    }
}
