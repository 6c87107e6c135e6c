//! Pipeline composition: raw records to KPI report in one pass

use crate::aggregate::KpiAggregator;
use crate::error::Result;
use crate::leadtime::LeadTimeCalculator;
use crate::normalizer;
use crate::timeline;
use delivery_kpi_config::KpiConfig;
use delivery_kpi_types::{KpiReport, RawRecord};
use tracing::info;

/// Record counts for one pipeline run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Raw records handed to the pipeline
    pub raw_records: u64,
    /// Records dropped by the normalizer
    pub rejected_records: u64,
    /// Canonical events that survived normalization
    pub events: u64,
    /// Distinct orders with at least one event
    pub orders: u64,
    /// Orders with a present total lead time
    pub completed_orders: u64,
}

/// Report plus the per-stage counts of the run that produced it
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub report: KpiReport,
    pub stats: PipelineStats,
}

/// The full analytic pipeline, wired from one configuration value
///
/// Construction is the only fallible step; a run over arbitrary input
/// always completes, degrading malformed data to absence.
#[derive(Debug, Clone)]
pub struct KpiPipeline {
    calculator: LeadTimeCalculator,
    aggregator: KpiAggregator,
}

impl KpiPipeline {
    /// Wire the calculator and aggregator from the given configuration.
    pub fn new(config: &KpiConfig) -> Result<Self> {
        let table = config.stage_table()?;
        let aggregator = KpiAggregator::new(config.sla_seconds, config.group_key.clone(), &table)?;
        let calculator = LeadTimeCalculator::new(table)?;
        Ok(Self {
            calculator,
            aggregator,
        })
    }

    /// Run the full pass: normalize, build timelines, compute lead
    /// times, aggregate.
    pub fn run(&self, records: Vec<RawRecord>) -> PipelineRun {
        let raw_records = records.len() as u64;

        let (events, normalizer_stats) = normalizer::normalize_all(records);
        info!(
            raw = raw_records,
            accepted = normalizer_stats.accepted,
            rejected = normalizer_stats.rejected(),
            "normalized raw records"
        );

        let timelines = timeline::build_timelines(events);
        info!(orders = timelines.len(), "built order timelines");

        let metrics = self.calculator.compute(&timelines);
        let report = self.aggregator.aggregate(&metrics);
        info!(
            total = report.total_orders,
            completed = report.completed_orders,
            "aggregated KPI report"
        );

        let stats = PipelineStats {
            raw_records,
            rejected_records: normalizer_stats.rejected(),
            events: normalizer_stats.accepted,
            orders: timelines.len() as u64,
            completed_orders: report.completed_orders,
        };

        PipelineRun { report, stats }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_rejects_bad_configuration() {
        let mut config = KpiConfig::default();
        config.stages[0].from = "NOT_AN_EVENT".to_string();
        assert!(KpiPipeline::new(&config).is_err());

        let mut config = KpiConfig::default();
        config.sla_seconds = 0;
        assert!(KpiPipeline::new(&config).is_err());
    }

    #[test]
    fn test_empty_run() {
        let pipeline = KpiPipeline::new(&KpiConfig::default()).unwrap();
        let run = pipeline.run(Vec::new());
        assert_eq!(run.stats, PipelineStats::default());
        assert_eq!(run.report.total_orders, 0);
    }
}
