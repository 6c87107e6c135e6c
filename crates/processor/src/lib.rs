//! Analytic pipeline for delivery order KPIs
//!
//! The pipeline is a single synchronous pass over fully materialized
//! collections, with one pure stage per module:
//!
//! - [`normalizer`]: raw records in, canonical events out; malformed
//!   records are dropped and counted, never raised.
//! - [`timeline`]: events grouped per order, deduplicated, sorted, and
//!   indexed by event type.
//! - [`leadtime`]: fixed-stage segment durations and total lead time per
//!   timeline, with negative anomalies collapsed to absence.
//! - [`aggregate`]: cross-order reduction into the final [`KpiReport`].
//!
//! [`core::KpiPipeline`] wires the stages together from a [`KpiConfig`];
//! constructing it is the only fallible step, since a bad stage table or
//! group key is a deployment mistake rather than noisy data.
//!
//! [`KpiReport`]: delivery_kpi_types::KpiReport
//! [`KpiConfig`]: delivery_kpi_config::KpiConfig

pub mod aggregate;
pub mod core;
pub mod error;
pub mod leadtime;
pub mod normalizer;
pub mod timeline;

pub use aggregate::{KpiAccumulator, KpiAggregator};
pub use crate::core::{KpiPipeline, PipelineRun, PipelineStats};
pub use error::{ProcessorError, Result};
pub use leadtime::LeadTimeCalculator;
pub use normalizer::{normalize, normalize_all, NormalizerStats};
pub use timeline::build_timelines;
