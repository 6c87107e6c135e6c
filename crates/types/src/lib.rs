//! Core types and data models for the delivery KPI analytics engine
//!
//! This crate provides the fundamental data structures shared by the
//! loader, processor, generator, and CLI crates: raw ingestion records,
//! canonical lifecycle events, per-order timelines, derived order metrics,
//! and the final KPI report.

pub mod events;
pub mod metrics;
pub mod report;
pub mod stages;
pub mod timeline;

pub use events::{Dimensions, Event, EventType, RawRecord};
pub use metrics::OrderMetrics;
pub use report::{BottleneckEntry, GroupKpi, KpiReport};
pub use stages::{StageSegment, StageTable};
pub use timeline::Timeline;
