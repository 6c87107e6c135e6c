//! Derived per-order metrics

use crate::events::Dimensions;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Immutable lead-time snapshot of one order
///
/// Every segment code from the stage table is present in `segments`;
/// `None` means the stage was never reached (or the recorded ordering was
/// anomalous), which is distinct from a zero-second duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderMetrics {
    /// Order identifier
    pub order_id: String,
    /// Canonical dimensions carried forward from the timeline
    pub dimensions: Dimensions,
    /// Segment code to duration in whole seconds, or absent
    pub segments: BTreeMap<String, Option<i64>>,
    /// Seconds from the configured start type to the terminal type
    pub total_lead_time: Option<i64>,
    /// Whether the order ran the full funnel
    pub is_completed: bool,
}

impl OrderMetrics {
    /// Duration of one segment, if present
    pub fn segment(&self, code: &str) -> Option<i64> {
        self.segments.get(code).copied().flatten()
    }
}
