//! Stage segment definitions for lead-time computation

use crate::events::EventType;
use serde::{Deserialize, Serialize};

/// One causal stage boundary: elapsed time from `from` to `to`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSegment {
    /// Short code the segment is reported under (e.g. "S1")
    pub code: String,
    /// Event type opening the segment
    pub from: EventType,
    /// Event type closing the segment
    pub to: EventType,
}

impl StageSegment {
    pub fn new(code: impl Into<String>, from: EventType, to: EventType) -> Self {
        Self {
            code: code.into(),
            from,
            to,
        }
    }
}

/// Ordered table of stage segments plus the total span bounds
///
/// The declared order matters: bottleneck ties are broken in favor of the
/// segment listed first. The table is always passed in explicitly so the
/// calculator and aggregator stay reusable with custom stage layouts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTable {
    /// Segments in declared order
    pub segments: Vec<StageSegment>,
    /// Event type the total lead time is measured from
    pub total_from: EventType,
    /// Event type the total lead time is measured to
    pub total_to: EventType,
}

impl StageTable {
    /// Segment codes in declared order
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(|segment| segment.code.as_str())
    }
}

impl Default for StageTable {
    /// The six-segment delivery funnel, measured end to end from order
    /// creation to delivery.
    fn default() -> Self {
        use EventType::*;
        Self {
            segments: vec![
                StageSegment::new("S1", OrderCreated, StoreAccepted),
                StageSegment::new("S2", StoreAccepted, CookingStarted),
                StageSegment::new("S3", CookingStarted, CookingFinished),
                StageSegment::new("S4", CookingFinished, RiderAssigned),
                StageSegment::new("S5", RiderAssigned, PickedUp),
                StageSegment::new("S6", PickedUp, Delivered),
            ],
            total_from: OrderCreated,
            total_to: Delivered,
        }
    }
}
