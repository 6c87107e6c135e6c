//! Per-order lead-time computation over a configured stage table

use crate::error::{ProcessorError, Result};
use chrono::{DateTime, Utc};
use delivery_kpi_types::{Dimensions, OrderMetrics, StageTable, Timeline};
use std::collections::{BTreeMap, HashSet};
use tracing::warn;

/// Computes stage-segment durations and total lead time per timeline
///
/// Pure and stateless across orders; the stage table is the only
/// configuration and is passed in explicitly.
#[derive(Debug, Clone)]
pub struct LeadTimeCalculator {
    table: StageTable,
}

impl LeadTimeCalculator {
    /// Build a calculator over the given stage table.
    ///
    /// An empty table or a duplicate/empty segment code is a
    /// configuration error.
    pub fn new(table: StageTable) -> Result<Self> {
        if table.segments.is_empty() {
            return Err(ProcessorError::Configuration(
                "stage table must declare at least one segment".to_string(),
            ));
        }
        let mut codes = HashSet::new();
        for segment in &table.segments {
            if segment.code.trim().is_empty() {
                return Err(ProcessorError::Configuration(
                    "stage segment code must not be empty".to_string(),
                ));
            }
            if !codes.insert(segment.code.as_str()) {
                return Err(ProcessorError::Configuration(format!(
                    "duplicate stage segment code: {}",
                    segment.code
                )));
            }
        }
        Ok(Self { table })
    }

    /// The stage table this calculator was built over
    pub fn table(&self) -> &StageTable {
        &self.table
    }

    /// Compute metrics for every timeline, with completion derived from
    /// the total lead time alone.
    pub fn compute(&self, timelines: &[Timeline]) -> Vec<OrderMetrics> {
        self.compute_with_signal(timelines, |_| None)
    }

    /// Compute metrics, letting an upstream completion signal override
    /// the derived `is_completed` where it returns `Some`.
    pub fn compute_with_signal<F>(&self, timelines: &[Timeline], signal: F) -> Vec<OrderMetrics>
    where
        F: Fn(&Timeline) -> Option<bool>,
    {
        timelines
            .iter()
            .map(|timeline| self.metrics_for(timeline, signal(timeline)))
            .collect()
    }

    fn metrics_for(&self, timeline: &Timeline, completed_signal: Option<bool>) -> OrderMetrics {
        let mut segments = BTreeMap::new();
        for segment in &self.table.segments {
            let duration = self.span_seconds(
                timeline,
                timeline.time_of(segment.from),
                timeline.time_of(segment.to),
                &segment.code,
            );
            segments.insert(segment.code.clone(), duration);
        }

        let total_lead_time = self.span_seconds(
            timeline,
            timeline.time_of(self.table.total_from),
            timeline.time_of(self.table.total_to),
            "total",
        );

        OrderMetrics {
            order_id: timeline.order_id().to_string(),
            dimensions: timeline.dimensions().cloned().unwrap_or_else(Dimensions::default),
            segments,
            total_lead_time,
            is_completed: completed_signal.unwrap_or(total_lead_time.is_some()),
        }
    }

    /// Elapsed whole seconds between two bounds, floored.
    ///
    /// Absent when either bound is missing ("stage never reached", not
    /// "took no time") and when the elapsed time would come out negative,
    /// which marks a recording anomaly rather than a valid duration.
    fn span_seconds(
        &self,
        timeline: &Timeline,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        code: &str,
    ) -> Option<i64> {
        let (from, to) = (from?, to?);
        let seconds = to.signed_duration_since(from).num_milliseconds().div_euclid(1000);
        if seconds < 0 {
            warn!(
                order_id = timeline.order_id(),
                segment = code,
                seconds,
                "anomalous event ordering, reporting duration as absent"
            );
            return None;
        }
        Some(seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use delivery_kpi_types::{Event, EventType, StageSegment};

    fn event(id: &str, event_type: EventType, offset_secs: i64) -> Event {
        Event {
            id: id.to_string(),
            order_id: "O1".to_string(),
            event_type,
            timestamp: Utc.with_ymd_and_hms(2025, 1, 5, 12, 0, 0).unwrap()
                + chrono::Duration::seconds(offset_secs),
            dimensions: Dimensions::default(),
        }
    }

    fn timeline(events: Vec<Event>) -> Timeline {
        crate::timeline::build_timelines(events).remove(0)
    }

    fn calculator() -> LeadTimeCalculator {
        LeadTimeCalculator::new(StageTable::default()).unwrap()
    }

    #[test]
    fn test_full_funnel_durations() {
        // Scenario: created, accepted +5m, assigned +10m, picked up +15m,
        // delivered +30m.
        let tl = timeline(vec![
            event("e1", EventType::OrderCreated, 0),
            event("e2", EventType::StoreAccepted, 300),
            event("e3", EventType::RiderAssigned, 600),
            event("e4", EventType::PickedUp, 900),
            event("e5", EventType::Delivered, 1800),
        ]);
        let metrics = calculator().compute(&[tl]).remove(0);

        assert_eq!(metrics.segment("S1"), Some(300));
        assert_eq!(metrics.segment("S2"), None); // cooking never recorded
        assert_eq!(metrics.segment("S3"), None);
        assert_eq!(metrics.segment("S4"), None);
        assert_eq!(metrics.segment("S5"), Some(300));
        assert_eq!(metrics.segment("S6"), Some(900));
        assert_eq!(metrics.total_lead_time, Some(1800));
        assert!(metrics.is_completed);
    }

    #[test]
    fn test_created_only_order_is_all_absent() {
        let tl = timeline(vec![event("e1", EventType::OrderCreated, 0)]);
        let metrics = calculator().compute(&[tl]).remove(0);

        assert!(metrics.segments.values().all(Option::is_none));
        assert_eq!(metrics.total_lead_time, None);
        assert!(!metrics.is_completed);
    }

    #[test]
    fn test_negative_segment_collapses_to_absent() {
        // Pickup recorded before assignment: S5 would be negative.
        let tl = timeline(vec![
            event("e1", EventType::OrderCreated, 0),
            event("e2", EventType::RiderAssigned, 600),
            event("e3", EventType::PickedUp, 540),
        ]);
        let metrics = calculator().compute(&[tl]).remove(0);
        assert_eq!(metrics.segment("S5"), None);
    }

    #[test]
    fn test_negative_total_collapses_to_absent() {
        let tl = timeline(vec![
            event("e1", EventType::OrderCreated, 600),
            event("e2", EventType::Delivered, 0),
        ]);
        let metrics = calculator().compute(&[tl]).remove(0);
        assert_eq!(metrics.total_lead_time, None);
        assert!(!metrics.is_completed);
    }

    #[test]
    fn test_subsecond_inversion_is_absent_not_zero() {
        let base = Utc.with_ymd_and_hms(2025, 1, 5, 12, 0, 0).unwrap();
        let mut e1 = event("e1", EventType::OrderCreated, 0);
        e1.timestamp = base + chrono::Duration::milliseconds(500);
        let mut e2 = event("e2", EventType::Delivered, 0);
        e2.timestamp = base;

        let tl = timeline(vec![e1, e2]);
        let metrics = calculator().compute(&[tl]).remove(0);
        assert_eq!(metrics.total_lead_time, None);
    }

    #[test]
    fn test_zero_duration_is_present() {
        let tl = timeline(vec![
            event("e1", EventType::OrderCreated, 0),
            event("e2", EventType::Delivered, 0),
        ]);
        let metrics = calculator().compute(&[tl]).remove(0);
        assert_eq!(metrics.total_lead_time, Some(0));
        assert!(metrics.is_completed);
    }

    #[test]
    fn test_explicit_completion_signal_takes_precedence() {
        let tl = timeline(vec![event("e1", EventType::OrderCreated, 0)]);
        let metrics = calculator()
            .compute_with_signal(&[tl], |_| Some(true))
            .remove(0);
        assert_eq!(metrics.total_lead_time, None);
        assert!(metrics.is_completed);
    }

    #[test]
    fn test_duration_floors_fractional_seconds() {
        let base = Utc.with_ymd_and_hms(2025, 1, 5, 12, 0, 0).unwrap();
        let mut e1 = event("e1", EventType::OrderCreated, 0);
        e1.timestamp = base;
        let mut e2 = event("e2", EventType::Delivered, 0);
        e2.timestamp = base + chrono::Duration::milliseconds(1999);

        let tl = timeline(vec![e1, e2]);
        let metrics = calculator().compute(&[tl]).remove(0);
        assert_eq!(metrics.total_lead_time, Some(1));
    }

    #[test]
    fn test_empty_stage_table_rejected() {
        let table = StageTable {
            segments: Vec::new(),
            ..StageTable::default()
        };
        assert!(LeadTimeCalculator::new(table).is_err());
    }

    #[test]
    fn test_duplicate_segment_code_rejected() {
        let mut table = StageTable::default();
        table.segments[1] = StageSegment::new("S1", EventType::StoreAccepted, EventType::PickedUp);
        assert!(LeadTimeCalculator::new(table).is_err());
    }

    #[test]
    fn test_dimensions_carried_forward() {
        let mut created = event("e1", EventType::OrderCreated, 0);
        created.dimensions.region = Some("SEOUL_MAPO".to_string());
        let mut delivered = event("e2", EventType::Delivered, 1800);
        delivered.dimensions.region = Some("SEOUL_JONGNO".to_string());

        let tl = timeline(vec![created, delivered]);
        let metrics = calculator().compute(&[tl]).remove(0);
        // Canonical dimensions come from the earliest event only.
        assert_eq!(metrics.dimensions.region.as_deref(), Some("SEOUL_MAPO"));
    }
}
