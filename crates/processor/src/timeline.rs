//! Timeline construction: group, dedup, sort, index

use delivery_kpi_types::{Event, Timeline};
use std::collections::{BTreeMap, HashSet};

/// Group events by order and build one timeline per order.
///
/// Dedup keeps the first event encountered in input order for each event
/// id, never the one with the later timestamp. The sort is stable
/// ascending by timestamp, so events sharing an instant keep their input
/// order. Timelines come back sorted by order id so downstream output is
/// deterministic. Empty input yields an empty vec.
pub fn build_timelines(events: Vec<Event>) -> Vec<Timeline> {
    let mut grouped: BTreeMap<String, Vec<Event>> = BTreeMap::new();
    for event in events {
        grouped.entry(event.order_id.clone()).or_default().push(event);
    }

    grouped
        .into_iter()
        .map(|(order_id, group)| {
            let mut seen = HashSet::with_capacity(group.len());
            let mut deduped: Vec<Event> = group
                .into_iter()
                .filter(|event| seen.insert(event.id.clone()))
                .collect();
            deduped.sort_by_key(|event| event.timestamp);
            Timeline::new(order_id, deduped)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use delivery_kpi_types::{Dimensions, EventType};

    fn event(id: &str, order: &str, event_type: EventType, minute: u32) -> Event {
        Event {
            id: id.to_string(),
            order_id: order.to_string(),
            event_type,
            timestamp: Utc.with_ymd_and_hms(2025, 1, 5, 12, minute, 0).unwrap(),
            dimensions: Dimensions::default(),
        }
    }

    #[test]
    fn test_groups_by_order() {
        let timelines = build_timelines(vec![
            event("e1", "O1", EventType::OrderCreated, 0),
            event("e2", "O2", EventType::OrderCreated, 1),
            event("e3", "O1", EventType::Delivered, 30),
        ]);
        assert_eq!(timelines.len(), 2);
        assert_eq!(timelines[0].order_id(), "O1");
        assert_eq!(timelines[0].len(), 2);
        assert_eq!(timelines[1].order_id(), "O2");
    }

    #[test]
    fn test_dedup_keeps_first_in_input_order() {
        // Same id, differing payload and timestamp: the first one wins,
        // even though the duplicate carries a later timestamp.
        let first = event("dup", "O1", EventType::OrderCreated, 0);
        let mut second = event("dup", "O1", EventType::OrderCreated, 9);
        second.dimensions.region = Some("OTHER".to_string());

        let timelines = build_timelines(vec![first.clone(), second]);
        assert_eq!(timelines[0].len(), 1);
        assert_eq!(timelines[0].events()[0], first);
    }

    #[test]
    fn test_sorts_ascending_by_timestamp() {
        let timelines = build_timelines(vec![
            event("e3", "O1", EventType::Delivered, 30),
            event("e1", "O1", EventType::OrderCreated, 0),
            event("e2", "O1", EventType::PickedUp, 15),
        ]);
        let stamps: Vec<_> = timelines[0].events().iter().map(|e| e.timestamp).collect();
        assert!(stamps.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn test_sort_is_stable_on_timestamp_ties() {
        let timelines = build_timelines(vec![
            event("a", "O1", EventType::OrderCreated, 5),
            event("b", "O1", EventType::PaymentCompleted, 5),
        ]);
        let ids: Vec<_> = timelines[0].events().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[test]
    fn test_empty_input_yields_no_timelines() {
        assert!(build_timelines(Vec::new()).is_empty());
    }
}
