//! Per-order event timelines

use crate::events::{Dimensions, Event, EventType};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// All events of one order, deduplicated and in chronological order
///
/// Invariants (upheld by the timeline builder, assumed here):
/// - events are deduplicated by event id,
/// - events are sorted non-decreasing by timestamp,
/// - the type index resolves each type to its earliest event.
#[derive(Debug, Clone)]
pub struct Timeline {
    order_id: String,
    events: Vec<Event>,
    index: HashMap<EventType, usize>,
}

impl Timeline {
    /// Build a timeline from events that are already deduplicated and
    /// sorted. When several events share a type, the index keeps the
    /// first (earliest) one.
    pub fn new(order_id: impl Into<String>, events: Vec<Event>) -> Self {
        let mut index = HashMap::with_capacity(events.len());
        for (position, event) in events.iter().enumerate() {
            index.entry(event.event_type).or_insert(position);
        }
        Self {
            order_id: order_id.into(),
            events,
            index,
        }
    }

    /// Order this timeline belongs to
    pub fn order_id(&self) -> &str {
        &self.order_id
    }

    /// Events in chronological order
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Earliest event of the given type, if the order ever reached it
    pub fn first_of(&self, event_type: EventType) -> Option<&Event> {
        self.index.get(&event_type).map(|&position| &self.events[position])
    }

    /// Timestamp of the earliest event of the given type
    pub fn time_of(&self, event_type: EventType) -> Option<DateTime<Utc>> {
        self.first_of(event_type).map(|event| event.timestamp)
    }

    /// Canonical dimensions for the order: the earliest event's, never
    /// merged with or overridden by later events
    pub fn dimensions(&self) -> Option<&Dimensions> {
        self.events.first().map(|event| &event.dimensions)
    }

    /// Number of events on this timeline
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the timeline holds no events
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event(id: &str, event_type: EventType, minute: u32) -> Event {
        Event {
            id: id.to_string(),
            order_id: "O1".to_string(),
            event_type,
            timestamp: Utc.with_ymd_and_hms(2025, 1, 5, 12, minute, 0).unwrap(),
            dimensions: Dimensions {
                region: Some(format!("R{minute}")),
                ..Dimensions::default()
            },
        }
    }

    #[test]
    fn test_index_resolves_earliest_of_each_type() {
        let timeline = Timeline::new(
            "O1",
            vec![
                event("e1", EventType::OrderCreated, 0),
                event("e2", EventType::PickedUp, 10),
                event("e3", EventType::PickedUp, 20),
            ],
        );
        assert_eq!(timeline.first_of(EventType::PickedUp).unwrap().id, "e2");
        assert_eq!(timeline.time_of(EventType::Delivered), None);
    }

    #[test]
    fn test_dimensions_come_from_earliest_event() {
        let timeline = Timeline::new(
            "O1",
            vec![
                event("e1", EventType::OrderCreated, 3),
                event("e2", EventType::Delivered, 40),
            ],
        );
        assert_eq!(timeline.dimensions().unwrap().region.as_deref(), Some("R3"));
    }

    #[test]
    fn test_empty_timeline() {
        let timeline = Timeline::new("O1", Vec::new());
        assert!(timeline.is_empty());
        assert!(timeline.dimensions().is_none());
    }
}
