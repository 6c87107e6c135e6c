//! Event normalization: raw records in, canonical events out
//!
//! Rejection is silent at this layer. A record that fails validation is
//! dropped and tallied; the caller decides whether the counts matter.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use delivery_kpi_types::{Event, EventType, RawRecord};
use tracing::debug;

/// Why a raw record was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RejectReason {
    MissingField(&'static str),
    InvalidTimestamp,
    UnknownEventType,
}

/// Counters for one normalization pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizerStats {
    /// Records that became events
    pub accepted: u64,
    /// Records missing a required field (or carrying it empty)
    pub missing_field: u64,
    /// Records whose timestamp failed to parse
    pub invalid_timestamp: u64,
    /// Records whose type is not a recognized lifecycle name
    pub unknown_event_type: u64,
}

impl NormalizerStats {
    /// Total rejected records
    pub fn rejected(&self) -> u64 {
        self.missing_field + self.invalid_timestamp + self.unknown_event_type
    }
}

/// Validate and coerce one raw record into a canonical event.
///
/// Returns `None` when `event_id`, `order_id`, `event_type`, or
/// `event_time` is missing or empty, when the timestamp does not parse,
/// or when the type does not canonicalize into a recognized lifecycle
/// name. All dimension fields pass through unchanged.
pub fn normalize(record: &RawRecord) -> Option<Event> {
    normalize_inner(record).ok()
}

/// Normalize a whole batch, dropping rejects and counting them per reason.
pub fn normalize_all<I>(records: I) -> (Vec<Event>, NormalizerStats)
where
    I: IntoIterator<Item = RawRecord>,
{
    let mut events = Vec::new();
    let mut stats = NormalizerStats::default();

    for record in records {
        match normalize_inner(&record) {
            Ok(event) => {
                stats.accepted += 1;
                events.push(event);
            }
            Err(reason) => {
                let event_id = record.event_id.as_deref().unwrap_or("<none>");
                let order_id = record.order_id.as_deref().unwrap_or("<none>");
                match reason {
                    RejectReason::MissingField(field) => {
                        stats.missing_field += 1;
                        debug!(event_id, order_id, field, "rejected record: missing required field");
                    }
                    RejectReason::InvalidTimestamp => {
                        stats.invalid_timestamp += 1;
                        debug!(event_id, order_id, "rejected record: unparseable timestamp");
                    }
                    RejectReason::UnknownEventType => {
                        stats.unknown_event_type += 1;
                        debug!(event_id, order_id, "rejected record: unknown event type");
                    }
                }
            }
        }
    }

    (events, stats)
}

fn normalize_inner(record: &RawRecord) -> Result<Event, RejectReason> {
    let id = required(&record.event_id, "event_id")?;
    let order_id = required(&record.order_id, "order_id")?;
    let raw_type = required(&record.event_type, "event_type")?;
    let raw_time = required(&record.event_time, "event_time")?;

    let event_type: EventType = raw_type
        .parse()
        .map_err(|_| RejectReason::UnknownEventType)?;
    let timestamp = parse_instant(raw_time).ok_or(RejectReason::InvalidTimestamp)?;

    Ok(Event {
        id: id.to_string(),
        order_id: order_id.to_string(),
        event_type,
        timestamp,
        dimensions: record.dimensions.clone(),
    })
}

fn required<'a>(
    field: &'a Option<String>,
    name: &'static str,
) -> Result<&'a str, RejectReason> {
    match field.as_deref().map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(RejectReason::MissingField(name)),
    }
}

/// Parse an absolute instant.
///
/// RFC 3339 with an offset is preferred; naive local timestamps
/// (`YYYY-MM-DDTHH:MM:SS`, optional fraction, `T` or space) are taken as
/// UTC, matching how the event log files are written.
fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Some(instant.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    None
}
