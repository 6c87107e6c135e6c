//! Lifecycle event types for delivery orders

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Canonical order lifecycle event names
///
/// The set is closed: a raw record whose type does not canonicalize into
/// one of these names cannot be indexed into a timeline and is rejected
/// during normalization.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    /// Order placed by the customer
    OrderCreated,
    /// Payment captured
    PaymentCompleted,
    /// Store confirmed the order
    StoreAccepted,
    /// Kitchen started preparing
    CookingStarted,
    /// Kitchen finished preparing
    CookingFinished,
    /// Rider matched to the order
    RiderAssigned,
    /// Rider collected the order from the store
    PickedUp,
    /// Order handed to the customer
    #[serde(alias = "DELIVERY_COMPLETED")]
    Delivered,
    /// Order cancelled at any stage
    OrderCancelled,
}

impl EventType {
    /// Canonical uppercase name of this event type
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::OrderCreated => "ORDER_CREATED",
            EventType::PaymentCompleted => "PAYMENT_COMPLETED",
            EventType::StoreAccepted => "STORE_ACCEPTED",
            EventType::CookingStarted => "COOKING_STARTED",
            EventType::CookingFinished => "COOKING_FINISHED",
            EventType::RiderAssigned => "RIDER_ASSIGNED",
            EventType::PickedUp => "PICKED_UP",
            EventType::Delivered => "DELIVERED",
            EventType::OrderCancelled => "ORDER_CANCELLED",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = UnknownEventType;

    /// Case-insensitive parse of a lifecycle event name.
    ///
    /// `DELIVERY_COMPLETED` is accepted as a legacy alias of `DELIVERED`;
    /// older event logs use that name for the terminal event.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ORDER_CREATED" => Ok(EventType::OrderCreated),
            "PAYMENT_COMPLETED" => Ok(EventType::PaymentCompleted),
            "STORE_ACCEPTED" => Ok(EventType::StoreAccepted),
            "COOKING_STARTED" => Ok(EventType::CookingStarted),
            "COOKING_FINISHED" => Ok(EventType::CookingFinished),
            "RIDER_ASSIGNED" => Ok(EventType::RiderAssigned),
            "PICKED_UP" => Ok(EventType::PickedUp),
            "DELIVERED" | "DELIVERY_COMPLETED" => Ok(EventType::Delivered),
            "ORDER_CANCELLED" => Ok(EventType::OrderCancelled),
            other => Err(UnknownEventType(other.to_string())),
        }
    }
}

/// Error returned when a string is not a recognized lifecycle event name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEventType(pub String);

impl fmt::Display for UnknownEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown event type: {}", self.0)
    }
}

impl std::error::Error for UnknownEventType {}

/// Pass-through dimension fields carried on every event
///
/// The known delivery dimensions are typed; anything else the ingestion
/// boundary hands us lands in `extra` untouched. Values here are never
/// validated or merged across events, only carried.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64", skip_serializing_if = "Option::is_none")]
    pub order_amount: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64", skip_serializing_if = "Option::is_none")]
    pub delivery_fee: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rider_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel_reason: Option<String>,
    /// Unanticipated dimension fields, kept for configurable grouping
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Dimensions {
    /// Look up a dimension by field name.
    ///
    /// Empty strings count as missing; the aggregator maps missing group
    /// values to the `"UNKNOWN"` bucket.
    pub fn get(&self, key: &str) -> Option<String> {
        let typed = match key {
            "user_id" => self.user_id.clone(),
            "store_id" => self.store_id.clone(),
            "region" => self.region.clone(),
            "payment_method" => self.payment_method.clone(),
            "order_amount" => self.order_amount.map(|v| v.to_string()),
            "delivery_fee" => self.delivery_fee.map(|v| v.to_string()),
            "rider_id" => self.rider_id.clone(),
            "cancel_reason" => self.cancel_reason.clone(),
            other => self.extra.get(other).and_then(value_to_string),
        };
        typed.filter(|v| !v.is_empty())
    }
}

fn value_to_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// One record as it arrives from the ingestion boundary
///
/// Everything is optional: structural validation happens in the
/// normalizer, not here. Field names match the wire format of the event
/// log files (`event_id`, `order_id`, `event_type`, `event_time`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub event_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub order_id: Option<String>,
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub event_time: Option<String>,
    #[serde(flatten)]
    pub dimensions: Dimensions,
}

/// A validated, canonical lifecycle event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event identifier, unique within a dataset after dedup
    pub id: String,
    /// Order this event belongs to
    pub order_id: String,
    /// Canonical lifecycle event type
    pub event_type: EventType,
    /// Absolute instant the event occurred
    pub timestamp: DateTime<Utc>,
    /// Dimension fields carried unchanged from the raw record
    pub dimensions: Dimensions,
}

/// Accept a JSON string or number where a string id is expected.
///
/// Event logs written by older tooling carry numeric `event_id` values.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_to_string))
}

/// Accept a JSON number or numeric string for monetary amounts.
fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_i64(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}
