//! CSV event logs
//!
//! Rows are mapped onto `RawRecord` by header name. Empty cells become
//! `None` so the normalizer sees "missing" rather than an empty string,
//! and unrecognized headers are carried in the extension map.

use crate::Result;
use delivery_kpi_types::RawRecord;
use std::path::Path;
use tracing::debug;

/// Read a CSV event log from disk.
pub async fn load_csv(path: impl AsRef<Path>) -> Result<Vec<RawRecord>> {
    let text = tokio::fs::read_to_string(path.as_ref()).await?;
    let records = parse_csv(&text)?;
    debug!(
        path = %path.as_ref().display(),
        records = records.len(),
        "loaded CSV event log"
    );
    Ok(records)
}

/// Parse CSV text with a header row.
pub fn parse_csv(text: &str) -> Result<Vec<RawRecord>> {
    let mut reader = csv::Reader::from_reader(text.as_bytes());
    let headers = reader.headers()?.clone();

    let mut records = Vec::new();
    for row in reader.records() {
        records.push(record_from_row(&headers, &row?));
    }
    Ok(records)
}

fn record_from_row(headers: &csv::StringRecord, row: &csv::StringRecord) -> RawRecord {
    let mut record = RawRecord::default();

    for (header, cell) in headers.iter().zip(row.iter()) {
        let value = cell.trim();
        if value.is_empty() {
            continue;
        }
        match header {
            "event_id" => record.event_id = Some(value.to_string()),
            "order_id" => record.order_id = Some(value.to_string()),
            "event_type" => record.event_type = Some(value.to_string()),
            "event_time" => record.event_time = Some(value.to_string()),
            "user_id" => record.dimensions.user_id = Some(value.to_string()),
            "store_id" => record.dimensions.store_id = Some(value.to_string()),
            "region" => record.dimensions.region = Some(value.to_string()),
            "payment_method" => record.dimensions.payment_method = Some(value.to_string()),
            "order_amount" => record.dimensions.order_amount = value.parse().ok(),
            "delivery_fee" => record.dimensions.delivery_fee = value.parse().ok(),
            "rider_id" => record.dimensions.rider_id = Some(value.to_string()),
            "cancel_reason" => record.dimensions.cancel_reason = Some(value.to_string()),
            other => {
                record.dimensions.extra.insert(
                    other.to_string(),
                    serde_json::Value::String(value.to_string()),
                );
            }
        }
    }

    record
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_maps_known_headers() {
        let text = "event_id,event_time,event_type,order_id,region,order_amount,rider_id\n\
                    1,2025-01-05T12:00:00,ORDER_CREATED,O000001,SEOUL_MAPO,18000,\n";
        let records = parse_csv(text).unwrap();
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record.event_id.as_deref(), Some("1"));
        assert_eq!(record.order_id.as_deref(), Some("O000001"));
        assert_eq!(record.dimensions.region.as_deref(), Some("SEOUL_MAPO"));
        assert_eq!(record.dimensions.order_amount, Some(18000));
        // Empty trailing cell is missing, not an empty string.
        assert_eq!(record.dimensions.rider_id, None);
    }

    #[test]
    fn test_parse_keeps_unknown_headers_in_extra() {
        let text = "event_id,order_id,hour_bucket\n1,O1,12\n";
        let records = parse_csv(text).unwrap();
        assert_eq!(records[0].dimensions.get("hour_bucket").as_deref(), Some("12"));
    }

    #[test]
    fn test_parse_non_numeric_amount_becomes_missing() {
        let text = "event_id,order_id,order_amount\n1,O1,free\n";
        let records = parse_csv(text).unwrap();
        assert_eq!(records[0].dimensions.order_amount, None);
    }

    #[test]
    fn test_parse_header_only_file() {
        let text = "event_id,order_id\n";
        assert!(parse_csv(text).unwrap().is_empty());
    }
}
