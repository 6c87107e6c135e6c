//! The final KPI report

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One entry of the bottleneck ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BottleneckEntry {
    /// Segment code
    pub segment: String,
    /// Share of completed orders that voted this segment their slowest,
    /// rounded to two decimals
    pub ratio: f64,
}

/// Per-group KPI breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupKpi {
    /// Completed orders in this group
    pub completed_orders: u64,
    /// Mean total lead time in seconds, rounded to the nearest integer
    pub average_lead_time: Option<i64>,
}

/// Aggregated KPI report over one dataset
///
/// Serializes with the external camelCase field names. Group keys are
/// held in a `BTreeMap` so repeated runs over identical input produce a
/// byte-identical document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiReport {
    /// All orders seen, completed or not
    pub total_orders: u64,
    /// Orders with a present total lead time
    pub completed_orders: u64,
    /// Mean total lead time over completed orders, rounded to the
    /// nearest second; absent when nothing completed
    pub average_lead_time: Option<i64>,
    /// Fraction of completed orders over the SLA threshold, two decimals
    pub delayed_order_rate: f64,
    /// At most three segments, ranked by bottleneck votes
    pub bottleneck_top3: Vec<BottleneckEntry>,
    /// Group value to per-group KPIs
    pub by_group: BTreeMap<String, GroupKpi>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_serializes_with_external_field_names() {
        let report = KpiReport {
            total_orders: 2,
            completed_orders: 1,
            average_lead_time: Some(1800),
            delayed_order_rate: 0.0,
            bottleneck_top3: vec![BottleneckEntry {
                segment: "S1".to_string(),
                ratio: 1.0,
            }],
            by_group: BTreeMap::from([(
                "SEOUL_MAPO".to_string(),
                GroupKpi {
                    completed_orders: 1,
                    average_lead_time: Some(1800),
                },
            )]),
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["totalOrders"], 2);
        assert_eq!(json["completedOrders"], 1);
        assert_eq!(json["averageLeadTime"], 1800);
        assert_eq!(json["delayedOrderRate"], 0.0);
        assert_eq!(json["bottleneckTop3"][0]["segment"], "S1");
        assert_eq!(json["byGroup"]["SEOUL_MAPO"]["completedOrders"], 1);
    }

    #[test]
    fn test_absent_average_serializes_as_null() {
        let report = KpiReport {
            total_orders: 1,
            completed_orders: 0,
            average_lead_time: None,
            delayed_order_rate: 0.0,
            bottleneck_top3: Vec::new(),
            by_group: BTreeMap::new(),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["averageLeadTime"].is_null());
    }
}
