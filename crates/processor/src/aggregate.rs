//! Cross-order KPI aggregation
//!
//! The reduction runs through an accumulator whose `merge` is commutative
//! and associative, so partial tallies from independent shards can be
//! combined in any order before finalizing. The single-threaded path is
//! just "absorb everything, then finalize".

use crate::error::{ProcessorError, Result};
use delivery_kpi_types::{BottleneckEntry, GroupKpi, KpiReport, OrderMetrics, StageTable};
use std::collections::BTreeMap;

/// How many segments the bottleneck ranking reports
const BOTTLENECK_TOP_N: usize = 3;

/// Reduces per-order metrics into the final KPI report
#[derive(Debug, Clone)]
pub struct KpiAggregator {
    sla_seconds: i64,
    group_key: String,
    /// Segment codes in declared stage-table order; ties in the
    /// bottleneck vote and ranking resolve to the first listed
    segment_order: Vec<String>,
}

impl KpiAggregator {
    /// Build an aggregator from the SLA threshold, the group key, and
    /// the stage table whose declared order breaks bottleneck ties.
    pub fn new(sla_seconds: u64, group_key: impl Into<String>, table: &StageTable) -> Result<Self> {
        let group_key = group_key.into();
        if sla_seconds == 0 {
            return Err(ProcessorError::Configuration(
                "sla_seconds must be greater than zero".to_string(),
            ));
        }
        if group_key.trim().is_empty() {
            return Err(ProcessorError::Configuration(
                "group_key must not be empty".to_string(),
            ));
        }
        Ok(Self {
            sla_seconds: sla_seconds as i64,
            group_key,
            segment_order: table.codes().map(String::from).collect(),
        })
    }

    /// Reduce the full metrics collection into a report.
    pub fn aggregate(&self, metrics: &[OrderMetrics]) -> KpiReport {
        let mut accumulator = KpiAccumulator::default();
        for order in metrics {
            self.absorb(&mut accumulator, order);
        }
        self.finalize(accumulator)
    }

    /// Fold one order into an accumulator.
    pub fn absorb(&self, accumulator: &mut KpiAccumulator, order: &OrderMetrics) {
        accumulator.total_orders += 1;

        let Some(total) = order.total_lead_time else {
            return;
        };

        accumulator.completed_orders += 1;
        accumulator.lead_time_sum += total;
        if total > self.sla_seconds {
            accumulator.delayed_orders += 1;
        }

        // One bottleneck vote per completed order: the segment with the
        // largest present duration, first-listed segment winning ties.
        let mut winner: Option<(&str, i64)> = None;
        for code in &self.segment_order {
            if let Some(duration) = order.segment(code) {
                if winner.map_or(true, |(_, best)| duration > best) {
                    winner = Some((code.as_str(), duration));
                }
            }
        }
        if let Some((code, _)) = winner {
            *accumulator.votes.entry(code.to_string()).or_insert(0) += 1;
        }

        let bucket = order
            .dimensions
            .get(&self.group_key)
            .unwrap_or_else(|| "UNKNOWN".to_string());
        let group = accumulator.groups.entry(bucket).or_default();
        group.completed_orders += 1;
        group.lead_time_sum += total;
    }

    /// Turn an accumulator into the report.
    pub fn finalize(&self, accumulator: KpiAccumulator) -> KpiReport {
        let completed = accumulator.completed_orders;

        let average_lead_time = if completed == 0 {
            None
        } else {
            Some(rounded_mean(accumulator.lead_time_sum, completed))
        };

        let delayed_order_rate = if completed == 0 {
            0.0
        } else {
            round2(accumulator.delayed_orders as f64 / completed as f64)
        };

        // Rank by votes descending; the sort is stable over the declared
        // segment order, so vote ties keep the first-listed segment first.
        let mut ranked: Vec<(&str, u64)> = self
            .segment_order
            .iter()
            .filter_map(|code| {
                accumulator
                    .votes
                    .get(code.as_str())
                    .map(|&votes| (code.as_str(), votes))
            })
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));

        let bottleneck_top3 = ranked
            .into_iter()
            .take(BOTTLENECK_TOP_N)
            .map(|(segment, votes)| BottleneckEntry {
                segment: segment.to_string(),
                ratio: if completed == 0 {
                    0.0
                } else {
                    round2(votes as f64 / completed as f64)
                },
            })
            .collect();

        let by_group = accumulator
            .groups
            .into_iter()
            .map(|(bucket, group)| {
                let kpi = GroupKpi {
                    completed_orders: group.completed_orders,
                    average_lead_time: if group.completed_orders == 0 {
                        None
                    } else {
                        Some(rounded_mean(group.lead_time_sum, group.completed_orders))
                    },
                };
                (bucket, kpi)
            })
            .collect();

        KpiReport {
            total_orders: accumulator.total_orders,
            completed_orders: completed,
            average_lead_time,
            delayed_order_rate,
            bottleneck_top3,
            by_group,
        }
    }
}

/// Partial aggregation state
///
/// Vote-tally sums and group-bucket unions are commutative and
/// associative, so accumulators built over disjoint shards merge in any
/// order to the same result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KpiAccumulator {
    total_orders: u64,
    completed_orders: u64,
    lead_time_sum: i64,
    delayed_orders: u64,
    votes: BTreeMap<String, u64>,
    groups: BTreeMap<String, GroupAccumulator>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct GroupAccumulator {
    completed_orders: u64,
    lead_time_sum: i64,
}

impl KpiAccumulator {
    /// Combine another shard's partial state into this one.
    pub fn merge(&mut self, other: KpiAccumulator) {
        self.total_orders += other.total_orders;
        self.completed_orders += other.completed_orders;
        self.lead_time_sum += other.lead_time_sum;
        self.delayed_orders += other.delayed_orders;
        for (code, votes) in other.votes {
            *self.votes.entry(code).or_insert(0) += votes;
        }
        for (bucket, group) in other.groups {
            let entry = self.groups.entry(bucket).or_default();
            entry.completed_orders += group.completed_orders;
            entry.lead_time_sum += group.lead_time_sum;
        }
    }
}

fn rounded_mean(sum: i64, count: u64) -> i64 {
    (sum as f64 / count as f64).round() as i64
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
