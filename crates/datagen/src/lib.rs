//! Synthetic event log generation
//!
//! Standalone test-data collaborator: produces raw delivery order
//! records shaped like a production event log, with weighted order
//! scenarios, peak-hour effects, and optional dirty-data injection.
//! Never invoked by the runtime pipeline.
//!
//! Generation is deterministic: the RNG is seeded from the
//! configuration, and the event-id counter is owned by the generator
//! value rather than shared process-wide, so two generators with the
//! same configuration produce identical logs.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use delivery_kpi_types::RawRecord;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const REGIONS: &[&str] = &[
    "SEOUL_GANGNAM",
    "SEOUL_MAPO",
    "SEOUL_JAMSIL",
    "SEOUL_SEONGSU",
    "SEOUL_YEONGDEUNGPO",
    "SEOUL_JONGNO",
];

const PAYMENT_METHODS: &[(&str, u32)] = &[
    ("CARD", 45),
    ("KAKAO_PAY", 30),
    ("NAVER_PAY", 20),
    ("CASH", 5),
];

const DELIVERY_FEES: &[(i64, u32)] = &[
    (0, 5),
    (1000, 10),
    (2000, 30),
    (3000, 35),
    (4000, 15),
    (5000, 5),
];

/// Generator settings
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Number of orders to generate events for
    pub orders: u32,
    /// First calendar day orders may be created on
    pub start_date: NaiveDate,
    /// Last calendar day orders may be created on
    pub end_date: NaiveDate,
    /// Fraction of orders that receive one dirty mutation, clamped to 0..=0.2
    pub dirty_ratio: f64,
    /// RNG seed; identical configurations yield identical logs
    pub seed: u64,
    /// Size of the store id pool
    pub store_count: u32,
    /// Size of the user id pool
    pub user_count: u32,
    /// Size of the rider id pool
    pub rider_count: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            orders: 200,
            start_date: date(2025, 1, 1),
            end_date: date(2025, 1, 31),
            dirty_ratio: 0.0,
            seed: 12345,
            store_count: 120,
            user_count: 1500,
            rider_count: 200,
        }
    }
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid calendar date")
}

/// Which path an order takes through the funnel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scenario {
    Completed,
    Cancelled,
    InProgress,
}

/// Where in the funnel a cancelled order stops
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CancelStage {
    PrePayment,
    PostPaymentPreAccept,
    PostAccept,
}

/// Dirty mutations applied to at most one aspect of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DirtyMutation {
    DropPayment,
    MissingRider,
    TimeInvert,
}

/// Shared per-order fields stamped onto every row
#[derive(Debug, Clone)]
struct OrderMeta {
    order_id: String,
    user_id: String,
    store_id: String,
    region: &'static str,
    payment_method: &'static str,
    order_amount: i64,
    delivery_fee: i64,
}

/// One event row before rendering, with a typed timestamp so dirty
/// mutations can still shift it
#[derive(Debug, Clone)]
struct Row {
    event_id: u64,
    time: NaiveDateTime,
    event_type: &'static str,
    meta: OrderMeta,
    rider_id: Option<String>,
    cancel_reason: Option<&'static str>,
}

/// Deterministic synthetic event log generator
#[derive(Debug)]
pub struct EventLogGenerator {
    config: GeneratorConfig,
    rng: StdRng,
    next_event_id: u64,
}

impl EventLogGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            config,
            rng,
            next_event_id: 1,
        }
    }

    /// Generate the full log, sorted by event time like a real capture.
    pub fn generate(&mut self) -> Vec<RawRecord> {
        let mut rows = Vec::new();
        let dirty_ratio = self.config.dirty_ratio.clamp(0.0, 0.2);

        for index in 0..self.config.orders {
            let mut order_rows = self.order_rows(index);
            if dirty_ratio > 0.0 && self.rng.gen_bool(dirty_ratio) {
                self.apply_dirty_mutation(&mut order_rows);
            }
            rows.extend(order_rows);
        }

        rows.sort_by_key(|row| row.time);
        rows.into_iter().map(render).collect()
    }

    fn order_rows(&mut self, index: u32) -> Vec<Row> {
        let mut meta = self.order_meta(index);
        let created = self.random_instant();
        let peak = is_peak(created);
        meta.delivery_fee = self.delivery_fee(peak);

        let mut rows = vec![self.row(&meta, "ORDER_CREATED", created, None, None)];

        match self.scenario() {
            Scenario::Completed => self.completed_rows(&meta, created, peak, &mut rows),
            Scenario::Cancelled => self.cancelled_rows(&meta, created, peak, &mut rows),
            Scenario::InProgress => self.in_progress_rows(&meta, created, peak, &mut rows),
        }

        rows
    }

    fn completed_rows(
        &mut self,
        meta: &OrderMeta,
        created: NaiveDateTime,
        peak: bool,
        rows: &mut Vec<Row>,
    ) {
        let paid = created + self.minutes(0, 2);
        let accepted = paid + if peak { self.minutes(3, 15) } else { self.minutes(1, 8) };
        let cooking = accepted + self.minutes(1, 3);
        let cooked = cooking + if peak { self.minutes(10, 20) } else { self.minutes(6, 15) };
        let assigned = cooked + self.minutes(1, 5);
        let picked_up = assigned + if peak { self.minutes(8, 25) } else { self.minutes(5, 20) };
        let delivered = picked_up + if peak { self.minutes(15, 45) } else { self.minutes(10, 35) };

        let rider = self.rider_id();
        rows.push(self.row(meta, "PAYMENT_COMPLETED", paid, None, None));
        rows.push(self.row(meta, "STORE_ACCEPTED", accepted, None, None));
        rows.push(self.row(meta, "COOKING_STARTED", cooking, None, None));
        rows.push(self.row(meta, "COOKING_FINISHED", cooked, None, None));
        rows.push(self.row(meta, "RIDER_ASSIGNED", assigned, Some(rider.clone()), None));
        rows.push(self.row(meta, "PICKED_UP", picked_up, Some(rider.clone()), None));
        rows.push(self.row(meta, "DELIVERED", delivered, Some(rider), None));
    }

    fn cancelled_rows(
        &mut self,
        meta: &OrderMeta,
        created: NaiveDateTime,
        peak: bool,
        rows: &mut Vec<Row>,
    ) {
        let stage = pick_weighted(
            &mut self.rng,
            &[
                (CancelStage::PrePayment, 15),
                (CancelStage::PostPaymentPreAccept, 35),
                (CancelStage::PostAccept, 50),
            ],
        );
        let reason = self.cancel_reason(stage, peak);

        match stage {
            CancelStage::PrePayment => {
                let cancelled = created + self.minutes(1, 10);
                rows.push(self.row(meta, "ORDER_CANCELLED", cancelled, None, Some(reason)));
            }
            CancelStage::PostPaymentPreAccept => {
                let paid = created + self.minutes(0, 2);
                let cancelled = paid + self.minutes(1, 12);
                rows.push(self.row(meta, "PAYMENT_COMPLETED", paid, None, None));
                rows.push(self.row(meta, "ORDER_CANCELLED", cancelled, None, Some(reason)));
            }
            CancelStage::PostAccept => {
                let paid = created + self.minutes(0, 2);
                let accepted =
                    paid + if peak { self.minutes(3, 15) } else { self.minutes(1, 8) };
                rows.push(self.row(meta, "PAYMENT_COMPLETED", paid, None, None));
                rows.push(self.row(meta, "STORE_ACCEPTED", accepted, None, None));

                // Riders are rarely found for NO_RIDER_AVAILABLE orders.
                let assign_chance = if reason == "NO_RIDER_AVAILABLE" { 0.2 } else { 0.7 };
                let mut rider = None;
                let mut last = accepted;
                if self.rng.gen_bool(assign_chance) {
                    let assigned =
                        accepted + if peak { self.minutes(5, 20) } else { self.minutes(1, 10) };
                    let id = self.rider_id();
                    rows.push(self.row(meta, "RIDER_ASSIGNED", assigned, Some(id.clone()), None));
                    rider = Some(id);
                    last = assigned;
                }

                let cancelled = last + self.minutes(2, if peak { 25 } else { 18 });
                rows.push(self.row(meta, "ORDER_CANCELLED", cancelled, rider, Some(reason)));
            }
        }
    }

    fn in_progress_rows(
        &mut self,
        meta: &OrderMeta,
        created: NaiveDateTime,
        peak: bool,
        rows: &mut Vec<Row>,
    ) {
        let paid = created + self.minutes(0, 2);
        rows.push(self.row(meta, "PAYMENT_COMPLETED", paid, None, None));

        if !self.rng.gen_bool(0.75) {
            return;
        }
        let accepted = paid + if peak { self.minutes(3, 15) } else { self.minutes(1, 8) };
        rows.push(self.row(meta, "STORE_ACCEPTED", accepted, None, None));

        if !self.rng.gen_bool(0.55) {
            return;
        }
        let cooking = accepted + self.minutes(1, 3);
        let cooked = cooking + if peak { self.minutes(10, 20) } else { self.minutes(6, 15) };
        let assigned = cooked + self.minutes(1, 5);
        let rider = self.rider_id();
        rows.push(self.row(meta, "COOKING_STARTED", cooking, None, None));
        rows.push(self.row(meta, "COOKING_FINISHED", cooked, None, None));
        rows.push(self.row(meta, "RIDER_ASSIGNED", assigned, Some(rider.clone()), None));

        if self.rng.gen_bool(0.25) {
            let picked_up =
                assigned + if peak { self.minutes(8, 25) } else { self.minutes(5, 20) };
            rows.push(self.row(meta, "PICKED_UP", picked_up, Some(rider), None));
        }
    }

    fn apply_dirty_mutation(&mut self, rows: &mut Vec<Row>) {
        let mutation = pick_weighted(
            &mut self.rng,
            &[
                (DirtyMutation::DropPayment, 40),
                (DirtyMutation::MissingRider, 35),
                (DirtyMutation::TimeInvert, 25),
            ],
        );

        match mutation {
            DirtyMutation::DropPayment => {
                if let Some(position) =
                    rows.iter().position(|row| row.event_type == "PAYMENT_COMPLETED")
                {
                    rows.remove(position);
                }
            }
            DirtyMutation::MissingRider => {
                if let Some(row) =
                    rows.iter_mut().find(|row| row.event_type == "RIDER_ASSIGNED")
                {
                    row.rider_id = None;
                }
            }
            DirtyMutation::TimeInvert => {
                if rows.len() < 2 {
                    return;
                }
                let position = self.rng.gen_range(1..rows.len());
                let back = self.rng.gen_range(30..=60);
                rows[position].time -= Duration::seconds(back);
            }
        }
    }

    fn row(
        &mut self,
        meta: &OrderMeta,
        event_type: &'static str,
        time: NaiveDateTime,
        rider_id: Option<String>,
        cancel_reason: Option<&'static str>,
    ) -> Row {
        let event_id = self.next_event_id;
        self.next_event_id += 1;
        Row {
            event_id,
            time,
            event_type,
            meta: meta.clone(),
            rider_id,
            cancel_reason,
        }
    }

    fn order_meta(&mut self, index: u32) -> OrderMeta {
        let order_id = format!("O{:06}", index + 1);
        let user_id = format!("U{:04}", self.rng.gen_range(1..=self.config.user_count));
        let store_id = format!("S{:03}", self.rng.gen_range(1..=self.config.store_count));
        let region = REGIONS[self.rng.gen_range(0..REGIONS.len())];
        let payment_method = pick_weighted(&mut self.rng, PAYMENT_METHODS);
        OrderMeta {
            order_id,
            user_id,
            store_id,
            region,
            payment_method,
            order_amount: self.order_amount(),
            // The fee depends on peak hours, which the caller knows once
            // the creation instant is drawn.
            delivery_fee: 0,
        }
    }

    fn order_amount(&mut self) -> i64 {
        // Average of two uniforms gives a rough bell around 22k.
        let x = (self.rng.gen::<f64>() + self.rng.gen::<f64>()) / 2.0;
        let raw = 9000.0 + x * (45000.0 - 9000.0);
        let rounded = ((raw / 1000.0).round() as i64) * 1000;
        rounded.clamp(9000, 45000)
    }

    fn delivery_fee(&mut self, peak: bool) -> i64 {
        let base = pick_weighted(&mut self.rng, DELIVERY_FEES);
        if !peak {
            return base;
        }
        if base == 0 && self.rng.gen_bool(0.6) {
            return 1000;
        }
        if base <= 2000 && self.rng.gen_bool(0.5) {
            return base + 1000;
        }
        if base == 3000 && self.rng.gen_bool(0.3) {
            return 4000;
        }
        base
    }

    fn cancel_reason(&mut self, stage: CancelStage, peak: bool) -> &'static str {
        match stage {
            CancelStage::PrePayment => "USER_CHANGED_MIND",
            CancelStage::PostPaymentPreAccept => pick_weighted(
                &mut self.rng,
                &[("USER_CHANGED_MIND", 60), ("PAYMENT_FAILED", 40)],
            ),
            CancelStage::PostAccept => {
                let boost = if peak { 10 } else { 0 };
                pick_weighted(
                    &mut self.rng,
                    &[
                        ("NO_RIDER_AVAILABLE", 40 + boost),
                        ("LATE_DELIVERY", 30 + boost),
                        ("STORE_REJECTED", 30),
                    ],
                )
            }
        }
    }

    fn rider_id(&mut self) -> String {
        format!("R{:03}", self.rng.gen_range(1..=self.config.rider_count))
    }

    fn random_instant(&mut self) -> NaiveDateTime {
        let start = self
            .config
            .start_date
            .and_hms_opt(0, 0, 0)
            .expect("valid time of day");
        let end = self
            .config
            .end_date
            .and_hms_opt(23, 59, 59)
            .expect("valid time of day");
        let span = (end - start).num_seconds().max(1);
        start + Duration::seconds(self.rng.gen_range(0..span))
    }

    fn minutes(&mut self, low: i64, high: i64) -> Duration {
        Duration::minutes(self.rng.gen_range(low..=high))
    }

    fn scenario(&mut self) -> Scenario {
        pick_weighted(
            &mut self.rng,
            &[
                (Scenario::Completed, 70),
                (Scenario::Cancelled, 20),
                (Scenario::InProgress, 10),
            ],
        )
    }
}

fn is_peak(instant: NaiveDateTime) -> bool {
    use chrono::Timelike;
    let minutes = instant.hour() * 60 + instant.minute();
    (690..=810).contains(&minutes) || (1080..=1230).contains(&minutes)
}

fn pick_weighted<T: Copy>(rng: &mut StdRng, items: &[(T, u32)]) -> T {
    let total: u32 = items.iter().map(|(_, weight)| weight).sum();
    let mut roll = rng.gen_range(0..total);
    for (value, weight) in items {
        if roll < *weight {
            return *value;
        }
        roll -= weight;
    }
    items[items.len() - 1].0
}

fn render(row: Row) -> RawRecord {
    let mut record = RawRecord {
        event_id: Some(row.event_id.to_string()),
        order_id: Some(row.meta.order_id.clone()),
        event_type: Some(row.event_type.to_string()),
        event_time: Some(row.time.format("%Y-%m-%dT%H:%M:%S").to_string()),
        ..RawRecord::default()
    };
    record.dimensions.user_id = Some(row.meta.user_id);
    record.dimensions.store_id = Some(row.meta.store_id);
    record.dimensions.region = Some(row.meta.region.to_string());
    record.dimensions.payment_method = Some(row.meta.payment_method.to_string());
    record.dimensions.order_amount = Some(row.meta.order_amount);
    record.dimensions.delivery_fee = Some(row.meta.delivery_fee);
    record.dimensions.rider_id = row.rider_id;
    record.dimensions.cancel_reason = row.cancel_reason.map(String::from);
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn small_config(seed: u64) -> GeneratorConfig {
        GeneratorConfig {
            orders: 50,
            seed,
            ..GeneratorConfig::default()
        }
    }

    #[test]
    fn test_same_seed_same_log() {
        let a = EventLogGenerator::new(small_config(7)).generate();
        let b = EventLogGenerator::new(small_config(7)).generate();
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seed_different_log() {
        let a = EventLogGenerator::new(small_config(7)).generate();
        let b = EventLogGenerator::new(small_config(8)).generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_event_ids_are_unique() {
        let records = EventLogGenerator::new(small_config(7)).generate();
        let ids: HashSet<_> = records.iter().map(|r| r.event_id.clone().unwrap()).collect();
        assert_eq!(ids.len(), records.len());
    }

    #[test]
    fn test_every_order_starts_with_creation() {
        let records = EventLogGenerator::new(small_config(7)).generate();
        let created: HashSet<_> = records
            .iter()
            .filter(|r| r.event_type.as_deref() == Some("ORDER_CREATED"))
            .map(|r| r.order_id.clone().unwrap())
            .collect();
        let all: HashSet<_> = records.iter().map(|r| r.order_id.clone().unwrap()).collect();
        assert_eq!(created, all);
        assert_eq!(all.len(), 50);
    }

    #[test]
    fn test_log_is_sorted_by_time() {
        let records = EventLogGenerator::new(small_config(7)).generate();
        let times: Vec<_> = records.iter().map(|r| r.event_time.clone().unwrap()).collect();
        // Timestamps are ISO strings, so lexicographic order is time order.
        let mut sorted = times.clone();
        sorted.sort();
        assert_eq!(times, sorted);
    }

    #[test]
    fn test_clean_log_survives_the_pipeline() {
        use delivery_kpi_config::KpiConfig;
        use delivery_kpi_processor::KpiPipeline;

        let records = EventLogGenerator::new(small_config(7)).generate();
        let total = records.len() as u64;

        let pipeline = KpiPipeline::new(&KpiConfig::default()).unwrap();
        let run = pipeline.run(records);
        assert_eq!(run.stats.rejected_records, 0);
        assert_eq!(run.stats.events, total);
        assert_eq!(run.stats.orders, 50);
        // With 70% completed weighting, some orders must finish.
        assert!(run.report.completed_orders > 0);
        assert!(run.report.completed_orders < 50);
    }

    #[test]
    fn test_dirty_ratio_injects_anomalies() {
        let config = GeneratorConfig {
            orders: 200,
            dirty_ratio: 0.2,
            seed: 21,
            ..GeneratorConfig::default()
        };
        let clean = EventLogGenerator::new(GeneratorConfig {
            dirty_ratio: 0.0,
            ..config.clone()
        })
        .generate();
        let dirty = EventLogGenerator::new(config).generate();
        assert_ne!(clean, dirty);
    }
}
