// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use chrono::NaiveDate;
use equipment_tracker::config::Config;
use equipment_tracker::models::{
    EquipmentKind, EquipmentRecord, ItemConfig, RideRecord, SummaryConfig, TileLabels,
    UsageWindow,
};
use equipment_tracker::services::{EquipmentRegistry, RideLibrary};
use equipment_tracker::EquipmentContext;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Generous upper bound for a pass over test-sized inputs.
#[allow(dead_code)]
pub const PASS_TIMEOUT: Duration = Duration::from_secs(10);

#[allow(dead_code)]
pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
}

/// A completed ride on `day` with elevation of ten metres per kilometre.
#[allow(dead_code)]
pub fn ride(athlete: &str, tags: &str, day: NaiveDate, distance_km: f64) -> RideRecord {
    RideRecord {
        start_date: day,
        distance_km,
        elevation_gain_m: distance_km * 10.0,
        time_ridden_secs: 3600,
        equipment_tags: tags.to_string(),
        athlete: athlete.to_string(),
        planned: false,
    }
}

/// Shared ride handles, as the engine receives them.
#[allow(dead_code)]
pub fn shared(rides: Vec<RideRecord>) -> Vec<Arc<RideRecord>> {
    rides.into_iter().map(Arc::new).collect()
}

/// A standalone item with one window per tag.
#[allow(dead_code)]
pub fn item_with_windows(windows: Vec<UsageWindow>, manual_distance: f64) -> Arc<EquipmentRecord> {
    let record = EquipmentRecord::new(Uuid::new_v4(), EquipmentKind::Item, TileLabels::new("Gear", "Bike"));
    if let Some(item) = record.as_item() {
        item.update(|c: &mut ItemConfig| {
            c.windows = windows;
            c.manual_distance = manual_distance;
        });
    }
    Arc::new(record)
}

#[allow(dead_code)]
pub fn summary(tag: &str, show_per_athlete: bool) -> Arc<EquipmentRecord> {
    let record = EquipmentRecord::new(Uuid::new_v4(), EquipmentKind::Summary, TileLabels::new("Gear", "Summary"));
    if let Some(summary) = record.as_summary() {
        summary.update(|c| *c = SummaryConfig::new(tag, show_per_athlete));
    }
    Arc::new(record)
}

/// Registry-owned item bound to a fresh reference.
#[allow(dead_code)]
pub fn registry_item(registry: &EquipmentRegistry, tag: &str) -> Arc<EquipmentRecord> {
    let record = registry.create(Uuid::new_v4(), EquipmentKind::Item, TileLabels::new("Gear", tag));
    if let Some(item) = record.as_item() {
        item.update(|c| c.windows.push(UsageWindow::new(tag)));
    }
    record
}

/// A session context over an in-memory ride library and a store at `data_path`.
#[allow(dead_code)]
pub fn test_context(data_path: &Path, rides: Vec<RideRecord>) -> (EquipmentContext, Arc<RideLibrary>) {
    let library = Arc::new(RideLibrary::new());
    for ride in rides {
        library.add_ride(ride);
    }
    let config = Config {
        data_path: data_path.to_path_buf(),
        calc_threads: Some(2),
        shutdown_timeout: PASS_TIMEOUT,
        ..Config::default()
    };
    let ctx = EquipmentContext::new(config, library.clone());
    (ctx, library)
}
