// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use equipment_tracker::db::{EquipmentStore, STORE_VERSION};
use equipment_tracker::error::AppError;
use equipment_tracker::models::{EquipmentKind, SummaryConfig, TileLabels, UsageWindow};
use equipment_tracker::services::EquipmentRegistry;
use equipment_tracker::units::Units;
use serde_json::{json, Value};
use std::fs;
use tempfile::TempDir;
use uuid::Uuid;

mod common;
use common::{date, registry_item};

fn read_json(path: &std::path::Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn test_missing_file_loads_empty() {
    let dir = TempDir::new().unwrap();
    let store = EquipmentStore::new(dir.path().join("none.json"));
    let registry = EquipmentRegistry::new();

    let report = store.load(&registry, Units::Metric).unwrap();
    assert_eq!(report.loaded, 0);
    assert!(registry.is_empty());
}

#[test]
fn test_round_trip_keeps_primary_state() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("gear.json");
    let store = EquipmentStore::new(&path);

    let registry = EquipmentRegistry::new();
    let item = registry_item(&registry, "bike1");
    item.as_item().unwrap().update(|c| {
        c.manual_distance = 321.5;
        c.replace_date = Some(date(2025, 6, 1));
        c.windows.push(UsageWindow::bounded("bike2", Some(date(2024, 1, 1)), Some(date(2024, 12, 31))));
        c.notes = "rear hub".to_string();
    });
    let summary = registry.create(Uuid::new_v4(), EquipmentKind::Summary, TileLabels::new("Gear", "All"));
    summary
        .as_summary()
        .unwrap()
        .update(|c| *c = SummaryConfig::new("bike 1", true));
    let history = registry.create(Uuid::new_v4(), EquipmentKind::History, TileLabels::default());
    history.as_history().unwrap().add_entry(date(2024, 2, 2), "bar tape");

    let saved = store.save(&registry, Units::Metric).unwrap();
    assert_eq!(saved.saved, 3);
    assert_eq!(saved.discarded, 0);

    let document = read_json(&path);
    assert_eq!(document["version"], STORE_VERSION);
    assert_eq!(document["uom"], "metric");
    assert_eq!(document["total_items"], 3);
    assert_eq!(document["garbage_items"], 0);

    let reloaded = EquipmentRegistry::new();
    let report = store.load(&reloaded, Units::Metric).unwrap();
    assert_eq!(report.loaded, 3);
    assert!(!report.rescaled);
    assert_eq!(reloaded.orphans().len(), 3);

    let item_again = reloaded.get(&item.reference()).unwrap();
    assert_eq!(item_again.as_item().unwrap().config(), item.as_item().unwrap().config());
    assert_eq!(item_again.labels(), item.labels());
    assert_eq!(item_again.as_item().unwrap().totals().total_distance, 321.5);

    let summary_again = reloaded.get(&summary.reference()).unwrap();
    assert_eq!(summary_again.as_summary().unwrap().config().tag(), "bike1");
    assert!(summary_again.as_summary().unwrap().config().show_per_athlete);

    let history_again = reloaded.get(&history.reference()).unwrap();
    assert_eq!(history_again.as_history().unwrap().config().entries[0].text, "bar tape");
}

#[test]
fn test_save_discards_orphans() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("gear.json");
    let store = EquipmentStore::new(&path);

    let registry = EquipmentRegistry::new();
    let kept = registry_item(&registry, "bike1");
    let dropped = registry_item(&registry, "bike2");
    store.save(&registry, Units::Metric).unwrap();

    let session = EquipmentRegistry::new();
    store.load(&session, Units::Metric).unwrap();
    session.get(&kept.reference());
    let saved = store.save(&session, Units::Metric).unwrap();
    assert_eq!(saved.saved, 1);
    assert_eq!(saved.discarded, 1);

    let document = read_json(&path);
    assert_eq!(document["garbage_items"], 1);
    let refs: Vec<String> = document["equipment"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["eqref"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(refs, vec![kept.reference().to_string()]);
    assert!(!refs.contains(&dropped.reference().to_string()));
}

#[test]
fn test_unknown_kind_is_skipped() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("gear.json");
    let reference = Uuid::new_v4();
    let document = json!({
        "version": 1,
        "uom": "metric",
        "total_items": 2,
        "garbage_items": 0,
        "equipment": [
            {"type": "gauge", "eqref": Uuid::new_v4(), "chart": "Gear", "tile": "Odd"},
            {"type": "notes", "eqref": reference, "chart": "Gear", "tile": "Notes", "notes": "hi"}
        ]
    });
    fs::write(&path, document.to_string()).unwrap();

    let registry = EquipmentRegistry::new();
    let report = EquipmentStore::new(&path).load(&registry, Units::Metric).unwrap();
    assert_eq!(report.loaded, 1);
    assert_eq!(report.skipped, 1);
    let notes = registry.get(&reference).unwrap();
    assert_eq!(notes.as_notes().unwrap().config().notes, "hi");
}

#[test]
fn test_load_rescales_other_units() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("gear.json");
    let reference = Uuid::new_v4();
    let document = json!({
        "version": 1,
        "uom": "imperial",
        "equipment": [
            {"type": "item", "eqref": reference, "chart": "Gear", "tile": "Bike",
             "manual_distance": 100.0, "manual_elevation": 1000.0}
        ]
    });
    fs::write(&path, document.to_string()).unwrap();

    let registry = EquipmentRegistry::new();
    let report = EquipmentStore::new(&path).load(&registry, Units::Metric).unwrap();
    assert!(report.rescaled);

    let item = registry.get(&reference).unwrap();
    let config = item.as_item().unwrap().config();
    assert_eq!(config.manual_distance, 160.9);
    assert_eq!(config.manual_elevation, 304.8);

    // No pass has run yet; totals must already be in the new units.
    let totals = item.as_item().unwrap().totals();
    assert_eq!(totals.total_distance, config.manual_distance);
    assert_eq!(totals.total_elevation, config.manual_elevation);
}

#[test]
fn test_newer_store_version_is_invalid_input() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("gear.json");
    let document = json!({
        "version": STORE_VERSION + 1,
        "uom": "metric",
        "equipment": []
    });
    fs::write(&path, document.to_string()).unwrap();

    let registry = EquipmentRegistry::new();
    let err = EquipmentStore::new(&path).load(&registry, Units::Metric).unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));
    assert!(!err.is_io());
    assert!(registry.is_empty());
}

#[test]
fn test_corrupt_file_is_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("gear.json");
    fs::write(&path, "{not json").unwrap();

    let err = EquipmentStore::new(&path)
        .load(&EquipmentRegistry::new(), Units::Metric)
        .unwrap_err();
    assert!(!err.is_io());
}

#[test]
fn test_write_failure_is_io() {
    let dir = TempDir::new().unwrap();
    let store = EquipmentStore::new(dir.path().join("missing").join("gear.json"));
    let err = store.save(&EquipmentRegistry::new(), Units::Metric).unwrap_err();
    assert!(err.is_io());
}
