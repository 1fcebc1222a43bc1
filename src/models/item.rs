// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! A tracked piece of equipment (bike, chain, tyres...).
//!
//! Distance and elevation come from two sources: rides matched by the
//! item's usage windows, and manual values the user entered for usage that
//! was never recorded. Totals are always tracked + manual.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

use crate::models::equipment::{Accumulate, Counter, ScaledSum};
use crate::models::ride::RideSample;
use crate::models::usage_window::{KnownTags, UsageWindow};
use crate::sync;
use crate::units::{
    convert_distance, convert_elevation, rescale_distance, rescale_elevation, Units,
};

/// User-entered state of an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemConfig {
    /// Distance ridden before tracking started, or on untracked rides
    #[serde(default)]
    pub manual_distance: f64,
    #[serde(default)]
    pub manual_elevation: f64,
    #[serde(default)]
    pub windows: Vec<UsageWindow>,
    /// Replacement thresholds; zero means unset
    #[serde(default)]
    pub replace_distance: f64,
    #[serde(default)]
    pub replace_elevation: f64,
    #[serde(default)]
    pub replace_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: String,
    /// Show total distance (true) or total elevation (false) on the tile
    #[serde(default = "default_true")]
    pub display_total_distance: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ItemConfig {
    fn default() -> Self {
        Self {
            manual_distance: 0.0,
            manual_elevation: 0.0,
            windows: Vec::new(),
            replace_distance: 0.0,
            replace_elevation: 0.0,
            replace_date: None,
            notes: String::new(),
            display_total_distance: true,
        }
    }
}

/// Values computed by the last committed pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemTotals {
    pub activities: u64,
    pub time_secs: u64,
    pub tracked_distance: f64,
    pub total_distance: f64,
    pub tracked_elevation: f64,
    pub total_elevation: f64,
}

impl ItemTotals {
    fn baseline(config: &ItemConfig) -> Self {
        Self {
            total_distance: config.manual_distance,
            total_elevation: config.manual_elevation,
            ..Self::default()
        }
    }
}

/// Reasons an item tile should be highlighted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemAlerts {
    pub over_distance: bool,
    pub over_elevation: bool,
    pub over_date: bool,
    pub invalid_range: bool,
    pub unknown_tags: bool,
}

impl ItemAlerts {
    pub fn needs_attention(&self) -> bool {
        self.over_distance
            || self.over_elevation
            || self.over_date
            || self.invalid_range
            || self.unknown_tags
    }
}

#[derive(Debug, Default)]
struct ItemAccumulator {
    activities: Counter,
    time_secs: Counter,
    tracked_distance: ScaledSum,
    total_distance: ScaledSum,
    tracked_elevation: ScaledSum,
    total_elevation: ScaledSum,
}

#[derive(Debug, Default)]
pub struct EquipmentItem {
    config: RwLock<ItemConfig>,
    totals: RwLock<ItemTotals>,
    acc: ItemAccumulator,
}

impl EquipmentItem {
    pub fn with_config(config: ItemConfig) -> Self {
        let totals = ItemTotals::baseline(&config);
        Self {
            config: RwLock::new(config),
            totals: RwLock::new(totals),
            acc: ItemAccumulator::default(),
        }
    }

    pub fn config(&self) -> ItemConfig {
        sync::read(&self.config).clone()
    }

    /// Edit the user-entered state; totals follow the new manual values.
    pub fn update<R>(&self, edit: impl FnOnce(&mut ItemConfig) -> R) -> R {
        let mut config = sync::write(&self.config);
        let result = edit(&mut config);
        let mut totals = sync::write(&self.totals);
        totals.total_distance = totals.tracked_distance + config.manual_distance;
        totals.total_elevation = totals.tracked_elevation + config.manual_elevation;
        result
    }

    pub fn set_manual_distance(&self, distance: f64) {
        self.update(|c| c.manual_distance = distance);
    }

    pub fn set_manual_elevation(&self, elevation: f64) {
        self.update(|c| c.manual_elevation = elevation);
    }

    pub fn totals(&self) -> ItemTotals {
        sync::read(&self.totals).clone()
    }

    /// Whether any window covers a ride with these tags on `date`.
    pub fn matches(&self, ride_tags: &[String], date: NaiveDate) -> bool {
        sync::read(&self.config)
            .windows
            .iter()
            .any(|w| w.matches(ride_tags, date))
    }

    pub fn range_is_valid(&self) -> bool {
        sync::read(&self.config)
            .windows
            .iter()
            .all(UsageWindow::range_is_valid)
    }

    pub fn all_tags_known(&self) -> bool {
        sync::read(&self.config)
            .windows
            .iter()
            .all(UsageWindow::tag_is_known)
    }

    pub fn refresh_known(&self, known: &KnownTags) {
        for window in sync::write(&self.config).windows.iter_mut() {
            window.refresh_known(known);
        }
    }

    /// Order windows with the most recent start first; unbounded starts last.
    pub fn sort_windows(&self) {
        sync::write(&self.config)
            .windows
            .sort_by(|a, b| b.start.cmp(&a.start));
    }

    pub fn alerts(&self, today: NaiveDate) -> ItemAlerts {
        let config = sync::read(&self.config);
        let totals = sync::read(&self.totals);
        ItemAlerts {
            over_distance: config.replace_distance != 0.0
                && totals.total_distance > config.replace_distance,
            over_elevation: config.replace_elevation != 0.0
                && totals.total_elevation > config.replace_elevation,
            over_date: config.replace_date.is_some_and(|d| today > d),
            invalid_range: !config.windows.iter().all(UsageWindow::range_is_valid),
            unknown_tags: !config.windows.iter().all(UsageWindow::tag_is_known),
        }
    }

    pub(crate) fn duplicate(&self) -> Self {
        Self::with_config(self.config())
    }
}

impl Accumulate for EquipmentItem {
    fn start_of_calculation(&self) {
        let config = sync::read(&self.config);
        self.acc.activities.reset();
        self.acc.time_secs.reset();
        self.acc.tracked_distance.reset(0.0);
        self.acc.total_distance.reset(config.manual_distance);
        self.acc.tracked_elevation.reset(0.0);
        self.acc.total_elevation.reset(config.manual_elevation);
    }

    fn add_activity(&self, ride: &RideSample) {
        if !self.matches(&ride.tags, ride.date) {
            return;
        }
        self.acc.activities.add(1);
        self.acc.time_secs.add(ride.time_secs);
        self.acc.tracked_distance.add(ride.distance);
        self.acc.total_distance.add(ride.distance);
        self.acc.tracked_elevation.add(ride.elevation);
        self.acc.total_elevation.add(ride.elevation);
    }

    fn end_of_calculation(&self) {
        *sync::write(&self.totals) = ItemTotals {
            activities: self.acc.activities.get(),
            time_secs: self.acc.time_secs.get(),
            tracked_distance: self.acc.tracked_distance.value(),
            total_distance: self.acc.total_distance.value(),
            tracked_elevation: self.acc.tracked_elevation.value(),
            total_elevation: self.acc.total_elevation.value(),
        };
    }

    fn units_changed(&self, units: Units) {
        let mut config = sync::write(&self.config);
        config.manual_distance = rescale_distance(config.manual_distance, units);
        config.replace_distance = rescale_distance(config.replace_distance, units);
        config.manual_elevation = rescale_elevation(config.manual_elevation, units);
        config.replace_elevation = rescale_elevation(config.replace_elevation, units);

        // Totals must agree with the new manual values even if no pass follows.
        let mut totals = sync::write(&self.totals);
        totals.tracked_distance = convert_distance(totals.tracked_distance, units);
        totals.tracked_elevation = convert_elevation(totals.tracked_elevation, units);
        totals.total_distance = totals.tracked_distance + config.manual_distance;
        totals.total_elevation = totals.tracked_elevation + config.manual_elevation;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::usage_window::parse_tag_csv;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample(tags: &str, day: NaiveDate, distance: f64) -> RideSample {
        RideSample {
            tags: parse_tag_csv(tags),
            date: day,
            distance,
            elevation: distance * 10.0,
            time_secs: 600,
            athlete: "Rider".to_string(),
        }
    }

    #[test]
    fn test_manual_values_set_totals() {
        let item = EquipmentItem::default();
        item.set_manual_distance(120.5);
        item.set_manual_elevation(900.0);
        let totals = item.totals();
        assert_eq!(totals.total_distance, 120.5);
        assert_eq!(totals.total_elevation, 900.0);
        assert_eq!(totals.tracked_distance, 0.0);
    }

    #[test]
    fn test_window_dates_limit_matches() {
        let item = EquipmentItem::with_config(ItemConfig {
            windows: vec![UsageWindow::bounded("bike1", Some(date(2024, 3, 1)), None)],
            ..ItemConfig::default()
        });
        item.start_of_calculation();
        item.add_activity(&sample("bike1", date(2024, 2, 1), 40.0));
        item.add_activity(&sample("bike1", date(2024, 4, 1), 25.0));
        item.end_of_calculation();

        let totals = item.totals();
        assert_eq!(totals.activities, 1);
        assert_eq!(totals.tracked_distance, 25.0);
        assert_eq!(totals.tracked_elevation, 250.0);
        assert_eq!(totals.time_secs, 600);
    }

    #[test]
    fn test_ride_counted_once_with_overlapping_windows() {
        let item = EquipmentItem::with_config(ItemConfig {
            windows: vec![UsageWindow::new("bike1"), UsageWindow::new("bike1")],
            ..ItemConfig::default()
        });
        item.start_of_calculation();
        item.add_activity(&sample("bike1", date(2024, 1, 1), 10.0));
        item.end_of_calculation();
        assert_eq!(item.totals().activities, 1);
        assert_eq!(item.totals().total_distance, 10.0);
    }

    #[test]
    fn test_manual_edit_after_pass_keeps_tracked() {
        let item = EquipmentItem::with_config(ItemConfig {
            windows: vec![UsageWindow::new("bike1")],
            ..ItemConfig::default()
        });
        item.start_of_calculation();
        item.add_activity(&sample("bike1", date(2024, 1, 1), 30.0));
        item.end_of_calculation();

        item.set_manual_distance(20.0);
        let totals = item.totals();
        assert_eq!(totals.tracked_distance, 30.0);
        assert_eq!(totals.total_distance, 50.0);
    }

    #[test]
    fn test_units_changed_rescales_primary_fields() {
        let item = EquipmentItem::with_config(ItemConfig {
            manual_distance: 100.0,
            manual_elevation: 1000.0,
            replace_distance: 5000.0,
            ..ItemConfig::default()
        });
        item.units_changed(Units::Imperial);
        let config = item.config();
        assert_eq!(config.manual_distance, 62.1);
        assert_eq!(config.manual_elevation, 3280.8);
        assert_eq!(config.replace_distance, 3106.9);
        assert_eq!(config.replace_elevation, 0.0);

        let totals = item.totals();
        assert_eq!(totals.total_distance, config.manual_distance);
        assert_eq!(totals.total_elevation, config.manual_elevation);
    }

    #[test]
    fn test_units_changed_converts_tracked_totals() {
        let item = EquipmentItem::with_config(ItemConfig {
            manual_distance: 10.0,
            windows: vec![UsageWindow::new("bike1")],
            ..ItemConfig::default()
        });
        item.start_of_calculation();
        item.add_activity(&sample("bike1", date(2024, 1, 1), 100.0));
        item.end_of_calculation();

        item.units_changed(Units::Imperial);
        let totals = item.totals();
        let manual = item.config().manual_distance;
        assert_eq!(manual, 6.2);
        assert!((totals.tracked_distance - 62.137).abs() < 0.001);
        assert_eq!(totals.total_distance, totals.tracked_distance + manual);
        assert_eq!(totals.activities, 1);
    }

    #[test]
    fn test_sort_windows_most_recent_first() {
        let item = EquipmentItem::with_config(ItemConfig {
            windows: vec![
                UsageWindow::bounded("a", Some(date(2022, 1, 1)), None),
                UsageWindow::new("b"),
                UsageWindow::bounded("c", Some(date(2024, 1, 1)), None),
            ],
            ..ItemConfig::default()
        });
        item.sort_windows();
        let tags: Vec<String> = item.config().windows.iter().map(|w| w.tag().to_string()).collect();
        assert_eq!(tags, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_alerts() {
        let known: KnownTags = ["bike1"].into_iter().collect();
        let item = EquipmentItem::with_config(ItemConfig {
            manual_distance: 6000.0,
            replace_distance: 5000.0,
            replace_date: Some(date(2024, 1, 1)),
            windows: vec![UsageWindow::new("bike1")],
            ..ItemConfig::default()
        });
        item.refresh_known(&known);

        let alerts = item.alerts(date(2023, 12, 1));
        assert!(alerts.over_distance);
        assert!(!alerts.over_date);
        assert!(!alerts.unknown_tags);
        assert!(alerts.needs_attention());

        item.set_manual_distance(10.0);
        let alerts = item.alerts(date(2024, 6, 1));
        assert!(!alerts.over_distance);
        assert!(alerts.over_date);
    }

    #[test]
    fn test_duplicate_clears_derived_state() {
        let item = EquipmentItem::with_config(ItemConfig {
            manual_distance: 5.0,
            windows: vec![UsageWindow::new("bike1")],
            ..ItemConfig::default()
        });
        item.start_of_calculation();
        item.add_activity(&sample("bike1", date(2024, 1, 1), 30.0));
        item.end_of_calculation();

        let copy = item.duplicate();
        assert_eq!(copy.config(), item.config());
        assert_eq!(copy.totals().activities, 0);
        assert_eq!(copy.totals().total_distance, 5.0);
    }
}
