// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Measurement system flag and the fixed conversions between metric and
//! imperial distance/elevation units.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};

pub const KM_PER_MILE: f64 = 1.609344;
pub const MILES_PER_KM: f64 = 1.0 / KM_PER_MILE;
pub const METERS_PER_FOOT: f64 = 0.3048;
pub const FEET_PER_METER: f64 = 1.0 / METERS_PER_FOOT;

/// Decimal places kept for user-entered distances and elevations.
pub const DECIMAL_PRECISION: i32 = 1;

/// Display units, as persisted in the equipment store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    Metric,
    Imperial,
}

impl Units {
    pub fn from_metric(metric: bool) -> Self {
        if metric {
            Units::Metric
        } else {
            Units::Imperial
        }
    }

    pub fn is_metric(self) -> bool {
        self == Units::Metric
    }

    /// Convert a distance in kilometres into these units.
    pub fn distance_from_km(self, km: f64) -> f64 {
        match self {
            Units::Metric => km,
            Units::Imperial => km * MILES_PER_KM,
        }
    }

    /// Convert an elevation in metres into these units.
    pub fn elevation_from_meters(self, meters: f64) -> f64 {
        match self {
            Units::Metric => meters,
            Units::Imperial => meters * FEET_PER_METER,
        }
    }
}

impl std::str::FromStr for Units {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "metric" => Ok(Units::Metric),
            "imperial" => Ok(Units::Imperial),
            other => Err(format!("unknown unit system '{}'", other)),
        }
    }
}

/// Convert a distance from the other unit system into `to`, unrounded.
pub fn convert_distance(value: f64, to: Units) -> f64 {
    match to {
        Units::Metric => value * KM_PER_MILE,
        Units::Imperial => value * MILES_PER_KM,
    }
}

/// Convert an elevation from the other unit system into `to`, unrounded.
pub fn convert_elevation(value: f64, to: Units) -> f64 {
    match to {
        Units::Metric => value * METERS_PER_FOOT,
        Units::Imperial => value * FEET_PER_METER,
    }
}

/// Rescale a user-entered distance after the unit system flipped to `to`.
pub fn rescale_distance(value: f64, to: Units) -> f64 {
    round_to_precision(convert_distance(value, to))
}

/// Rescale a user-entered elevation after the unit system flipped to `to`.
pub fn rescale_elevation(value: f64, to: Units) -> f64 {
    round_to_precision(convert_elevation(value, to))
}

fn round_to_precision(value: f64) -> f64 {
    let factor = 10f64.powi(DECIMAL_PRECISION);
    (value * factor).round() / factor
}

/// Process-wide measurement system flag.
#[derive(Debug)]
pub struct UnitSystem {
    metric: AtomicBool,
}

impl UnitSystem {
    pub fn new(units: Units) -> Self {
        Self {
            metric: AtomicBool::new(units.is_metric()),
        }
    }

    pub fn current(&self) -> Units {
        Units::from_metric(self.metric.load(Ordering::Acquire))
    }

    /// Switch the measurement system.
    ///
    /// Returns `true` if the value actually changed; callers only rescale
    /// records on a real change.
    pub fn set(&self, units: Units) -> bool {
        self.metric.swap(units.is_metric(), Ordering::AcqRel) != units.is_metric()
    }
}

impl Default for UnitSystem {
    fn default() -> Self {
        Self::new(Units::Metric)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_round_trip_within_tolerance() {
        for original in [0.0, 1.0, 50.0, 123.4, 9999.9] {
            let imperial = rescale_distance(original, Units::Imperial);
            let back = rescale_distance(imperial, Units::Metric);
            assert!(
                (back - original).abs() <= 1.0,
                "{} -> {} -> {}",
                original,
                imperial,
                back
            );
        }
    }

    #[test]
    fn test_elevation_round_trip_within_tolerance() {
        for original in [0.0, 10.0, 1500.0, 8848.9] {
            let imperial = rescale_elevation(original, Units::Imperial);
            let back = rescale_elevation(imperial, Units::Metric);
            assert!((back - original).abs() <= 1.0);
        }
    }

    #[test]
    fn test_rescale_rounds_to_one_decimal() {
        assert_eq!(rescale_distance(100.0, Units::Imperial), 62.1);
        assert_eq!(rescale_elevation(1000.0, Units::Imperial), 3280.8);
    }

    #[test]
    fn test_convert_is_unrounded() {
        assert!((convert_distance(10.0, Units::Imperial) - 6.213711922).abs() < 1e-9);
        assert!((convert_elevation(1000.0, Units::Metric) - 304.8).abs() < 1e-9);
    }

    #[test]
    fn test_unit_system_reports_changes() {
        let units = UnitSystem::default();
        assert_eq!(units.current(), Units::Metric);
        assert!(!units.set(Units::Metric));
        assert!(units.set(Units::Imperial));
        assert_eq!(units.current(), Units::Imperial);
        assert!(!units.set(Units::Imperial));
    }

    #[test]
    fn test_units_from_str() {
        assert_eq!("Metric".parse::<Units>(), Ok(Units::Metric));
        assert_eq!(" imperial ".parse::<Units>(), Ok(Units::Imperial));
        assert!("furlongs".parse::<Units>().is_err());
    }
}
