// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Equipment records and the accumulation protocol shared by every kind.
//!
//! A recalculation pass drives each record through four phases:
//! 1. `start_of_calculation` resets the accumulators (control thread)
//! 2. `add_activity` is offered every ride, from many worker threads at once
//! 3. `end_of_calculation` publishes the accumulators (last worker only)
//! 4. `units_changed` rescales user-entered values when display units flip

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use uuid::Uuid;

use crate::models::history::EquipmentHistory;
use crate::models::item::EquipmentItem;
use crate::models::notes::EquipmentNotes;
use crate::models::ride::RideSample;
use crate::models::summary::EquipmentSummary;
use crate::sync;
use crate::units::Units;

/// Fixed-point scale for distance/elevation accumulators (4 decimal places).
pub const ACCUMULATOR_SCALE: f64 = 10_000.0;

/// The four-phase accumulation protocol.
///
/// `add_activity` must be callable concurrently on the same instance.
pub trait Accumulate {
    fn start_of_calculation(&self) {}
    fn add_activity(&self, _ride: &RideSample) {}
    fn end_of_calculation(&self) {}
    fn units_changed(&self, _units: Units) {}
}

/// Order-independent floating point sum held as a scaled integer.
///
/// Relaxed ordering is enough: the engine's worker countdown publishes every
/// add to the committing thread.
#[derive(Debug, Default)]
pub struct ScaledSum(AtomicU64);

impl ScaledSum {
    pub fn reset(&self, start: f64) {
        self.0.store(to_scaled(start), Ordering::Relaxed);
    }

    pub fn add(&self, value: f64) {
        self.0.fetch_add(to_scaled(value), Ordering::Relaxed);
    }

    pub fn value(&self) -> f64 {
        self.0.load(Ordering::Relaxed) as f64 / ACCUMULATOR_SCALE
    }
}

fn to_scaled(value: f64) -> u64 {
    // Negative and NaN inputs saturate to zero.
    (value * ACCUMULATOR_SCALE).round() as u64
}

/// Atomic counter for activities and seconds.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn reset(&self) {
        self.0.store(0, Ordering::Relaxed);
    }

    pub fn add(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Kind tag fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EquipmentKind {
    Item,
    Summary,
    History,
    Notes,
}

impl EquipmentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EquipmentKind::Item => "item",
            EquipmentKind::Summary => "summary",
            EquipmentKind::History => "history",
            EquipmentKind::Notes => "notes",
        }
    }
}

impl fmt::Display for EquipmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Chart and tile names a record is displayed under. Not part of identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileLabels {
    #[serde(default)]
    pub chart: String,
    #[serde(default)]
    pub tile: String,
}

impl TileLabels {
    pub fn new(chart: &str, tile: &str) -> Self {
        Self {
            chart: chart.to_string(),
            tile: tile.to_string(),
        }
    }
}

/// Kind-specific state of a record.
#[derive(Debug)]
pub enum EquipmentBody {
    Item(EquipmentItem),
    Summary(EquipmentSummary),
    History(EquipmentHistory),
    Notes(EquipmentNotes),
}

impl EquipmentBody {
    fn empty(kind: EquipmentKind) -> Self {
        match kind {
            EquipmentKind::Item => EquipmentBody::Item(EquipmentItem::default()),
            EquipmentKind::Summary => EquipmentBody::Summary(EquipmentSummary::default()),
            EquipmentKind::History => EquipmentBody::History(EquipmentHistory::default()),
            EquipmentKind::Notes => EquipmentBody::Notes(EquipmentNotes::default()),
        }
    }

    fn kind(&self) -> EquipmentKind {
        match self {
            EquipmentBody::Item(_) => EquipmentKind::Item,
            EquipmentBody::Summary(_) => EquipmentKind::Summary,
            EquipmentBody::History(_) => EquipmentKind::History,
            EquipmentBody::Notes(_) => EquipmentKind::Notes,
        }
    }

    fn protocol(&self) -> &dyn Accumulate {
        match self {
            EquipmentBody::Item(item) => item,
            EquipmentBody::Summary(summary) => summary,
            EquipmentBody::History(history) => history,
            EquipmentBody::Notes(notes) => notes,
        }
    }

    fn duplicate(&self) -> Self {
        match self {
            EquipmentBody::Item(item) => EquipmentBody::Item(item.duplicate()),
            EquipmentBody::Summary(summary) => EquipmentBody::Summary(summary.duplicate()),
            EquipmentBody::History(history) => EquipmentBody::History(history.duplicate()),
            EquipmentBody::Notes(notes) => EquipmentBody::Notes(notes.duplicate()),
        }
    }
}

/// A user-visible equipment aggregate, owned by the registry.
#[derive(Debug)]
pub struct EquipmentRecord {
    reference: Uuid,
    labels: RwLock<TileLabels>,
    body: EquipmentBody,
}

impl EquipmentRecord {
    /// A fresh record of `kind` with default configuration.
    pub fn new(reference: Uuid, kind: EquipmentKind, labels: TileLabels) -> Self {
        Self::with_body(reference, labels, EquipmentBody::empty(kind))
    }

    pub fn with_body(reference: Uuid, labels: TileLabels, body: EquipmentBody) -> Self {
        Self {
            reference,
            labels: RwLock::new(labels),
            body,
        }
    }

    pub fn reference(&self) -> Uuid {
        self.reference
    }

    pub fn kind(&self) -> EquipmentKind {
        self.body.kind()
    }

    pub fn labels(&self) -> TileLabels {
        sync::read(&self.labels).clone()
    }

    pub fn set_labels(&self, labels: TileLabels) {
        *sync::write(&self.labels) = labels;
    }

    pub fn body(&self) -> &EquipmentBody {
        &self.body
    }

    pub fn as_item(&self) -> Option<&EquipmentItem> {
        match &self.body {
            EquipmentBody::Item(item) => Some(item),
            _ => None,
        }
    }

    pub fn as_summary(&self) -> Option<&EquipmentSummary> {
        match &self.body {
            EquipmentBody::Summary(summary) => Some(summary),
            _ => None,
        }
    }

    pub fn as_history(&self) -> Option<&EquipmentHistory> {
        match &self.body {
            EquipmentBody::History(history) => Some(history),
            _ => None,
        }
    }

    pub fn as_notes(&self) -> Option<&EquipmentNotes> {
        match &self.body {
            EquipmentBody::Notes(notes) => Some(notes),
            _ => None,
        }
    }

    /// Copy of this record under a new reference, with derived state cleared.
    pub fn duplicate(&self) -> Self {
        Self::with_body(Uuid::new_v4(), self.labels(), self.body.duplicate())
    }
}

impl Accumulate for EquipmentRecord {
    fn start_of_calculation(&self) {
        self.body.protocol().start_of_calculation();
    }

    fn add_activity(&self, ride: &RideSample) {
        self.body.protocol().add_activity(ride);
    }

    fn end_of_calculation(&self) {
        self.body.protocol().end_of_calculation();
    }

    fn units_changed(&self, units: Units) {
        self.body.protocol().units_changed(units);
    }
}
