// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process store owning every equipment record.
//!
//! Records loaded from the equipment store start out as orphans. Any record
//! that is fetched or (re)created during the session is adopted; orphans
//! still present at the next save are dropped.

use dashmap::{DashMap, DashSet};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::models::{EquipmentKind, EquipmentRecord, KnownTags, TileLabels};
use crate::sync;

/// Keyed owner of equipment records.
#[derive(Default)]
pub struct EquipmentRegistry {
    records: DashMap<Uuid, Arc<EquipmentRecord>>,
    orphans: DashSet<Uuid>,
    /// Serializes mutations of the mapping; lookups do not take it
    writer: Mutex<()>,
}

impl EquipmentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a record, adopting it if it was an orphan.
    pub fn get(&self, reference: &Uuid) -> Option<Arc<EquipmentRecord>> {
        let record = self.records.get(reference).map(|r| Arc::clone(r.value()))?;
        self.orphans.remove(reference);
        Some(record)
    }

    /// Create a fresh record under `reference`, replacing any existing one.
    pub fn create(
        &self,
        reference: Uuid,
        kind: EquipmentKind,
        labels: TileLabels,
    ) -> Arc<EquipmentRecord> {
        let record = Arc::new(EquipmentRecord::new(reference, kind, labels));
        let _guard = sync::lock(&self.writer);
        if let Some(previous) = self.records.insert(reference, Arc::clone(&record)) {
            tracing::debug!(
                reference = %reference,
                previous_kind = %previous.kind(),
                "Replaced existing equipment record"
            );
        }
        self.orphans.remove(&reference);
        record
    }

    /// Bind a tile to `reference`: the existing record if there is one,
    /// otherwise a new record of `kind`.
    ///
    /// The tile's current labels are written onto an existing record.
    pub fn bind(
        &self,
        reference: Uuid,
        kind: EquipmentKind,
        labels: TileLabels,
    ) -> Arc<EquipmentRecord> {
        match self.get(&reference) {
            Some(record) => {
                if record.kind() != kind {
                    tracing::warn!(
                        reference = %reference,
                        stored = %record.kind(),
                        requested = %kind,
                        "Tile bound to equipment of a different kind"
                    );
                }
                record.set_labels(labels);
                record
            }
            None => self.create(reference, kind, labels),
        }
    }

    /// Duplicate a record under a new reference with derived state cleared.
    pub fn clone_record(&self, reference: &Uuid) -> Option<Arc<EquipmentRecord>> {
        let source = self.records.get(reference).map(|r| Arc::clone(r.value()))?;
        let copy = Arc::new(source.duplicate());
        let _guard = sync::lock(&self.writer);
        self.records.insert(copy.reference(), Arc::clone(&copy));
        tracing::debug!(source = %reference, copy = %copy.reference(), "Cloned equipment record");
        Some(copy)
    }

    /// Remove a record. Returns false if no such record exists.
    ///
    /// A pass that already holds the record keeps it alive until it commits.
    pub fn delete(&self, reference: &Uuid) -> bool {
        let _guard = sync::lock(&self.writer);
        self.orphans.remove(reference);
        self.records.remove(reference).is_some()
    }

    /// Insert a record read from the equipment store, marked as orphan.
    pub fn insert_loaded(&self, record: EquipmentRecord) {
        let reference = record.reference();
        let _guard = sync::lock(&self.writer);
        self.records.insert(reference, Arc::new(record));
        self.orphans.insert(reference);
    }

    /// Adopt every loaded record, as a front end showing all of them would.
    ///
    /// Returns how many orphans were adopted.
    pub fn adopt_all(&self) -> usize {
        let _guard = sync::lock(&self.writer);
        let adopted = self.orphans.len();
        self.orphans.clear();
        adopted
    }

    /// Snapshot of every record, used as the target set of a full pass.
    ///
    /// Does not adopt orphans.
    pub fn records(&self) -> Vec<Arc<EquipmentRecord>> {
        self.records.iter().map(|r| Arc::clone(r.value())).collect()
    }

    /// Records that survive a save, ordered by reference.
    pub fn live_records(&self) -> Vec<Arc<EquipmentRecord>> {
        let mut live: Vec<_> = self
            .records
            .iter()
            .filter(|r| !self.orphans.contains(r.key()))
            .map(|r| Arc::clone(r.value()))
            .collect();
        live.sort_by_key(|r| r.reference());
        live
    }

    /// References loaded from the store and not touched since.
    pub fn orphans(&self) -> Vec<Uuid> {
        let mut orphans: Vec<Uuid> = self.orphans.iter().map(|r| *r.key()).collect();
        orphans.sort();
        orphans
    }

    pub fn contains(&self, reference: &Uuid) -> bool {
        self.records.contains_key(reference)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Recompute every record's "tag is a known value" flags.
    pub fn refresh_known(&self, known: &KnownTags) {
        for record in self.records() {
            if let Some(item) = record.as_item() {
                item.refresh_known(known);
            } else if let Some(summary) = record.as_summary() {
                summary.refresh_known(known);
            }
        }
    }
}
