// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JSON file holding every equipment record's user-entered state.
//!
//! Derived totals are never persisted; they are rebuilt by the first pass
//! after load. Records are loaded as orphans and only records adopted during
//! the session are written back.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{
    Accumulate, EquipmentBody, EquipmentHistory, EquipmentItem, EquipmentNotes, EquipmentRecord,
    EquipmentSummary, HistoryConfig, ItemConfig, NotesConfig, SummaryConfig, TileLabels,
};
use crate::services::registry::EquipmentRegistry;
use crate::units::Units;

/// Current document version.
pub const STORE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct StoreDocument {
    version: u32,
    uom: Units,
    #[serde(default)]
    total_items: usize,
    #[serde(default)]
    garbage_items: usize,
    #[serde(default)]
    equipment: Vec<serde_json::Value>,
}

/// One record as written to disk.
#[derive(Debug, Serialize, Deserialize)]
struct StoredRecord {
    eqref: Uuid,
    #[serde(flatten)]
    labels: TileLabels,
    #[serde(flatten)]
    body: StoredBody,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum StoredBody {
    Item(ItemConfig),
    Summary(SummaryConfig),
    History(HistoryConfig),
    Notes(NotesConfig),
}

impl StoredRecord {
    fn from_record(record: &EquipmentRecord) -> Self {
        let body = match record.body() {
            EquipmentBody::Item(item) => StoredBody::Item(item.config()),
            EquipmentBody::Summary(summary) => StoredBody::Summary(summary.config()),
            EquipmentBody::History(history) => StoredBody::History(history.config()),
            EquipmentBody::Notes(notes) => StoredBody::Notes(notes.config()),
        };
        Self {
            eqref: record.reference(),
            labels: record.labels(),
            body,
        }
    }

    fn into_record(self) -> EquipmentRecord {
        let body = match self.body {
            StoredBody::Item(config) => EquipmentBody::Item(EquipmentItem::with_config(config)),
            StoredBody::Summary(config) => {
                EquipmentBody::Summary(EquipmentSummary::with_config(config))
            }
            StoredBody::History(config) => {
                EquipmentBody::History(EquipmentHistory::with_config(config))
            }
            StoredBody::Notes(config) => EquipmentBody::Notes(EquipmentNotes::with_config(config)),
        };
        EquipmentRecord::with_body(self.eqref, self.labels, body)
    }
}

/// Counts reported by a load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped: usize,
    pub rescaled: bool,
}

/// Counts reported by a save.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveReport {
    pub saved: usize,
    pub discarded: usize,
}

/// Equipment store backed by a single JSON file.
#[derive(Debug, Clone)]
pub struct EquipmentStore {
    path: PathBuf,
}

impl EquipmentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Populate `registry` from the file. A missing file is an empty store.
    ///
    /// Records stored under other units are rescaled to `units`.
    pub fn load(&self, registry: &EquipmentRegistry, units: Units) -> Result<LoadReport> {
        if !self.path.exists() {
            tracing::info!(path = %self.path.display(), "No equipment store yet, starting empty");
            return Ok(LoadReport::default());
        }

        let json_data = fs::read_to_string(&self.path)?;
        let document: StoreDocument = serde_json::from_str(&json_data)?;
        if document.version > STORE_VERSION {
            return Err(AppError::InvalidInput(format!(
                "unsupported store version {} in {}",
                document.version,
                self.path.display()
            )));
        }

        let rescaled = document.uom != units;
        let mut report = LoadReport {
            rescaled,
            ..LoadReport::default()
        };

        for entry in document.equipment {
            let kind = entry
                .get("type")
                .and_then(|t| t.as_str())
                .unwrap_or("<missing>")
                .to_string();
            match serde_json::from_value::<StoredRecord>(entry) {
                Ok(stored) => {
                    let record = stored.into_record();
                    if rescaled {
                        record.units_changed(units);
                    }
                    registry.insert_loaded(record);
                    report.loaded += 1;
                }
                Err(e) => {
                    tracing::warn!(kind = %kind, error = %e, "Skipping unreadable equipment entry");
                    report.skipped += 1;
                }
            }
        }

        tracing::info!(
            path = %self.path.display(),
            loaded = report.loaded,
            skipped = report.skipped,
            rescaled,
            "Equipment store loaded"
        );
        Ok(report)
    }

    /// Write every live record. Orphans are discarded.
    ///
    /// The file is replaced atomically via a temporary sibling.
    pub fn save(&self, registry: &EquipmentRegistry, units: Units) -> Result<SaveReport> {
        let orphans = registry.orphans();
        for reference in &orphans {
            tracing::warn!(reference = %reference, "Discarding unused equipment");
        }

        let live = registry.live_records();
        let equipment = live
            .iter()
            .map(|record| serde_json::to_value(StoredRecord::from_record(record)))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let document = StoreDocument {
            version: STORE_VERSION,
            uom: units,
            total_items: live.len(),
            garbage_items: orphans.len(),
            equipment,
        };
        let json_data = serde_json::to_string_pretty(&document)?;

        let tmp_path = self.tmp_path();
        fs::write(&tmp_path, json_data).map_err(|e| self.write_failed(&tmp_path, e))?;
        fs::rename(&tmp_path, &self.path).map_err(|e| self.write_failed(&self.path, e))?;

        tracing::info!(
            path = %self.path.display(),
            saved = live.len(),
            discarded = orphans.len(),
            "Equipment store saved"
        );
        Ok(SaveReport {
            saved: live.len(),
            discarded: orphans.len(),
        })
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn write_failed(&self, path: &Path, e: std::io::Error) -> AppError {
        AppError::Persistence(format!("{} {}: {}", AppError::WRITE_FAILED, path.display(), e))
    }
}
