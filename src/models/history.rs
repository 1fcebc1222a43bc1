// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Dated service log for a piece of equipment. Not affected by rides.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

use crate::models::equipment::Accumulate;
use crate::sync;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub date: NaiveDate,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_most_recent_first")]
    pub sort_most_recent_first: bool,
    #[serde(default)]
    pub entries: Vec<HistoryEntry>,
}

fn default_most_recent_first() -> bool {
    true
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            sort_most_recent_first: true,
            entries: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
pub struct EquipmentHistory {
    config: RwLock<HistoryConfig>,
}

impl EquipmentHistory {
    pub fn with_config(config: HistoryConfig) -> Self {
        Self {
            config: RwLock::new(config),
        }
    }

    pub fn config(&self) -> HistoryConfig {
        sync::read(&self.config).clone()
    }

    pub fn update<R>(&self, edit: impl FnOnce(&mut HistoryConfig) -> R) -> R {
        edit(&mut sync::write(&self.config))
    }

    /// Append an entry and keep the list in display order.
    pub fn add_entry(&self, date: NaiveDate, text: &str) {
        self.update(|c| {
            c.entries.push(HistoryEntry {
                date,
                text: text.to_string(),
            })
        });
        self.sort_entries();
    }

    pub fn sort_entries(&self) {
        let mut config = sync::write(&self.config);
        if config.sort_most_recent_first {
            config.entries.sort_by(|a, b| b.date.cmp(&a.date));
        } else {
            config.entries.sort_by(|a, b| a.date.cmp(&b.date));
        }
    }

    pub(crate) fn duplicate(&self) -> Self {
        Self::with_config(self.config())
    }
}

impl Accumulate for EquipmentHistory {}
