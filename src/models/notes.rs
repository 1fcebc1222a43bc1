//! Free-text notes tile.

use serde::{Deserialize, Serialize};
use std::sync::RwLock;

use crate::models::equipment::Accumulate;
use crate::sync;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotesConfig {
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Default)]
pub struct EquipmentNotes {
    config: RwLock<NotesConfig>,
}

impl EquipmentNotes {
    pub fn with_config(config: NotesConfig) -> Self {
        Self {
            config: RwLock::new(config),
        }
    }

    pub fn config(&self) -> NotesConfig {
        sync::read(&self.config).clone()
    }

    pub fn set_notes(&self, notes: &str) {
        sync::write(&self.config).notes = notes.to_string();
    }

    pub(crate) fn duplicate(&self) -> Self {
        Self::with_config(self.config())
    }
}

impl Accumulate for EquipmentNotes {}
