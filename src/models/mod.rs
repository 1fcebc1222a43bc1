// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for equipment records and the rides they aggregate.

pub mod equipment;
pub mod history;
pub mod item;
pub mod notes;
pub mod ride;
pub mod summary;
pub mod usage_window;

pub use equipment::{Accumulate, EquipmentBody, EquipmentKind, EquipmentRecord, TileLabels};
pub use history::{EquipmentHistory, HistoryConfig, HistoryEntry};
pub use item::{EquipmentItem, ItemAlerts, ItemConfig, ItemTotals};
pub use notes::{EquipmentNotes, NotesConfig};
pub use ride::{RideRecord, RideSample};
pub use summary::{EquipmentSummary, SummaryConfig, SummaryTotals};
pub use usage_window::{KnownTags, UsageWindow};
