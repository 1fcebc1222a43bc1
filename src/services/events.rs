// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Triggers that ask for a recalculation, and the completion notification.

use uuid::Uuid;

use crate::models::RideRecord;
use crate::services::engine::PassReport;
use crate::units::Units;

/// Something changed that may affect equipment totals.
#[derive(Debug, Clone, PartialEq)]
pub enum EquipmentEvent {
    RideAdded { planned: bool },
    RideChanged { planned: bool },
    RideDeleted { planned: bool },
    AthleteLoaded { athlete: String },
    AthleteClosed { athlete: String },
    /// Rides added until `AutoImportCompleted` are picked up by one pass
    AutoImportStarted,
    AutoImportCompleted,
    /// A ride-cache refresh finished
    RefreshEnd,
    UnitsChanged(Units),
    /// The user edited one tile's configuration
    ItemEdited { reference: Uuid },
}

impl EquipmentEvent {
    pub fn ride_added(ride: &RideRecord) -> Self {
        EquipmentEvent::RideAdded {
            planned: ride.planned,
        }
    }

    pub fn ride_changed(ride: &RideRecord) -> Self {
        EquipmentEvent::RideChanged {
            planned: ride.planned,
        }
    }

    pub fn ride_deleted(ride: &RideRecord) -> Self {
        EquipmentEvent::RideDeleted {
            planned: ride.planned,
        }
    }

    /// Reason string passed down to the engine's logs.
    pub fn reason(&self) -> &'static str {
        match self {
            EquipmentEvent::RideAdded { .. } => "ride added",
            EquipmentEvent::RideChanged { .. } => "ride changed",
            EquipmentEvent::RideDeleted { .. } => "ride deleted",
            EquipmentEvent::AthleteLoaded { .. } => "athlete loaded",
            EquipmentEvent::AthleteClosed { .. } => "athlete closed",
            EquipmentEvent::AutoImportStarted => "auto import started",
            EquipmentEvent::AutoImportCompleted => "auto import completed",
            EquipmentEvent::RefreshEnd => "refresh end",
            EquipmentEvent::UnitsChanged(_) => "units changed",
            EquipmentEvent::ItemEdited { .. } => "item edited",
        }
    }
}

/// Published once per committed pass.
#[derive(Debug, Clone)]
pub struct RecalculationComplete {
    /// 1-based count of passes committed by this coordinator
    pub sequence: u64,
    pub report: PassReport,
}
