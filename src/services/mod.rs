// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - aggregation and its collaborators.

pub mod coordinator;
pub mod engine;
pub mod events;
pub mod registry;
pub mod rides;

pub use coordinator::RecalculationCoordinator;
pub use engine::{AggregationEngine, EnginePhase, PassOutcome, PassReport};
pub use events::{EquipmentEvent, RecalculationComplete};
pub use registry::EquipmentRegistry;
pub use rides::{collect_rides, RideLibrary, RideLibraryError, RideSource};
