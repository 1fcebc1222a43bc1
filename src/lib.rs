// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Equipment-Tracker: usage totals for bikes and parts from recorded rides
//!
//! This crate aggregates distance, elevation and time from every ride into
//! the equipment records that claim them through tagged usage windows.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub(crate) mod sync;
pub mod time_utils;
pub mod units;

use std::sync::Arc;

use config::Config;
use db::{EquipmentStore, LoadReport, SaveReport};
use error::Result;
use services::{AggregationEngine, EquipmentRegistry, RecalculationCoordinator, RideSource};
use units::UnitSystem;

/// Everything one session needs, constructed once and passed explicitly.
pub struct EquipmentContext {
    pub config: Config,
    pub registry: Arc<EquipmentRegistry>,
    pub units: Arc<UnitSystem>,
    pub rides: Arc<dyn RideSource>,
    pub coordinator: RecalculationCoordinator,
    pub store: EquipmentStore,
}

impl EquipmentContext {
    pub fn new(config: Config, rides: Arc<dyn RideSource>) -> Self {
        let registry = Arc::new(EquipmentRegistry::new());
        let units = Arc::new(UnitSystem::new(config.units));
        let engine = match config.calc_threads {
            Some(workers) => AggregationEngine::new(workers),
            None => AggregationEngine::with_default_workers(),
        };
        let coordinator = RecalculationCoordinator::new(
            Arc::clone(&registry),
            Arc::clone(&rides),
            Arc::clone(&units),
            Arc::new(engine),
        );
        let store = EquipmentStore::new(config.data_path.clone());
        Self {
            config,
            registry,
            units,
            rides,
            coordinator,
            store,
        }
    }

    /// Populate the registry from the equipment store.
    pub fn load(&self) -> Result<LoadReport> {
        self.store.load(&self.registry, self.units.current())
    }

    /// Re-check every window and filter tag against the tags rides use.
    pub fn refresh_known_tags(&self) {
        let known = self.rides.known_tags();
        tracing::debug!(tags = known.len(), "Refreshing known equipment tags");
        self.registry.refresh_known(&known);
    }

    /// Stop accepting recalculations, let a running pass finish, then save.
    pub fn shutdown(&self) -> Result<SaveReport> {
        self.coordinator.disable_calculations(true);
        if !self.coordinator.wait_until_idle(self.config.shutdown_timeout) {
            tracing::warn!(
                timeout_secs = self.config.shutdown_timeout.as_secs(),
                "Recalculation still running at shutdown"
            );
        }
        self.store.save(&self.registry, self.units.current())
    }
}
