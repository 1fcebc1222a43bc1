// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Request and debounce layer above the aggregation engine.
//!
//! At most one pass runs at a time. Requests that arrive while a pass is in
//! flight are coalesced: when the pass completes, exactly one fresh
//! whole-registry pass runs no matter how many requests were deferred.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::{Accumulate, EquipmentRecord};
use crate::services::engine::{AggregationEngine, PassOutcome, PassReport};
use crate::services::events::{EquipmentEvent, RecalculationComplete};
use crate::services::registry::EquipmentRegistry;
use crate::services::rides::{collect_rides, RideSource};
use crate::sync;
use crate::units::UnitSystem;

/// Completion notifications buffered per subscriber.
const NOTIFY_CAPACITY: usize = 16;

const DEFERRED_REASON: &str = "deferred recalculation";

#[derive(Clone)]
pub struct RecalculationCoordinator {
    shared: Arc<Shared>,
}

struct Shared {
    registry: Arc<EquipmentRegistry>,
    rides: Arc<dyn RideSource>,
    units: Arc<UnitSystem>,
    engine: Arc<AggregationEngine>,
    /// Requests accepted since the running pass started, itself included
    in_flight: Mutex<u32>,
    idle: Condvar,
    disabled: AtomicBool,
    importing: AtomicBool,
    passes: AtomicU64,
    notify: broadcast::Sender<RecalculationComplete>,
}

impl RecalculationCoordinator {
    pub fn new(
        registry: Arc<EquipmentRegistry>,
        rides: Arc<dyn RideSource>,
        units: Arc<UnitSystem>,
        engine: Arc<AggregationEngine>,
    ) -> Self {
        let (notify, _) = broadcast::channel(NOTIFY_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                registry,
                rides,
                units,
                engine,
                in_flight: Mutex::new(0),
                idle: Condvar::new(),
                disabled: AtomicBool::new(false),
                importing: AtomicBool::new(false),
                passes: AtomicU64::new(0),
                notify,
            }),
        }
    }

    /// Recalculate every record in the registry.
    pub fn request_recalculation(&self, reason: &str) {
        if self.shared.admit(reason) {
            self.shared.start_all(reason);
        }
    }

    /// Recalculate one record. Unknown references are ignored.
    pub fn request_item_recalculation(&self, reference: &Uuid, reason: &str) {
        if !self.shared.admit(reason) {
            return;
        }
        match self.shared.registry.get(reference) {
            Some(record) => self.shared.start(vec![record], reason),
            None => {
                tracing::warn!(reference = %reference, reason, "Recalculation requested for unknown equipment");
                self.shared.finish();
            }
        }
    }

    /// Drop every request while set. Used during shutdown.
    pub fn disable_calculations(&self, disabled: bool) {
        self.shared.disabled.store(disabled, Ordering::SeqCst);
        tracing::debug!(disabled, "Equipment calculations toggled");
    }

    pub fn is_disabled(&self) -> bool {
        self.shared.disabled.load(Ordering::SeqCst)
    }

    /// Receive one `RecalculationComplete` per committed pass.
    pub fn subscribe(&self) -> broadcast::Receiver<RecalculationComplete> {
        self.shared.notify.subscribe()
    }

    pub fn is_running(&self) -> bool {
        *sync::lock(&self.shared.in_flight) > 0
    }

    /// Block until no pass is running or queued. Returns false on timeout.
    pub fn wait_until_idle(&self, timeout: Duration) -> bool {
        let in_flight = sync::lock(&self.shared.in_flight);
        let (in_flight, _) = self
            .shared
            .idle
            .wait_timeout_while(in_flight, timeout, |n| *n > 0)
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *in_flight == 0
    }

    pub fn passes_completed(&self) -> u64 {
        self.shared.passes.load(Ordering::SeqCst)
    }

    pub fn engine(&self) -> &Arc<AggregationEngine> {
        &self.shared.engine
    }

    /// Route a change notification to the right kind of recalculation.
    pub fn handle_event(&self, event: EquipmentEvent) {
        let reason = event.reason();
        match event {
            EquipmentEvent::RideAdded { planned } => {
                if planned {
                    tracing::debug!(reason, "Ignoring planned ride");
                } else if self.shared.importing.load(Ordering::SeqCst) {
                    tracing::debug!(reason, "Ignoring ride added during auto import");
                } else {
                    self.request_recalculation(reason);
                }
            }
            EquipmentEvent::RideChanged { planned } | EquipmentEvent::RideDeleted { planned } => {
                if planned {
                    tracing::debug!(reason, "Ignoring planned ride");
                } else {
                    self.request_recalculation(reason);
                }
            }
            EquipmentEvent::AutoImportStarted => {
                self.shared.importing.store(true, Ordering::SeqCst);
            }
            EquipmentEvent::AutoImportCompleted => {
                self.shared.importing.store(false, Ordering::SeqCst);
                self.request_recalculation(reason);
            }
            EquipmentEvent::AthleteLoaded { athlete } | EquipmentEvent::AthleteClosed { athlete } => {
                tracing::debug!(reason, athlete = %athlete, "Athlete set changed");
                self.request_recalculation(reason);
            }
            EquipmentEvent::RefreshEnd => self.request_recalculation(reason),
            EquipmentEvent::UnitsChanged(units) => {
                if !self.shared.units.set(units) {
                    tracing::debug!(reason, "Units unchanged");
                    return;
                }
                for record in self.shared.registry.records() {
                    record.units_changed(units);
                }
                self.request_recalculation(reason);
            }
            EquipmentEvent::ItemEdited { reference } => {
                self.request_item_recalculation(&reference, reason);
            }
        }
    }
}

impl Shared {
    /// Count a request. True if the caller should start a pass now.
    fn admit(&self, reason: &str) -> bool {
        if self.disabled.load(Ordering::SeqCst) {
            tracing::debug!(reason, "Calculations disabled, request dropped");
            return false;
        }
        let mut in_flight = sync::lock(&self.in_flight);
        *in_flight += 1;
        if *in_flight > 1 {
            tracing::debug!(reason, pending = *in_flight - 1, "Pass in flight, recalculation deferred");
            return false;
        }
        true
    }

    fn start_all(self: &Arc<Self>, reason: &str) {
        let targets = self.registry.records();
        self.start(targets, reason);
    }

    fn start(self: &Arc<Self>, targets: Vec<Arc<EquipmentRecord>>, reason: &str) {
        let rides = collect_rides(self.rides.as_ref());
        let shared = Arc::clone(self);
        let outcome = self.engine.start_pass(
            targets,
            rides,
            self.units.current(),
            reason,
            Box::new(move |report| shared.completed(report)),
        );
        match outcome {
            PassOutcome::Started { .. } => {}
            PassOutcome::NoRides => self.finish(),
            PassOutcome::Busy => {
                tracing::warn!(reason, "Engine busy outside coordinator, request dropped");
                self.finish();
            }
        }
    }

    fn completed(self: &Arc<Self>, report: PassReport) {
        let sequence = self.passes.fetch_add(1, Ordering::SeqCst) + 1;
        // No subscribers is fine.
        let _ = self.notify.send(RecalculationComplete { sequence, report });
        self.finish();
    }

    /// Retire the running request and start the deferred pass, if any.
    ///
    /// Called from the engine's completion, so the deferred pass is started
    /// on the last worker thread of the finished pass rather than the thread
    /// that made the request. Nothing here needs the requesting thread: the
    /// registry snapshot and ride list are shared, and requesters never block
    /// on a running pass.
    fn finish(self: &Arc<Self>) {
        let mut in_flight = sync::lock(&self.in_flight);
        *in_flight = in_flight.saturating_sub(1);
        if *in_flight > 0 && !self.disabled.load(Ordering::SeqCst) {
            *in_flight = 1;
            drop(in_flight);
            self.start_all(DEFERRED_REASON);
            return;
        }
        *in_flight = 0;
        drop(in_flight);
        self.idle.notify_all();
    }
}
