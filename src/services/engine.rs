// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Aggregation engine: one scan-then-commit pass over a target record set.
//!
//! The control thread resets every target and spawns a small pool of
//! worker threads. Workers pull rides one at a time from a shared stack and
//! offer each ride to every target. The last worker to finish commits every
//! target and reports completion; the control thread never waits.

use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crate::models::{Accumulate, EquipmentRecord, RideRecord};
use crate::sync;
use crate::units::Units;

/// Ratio of available hardware threads given to a pass; per-ride work is
/// light and never blocks on I/O.
const THREAD_DIVISOR: usize = 3;

/// Engine state machine: `Idle -> Scanning -> Committing -> Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EnginePhase {
    Idle = 0,
    Scanning = 1,
    Committing = 2,
}

impl EnginePhase {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => EnginePhase::Scanning,
            2 => EnginePhase::Committing,
            _ => EnginePhase::Idle,
        }
    }
}

/// Statistics of a committed pass.
#[derive(Debug, Clone)]
pub struct PassReport {
    pub reason: String,
    pub rides: usize,
    pub targets: usize,
    pub workers: usize,
    pub elapsed: Duration,
}

/// Result of asking the engine to start a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    /// Workers are running; the completion callback will fire once
    Started { workers: usize },
    /// Nothing to scan; no record was touched and no callback will fire
    NoRides,
    /// Another pass is still in flight; nothing was touched
    Busy,
}

/// Called by the last worker once every target is committed.
pub type CompletionFn = Box<dyn FnOnce(PassReport) + Send + 'static>;

/// Worker count for a pass: a third of the hardware threads, at least one.
pub fn default_worker_count() -> usize {
    let available = thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    (available / THREAD_DIVISOR).max(1)
}

pub struct AggregationEngine {
    workers: usize,
    phase: Arc<AtomicU8>,
    /// Latch handed to the next pass; its workers wait on it (test builds only).
    #[cfg(test)]
    hold: Mutex<Option<Arc<PassLatch>>>,
}

impl AggregationEngine {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
            phase: Arc::new(AtomicU8::new(EnginePhase::Idle as u8)),
            #[cfg(test)]
            hold: Mutex::new(None),
        }
    }

    pub fn with_default_workers() -> Self {
        Self::new(default_worker_count())
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn phase(&self) -> EnginePhase {
        EnginePhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    /// Keep the next pass's workers parked until the latch is released
    /// (test builds only).
    #[cfg(test)]
    pub(crate) fn hold_next_pass(&self) -> Arc<PassLatch> {
        let latch = Arc::new(PassLatch::default());
        *sync::lock(&self.hold) = Some(Arc::clone(&latch));
        latch
    }

    /// Start a pass over `targets` and return without waiting for it.
    ///
    /// `rides` must already exclude planned rides. Ride values are converted
    /// to `units` before they are offered to the targets.
    pub fn start_pass(
        &self,
        targets: Vec<Arc<EquipmentRecord>>,
        rides: Vec<Arc<RideRecord>>,
        units: Units,
        reason: &str,
        on_complete: CompletionFn,
    ) -> PassOutcome {
        if self
            .phase
            .compare_exchange(
                EnginePhase::Idle as u8,
                EnginePhase::Scanning as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            tracing::debug!(reason, "Pass requested while another is in flight");
            return PassOutcome::Busy;
        }

        if rides.is_empty() {
            self.phase.store(EnginePhase::Idle as u8, Ordering::Release);
            tracing::debug!(reason, targets = targets.len(), "No rides to scan, pass skipped");
            return PassOutcome::NoRides;
        }

        for target in &targets {
            target.start_of_calculation();
        }

        let workers = self.workers.min(rides.len());
        tracing::info!(
            reason,
            rides = rides.len(),
            targets = targets.len(),
            workers,
            "Starting equipment recalculation"
        );

        let pass = Arc::new(Pass {
            reason: reason.to_string(),
            units,
            rides: rides.len(),
            queue: Mutex::new(rides),
            targets,
            workers,
            remaining: AtomicUsize::new(workers),
            started: Instant::now(),
            phase: Arc::clone(&self.phase),
            on_complete: Mutex::new(Some(on_complete)),
            #[cfg(test)]
            latch: sync::lock(&self.hold).take(),
        });

        for index in 0..workers {
            let worker_pass = Arc::clone(&pass);
            let spawned = thread::Builder::new()
                .name(format!("equipment-calc-{}", index))
                .spawn(move || worker_pass.run_worker());
            if let Err(e) = spawned {
                // The pass still needs this worker's countdown; run it here.
                tracing::warn!(error = %e, index, "Failed to spawn worker, scanning inline");
                pass.run_worker();
            }
        }

        PassOutcome::Started { workers }
    }

    /// Run a pass and block until it is committed.
    ///
    /// Returns `None` if the pass did not start.
    pub fn scan(
        &self,
        targets: Vec<Arc<EquipmentRecord>>,
        rides: Vec<Arc<RideRecord>>,
        units: Units,
        reason: &str,
    ) -> Option<PassReport> {
        let (tx, rx) = mpsc::channel();
        let outcome = self.start_pass(
            targets,
            rides,
            units,
            reason,
            Box::new(move |report| {
                let _ = tx.send(report);
            }),
        );
        match outcome {
            PassOutcome::Started { .. } => rx.recv().ok(),
            PassOutcome::NoRides | PassOutcome::Busy => None,
        }
    }
}

/// Shared state of one in-flight pass.
struct Pass {
    reason: String,
    units: Units,
    rides: usize,
    queue: Mutex<Vec<Arc<RideRecord>>>,
    targets: Vec<Arc<EquipmentRecord>>,
    workers: usize,
    remaining: AtomicUsize,
    started: Instant,
    phase: Arc<AtomicU8>,
    on_complete: Mutex<Option<CompletionFn>>,
    #[cfg(test)]
    latch: Option<Arc<PassLatch>>,
}

impl Pass {
    fn next_ride(&self) -> Option<Arc<RideRecord>> {
        sync::lock(&self.queue).pop()
    }

    fn run_worker(&self) {
        #[cfg(test)]
        if let Some(latch) = &self.latch {
            latch.wait();
        }

        while let Some(ride) = self.next_ride() {
            let sample = ride.sample(self.units);
            for target in &self.targets {
                target.add_activity(&sample);
            }
        }

        // AcqRel: every worker's accumulator adds happen-before the commit.
        if self.remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.commit();
        }
    }

    fn commit(&self) {
        self.phase
            .store(EnginePhase::Committing as u8, Ordering::Release);

        for target in &self.targets {
            target.end_of_calculation();
        }

        let report = PassReport {
            reason: self.reason.clone(),
            rides: self.rides,
            targets: self.targets.len(),
            workers: self.workers,
            elapsed: self.started.elapsed(),
        };
        tracing::info!(
            reason = %report.reason,
            workers = report.workers,
            targets = report.targets,
            rides = report.rides,
            elapsed_ms = report.elapsed.as_secs_f64() * 1000.0,
            "Equipment recalculation complete"
        );

        self.phase.store(EnginePhase::Idle as u8, Ordering::Release);

        let callback = sync::lock(&self.on_complete).take();
        if let Some(callback) = callback {
            callback(report);
        }
    }
}

/// One-shot gate parking a pass's workers (test builds only).
#[cfg(test)]
#[derive(Default)]
pub(crate) struct PassLatch {
    open: Mutex<bool>,
    opened: std::sync::Condvar,
}

#[cfg(test)]
impl PassLatch {
    fn wait(&self) {
        let mut open = sync::lock(&self.open);
        while !*open {
            open = self
                .opened
                .wait(open)
                .unwrap_or_else(std::sync::PoisonError::into_inner);
        }
    }

    pub(crate) fn release(&self) {
        *sync::lock(&self.open) = true;
        self.opened.notify_all();
    }
}
