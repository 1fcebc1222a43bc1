// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Equipment-Tracker command line
//!
//! Loads rides and the equipment store, runs one full recalculation, logs
//! every record's totals and saves the store back.
//!
//! There is no tile layout here: the command reports every record, so every
//! loaded record counts as in use and is kept by the save. Orphan dropping
//! only happens in front ends that bind a subset of the records.

use equipment_tracker::{
    config::Config,
    models::{EquipmentBody, EquipmentRecord},
    services::RideLibrary,
    time_utils::{format_date, today},
    EquipmentContext,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(
        data = %config.data_path.display(),
        rides = %config.rides_path.display(),
        units = ?config.units,
        "Starting Equipment-Tracker"
    );

    let rides = RideLibrary::load_from_file(&config.rides_path).expect("Failed to load rides");
    let timeout = config.shutdown_timeout;
    let ctx = EquipmentContext::new(config, Arc::new(rides));

    ctx.load()?;
    ctx.refresh_known_tags();

    let mut completions = ctx.coordinator.subscribe();
    ctx.coordinator.request_recalculation("startup");
    if ctx.coordinator.is_running() || ctx.coordinator.passes_completed() > 0 {
        match tokio::time::timeout(timeout, completions.recv()).await {
            Ok(Ok(done)) => tracing::info!(
                sequence = done.sequence,
                elapsed_ms = done.report.elapsed.as_secs_f64() * 1000.0,
                "Recalculation finished"
            ),
            Ok(Err(e)) => tracing::warn!(error = %e, "Completion channel closed"),
            Err(_) => tracing::warn!(timeout_secs = timeout.as_secs(), "Recalculation timed out"),
        }
    } else {
        tracing::info!("No rides to aggregate");
    }

    let adopted = ctx.registry.adopt_all();
    tracing::debug!(adopted, "Reporting every equipment record");
    let today = today();
    for record in ctx.registry.records() {
        report(&record, today);
    }

    // Waiting for the pass to drain blocks on a condvar.
    let saved = tokio::task::block_in_place(|| ctx.shutdown())?;
    tracing::info!(saved = saved.saved, discarded = saved.discarded, "Shutdown complete");
    Ok(())
}

fn report(record: &EquipmentRecord, today: chrono::NaiveDate) {
    let labels = record.labels();
    let reference = record.reference();
    match record.body() {
        EquipmentBody::Item(item) => {
            let totals = item.totals();
            let alerts = item.alerts(today);
            tracing::info!(
                reference = %reference,
                chart = %labels.chart,
                tile = %labels.tile,
                activities = totals.activities,
                time_secs = totals.time_secs,
                tracked_distance = totals.tracked_distance,
                total_distance = totals.total_distance,
                tracked_elevation = totals.tracked_elevation,
                total_elevation = totals.total_elevation,
                needs_attention = alerts.needs_attention(),
                "Equipment item"
            );
        }
        EquipmentBody::Summary(summary) => {
            let totals = summary.totals();
            let config = summary.config();
            tracing::info!(
                reference = %reference,
                chart = %labels.chart,
                tile = %labels.tile,
                tag = %config.tag(),
                activities = totals.activities,
                distance = totals.distance,
                elevation = totals.elevation,
                time_secs = totals.time_secs,
                earliest = %format_date(totals.earliest),
                latest = %format_date(totals.latest),
                athletes = ?totals.per_athlete,
                "Equipment summary"
            );
        }
        EquipmentBody::History(history) => {
            tracing::info!(
                reference = %reference,
                tile = %labels.tile,
                entries = history.config().entries.len(),
                "Equipment history"
            );
        }
        EquipmentBody::Notes(_) => {
            tracing::debug!(reference = %reference, tile = %labels.tile, "Equipment notes");
        }
    }
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("equipment_tracker=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
