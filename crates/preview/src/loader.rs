//! Store preview loader.
//!
//! Fetches measured and forecast rows concurrently, waits for both, and only
//! then reconciles. Every load takes a ticket from a shared generation
//! counter; a load whose ticket was superseded (a newer load started, or the
//! caller invalidated) returns `Ok(None)` instead of a result.

use crate::source::{ForecastKind, PreviewSource};
use chrono::NaiveDate;
use megribi_core::config::{RangeConfig, StoresConfig};
use megribi_core::{Config, Error, NightWindow, RangeMode, Result, StoreMeta, StoreSnapshot, Timestamp};
use megribi_ingestion::{DecodeStats, PayloadDecoder};
use megribi_series::{NightClock, NightWindowReconciler, SnapshotBuilder};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Shared generation counter.
#[derive(Debug, Clone, Default)]
pub struct RequestGuard {
    generation: Arc<AtomicU64>,
}

impl RequestGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request, superseding all earlier tickets.
    pub fn issue(&self) -> RequestTicket {
        let id = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        RequestTicket {
            id,
            generation: Arc::clone(&self.generation),
        }
    }

    /// Supersede all outstanding tickets without starting a request.
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

/// Proof that a request is still the latest one.
#[derive(Debug, Clone)]
pub struct RequestTicket {
    id: u64,
    generation: Arc<AtomicU64>,
}

impl RequestTicket {
    /// Whether no newer request was issued since this one.
    pub fn is_current(&self) -> bool {
        self.generation.load(Ordering::SeqCst) == self.id
    }
}

/// Result of a completed load.
#[derive(Debug, Clone)]
pub struct PreviewOutcome {
    /// Base date of the night shown.
    pub base_date: NaiveDate,
    /// Window the rows were restricted to.
    pub window: NightWindow,
    pub snapshot: StoreSnapshot,
    /// Decoding statistics for both bodies.
    pub stats: DecodeStats,
}

/// Loads store snapshots from a source.
pub struct PreviewLoader<S: PreviewSource> {
    source: Arc<S>,
    clock: NightClock,
    reconciler: NightWindowReconciler,
    snapshots: SnapshotBuilder,
    stores: StoresConfig,
    range: RangeConfig,
    guard: RequestGuard,
}

impl<S: PreviewSource> PreviewLoader<S> {
    /// Create a new loader.
    pub fn new(source: Arc<S>, config: &Config) -> Result<Self> {
        config.validate()?;
        let clock = NightClock::from_config(&config.night)?;
        Ok(Self {
            source,
            reconciler: NightWindowReconciler::new(clock.tz()),
            clock,
            snapshots: SnapshotBuilder::new(config.stores.clone(), &config.night),
            stores: config.stores.clone(),
            range: config.range.clone(),
            guard: RequestGuard::new(),
        })
    }

    /// Guard shared by all loads of this loader.
    pub fn guard(&self) -> &RequestGuard {
        &self.guard
    }

    /// Night clock used for window selection.
    pub fn clock(&self) -> &NightClock {
        &self.clock
    }

    /// Supersede any load in flight.
    pub fn invalidate(&self) {
        self.guard.invalidate();
    }

    /// Resolve a store slug, falling back to the default store.
    pub fn resolve_store(&self, slug: Option<&str>) -> Result<&StoreMeta> {
        self.stores
            .resolve(slug)
            .ok_or_else(|| Error::config("no store configured"))
    }

    /// Snapshot shown while a load is in flight or after it failed.
    pub fn placeholder(&self, slug: Option<&str>) -> Result<StoreSnapshot> {
        Ok(self.snapshots.placeholder(self.resolve_store(slug)?))
    }

    /// Load the snapshot for a store and range mode.
    ///
    /// Returns `Ok(None)` when a newer load superseded this one while the
    /// fetches were in flight, whatever their outcome.
    pub async fn load(&self, slug: Option<&str>, mode: RangeMode, now: Timestamp) -> Result<Option<PreviewOutcome>> {
        let meta = self.resolve_store(slug)?.clone();
        let ticket = self.guard.issue();

        let base_date = self.clock.base_date_for_mode(&mode, now);
        let window = self.clock.window_for_date(base_date);
        let limit = self.range.limit_for(&mode);

        let range_fut = self.source.fetch_range(&meta.slug, limit);
        let forecast_fut = async {
            if mode.fetches_forecast() {
                self.source
                    .fetch_forecast(&meta.slug, ForecastKind::Today)
                    .await
                    .map(Some)
            } else {
                Ok(None)
            }
        };
        let (range_raw, forecast_raw) = tokio::join!(range_fut, forecast_fut);

        if !ticket.is_current() {
            debug!(store = %meta.slug, "discarding superseded preview load");
            return Ok(None);
        }

        let range_raw = range_raw?;
        let forecast_raw = forecast_raw?;

        let mut decoder = PayloadDecoder::new(self.clock.tz());
        let actuals = decoder.decode_range(&range_raw);
        let forecasts = forecast_raw
            .map(|raw| decoder.decode_forecast(&raw))
            .unwrap_or_default();

        let series = self.reconciler.reconcile(actuals, forecasts, &window);
        let snapshot = self.snapshots.build(&meta, series);

        info!(
            store = %meta.slug,
            %base_date,
            entries = snapshot.series.len(),
            has_data = snapshot.has_data,
            dropped = decoder.stats().dropped_timestamps,
            "preview loaded"
        );

        Ok(Some(PreviewOutcome {
            base_date,
            window,
            snapshot,
            stats: decoder.stats().clone(),
        }))
    }
}
