//! High-level service facade combining storage, scoring, detection,
//! prediction, and planning.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, NaiveDateTime, Utc};
use rand::rngs::StdRng;

use crate::model::{
    Alert, Bin, BinId, BinStatus, DEFAULT_BATTERY_LEVEL, DEFAULT_CAPACITY,
    DEFAULT_SIGNAL_STRENGTH, DEFAULT_TEMPERATURE, Priority, TelemetryReading, TelemetryUpdate,
    WasteType,
};
use crate::ports::{FillRateModel, StorageBackend, StoreError};
use crate::predict::{self, OverflowForecast};
use crate::route::{self, NavigationEstimate, RoutePlan};
use crate::stats::{self, SystemStats};
use crate::{alerts, demo, scoring};

#[derive(Debug, Clone)]
/// What one telemetry ingestion produced.
pub struct IngestOutcome {
    /// The stored bin with freshly derived fields.
    pub bin: Bin,
    /// Alerts fired by this update.
    pub alerts: Vec<Alert>,
}

/// Public entry point for telemetry ingestion and all read operations.
///
/// Every method computes over a snapshot read from the backend; nothing is
/// cached between calls, so concurrent callers never observe shared mutable
/// state beyond the store itself.
pub struct FleetService {
    backend: StorageBackend,
    fill_model: Option<Arc<dyn FillRateModel>>,
    rng: Mutex<StdRng>,
}

impl FleetService {
    /// Create a service over the given backend. The rng feeds every
    /// randomness-dependent path (fill-rate jitter, navigation traffic,
    /// demo seeding), so a seeded rng makes the service deterministic.
    #[must_use]
    pub fn new(
        backend: StorageBackend,
        fill_model: Option<Arc<dyn FillRateModel>>,
        rng: StdRng,
    ) -> Self {
        Self {
            backend,
            fill_model,
            rng: Mutex::new(rng),
        }
    }

    /// Short name of the active storage backend, for health reporting.
    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        self.backend.name
    }

    /// Ingest one telemetry update: resolve defaults, recompute the derived
    /// fields, replace the stored record, append the timeseries reading, and
    /// run alert detection. Safe to call with untrusted but well-typed input;
    /// out-of-range readings are clamped here, at the ingestion boundary.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when a backend write fails.
    pub async fn ingest(
        &self,
        id: BinId,
        update: TelemetryUpdate,
        now: DateTime<Utc>,
    ) -> Result<IngestOutcome, StoreError> {
        let bin = resolve_update(id, update, now);

        self.backend.bins.upsert(bin.clone()).await?;
        self.backend
            .bins
            .append_reading(reading_for(&bin, now))
            .await?;

        let fired = alerts::detect(&bin, now);
        if !fired.is_empty() {
            self.backend.alerts.append(&fired).await?;
        }

        Ok(IngestOutcome { bin, alerts: fired })
    }

    /// Full bin listing sorted by (priority score, fill level) descending,
    /// plus the fleet-wide stats roll-up.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the backend read fails.
    pub async fn overview(
        &self,
        now: DateTime<Utc>,
    ) -> Result<(Vec<Bin>, SystemStats), StoreError> {
        let mut bins = self.backend.bins.list().await?;
        bins.sort_by(|left, right| {
            right
                .priority_score
                .total_cmp(&left.priority_score)
                .then_with(|| right.fill_level.cmp(&left.fill_level))
        });
        let summary = stats::summarize(&bins, now);
        Ok((bins, summary))
    }

    /// Plan a collection route over the current snapshot.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the backend read fails.
    pub async fn optimize_route(&self, now: DateTime<Utc>) -> Result<RoutePlan, StoreError> {
        let bins = self.backend.bins.list().await?;
        Ok(route::plan(&bins, route::DEPOT, now))
    }

    /// Fetch one bin by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::BinNotFound`] for unknown ids, or another
    /// [`StoreError`] when the backend read fails.
    pub async fn get_bin(&self, id: &BinId) -> Result<Bin, StoreError> {
        self.backend
            .bins
            .get(id)
            .await?
            .ok_or(StoreError::BinNotFound)
    }

    /// Overflow forecast for one bin. The daily fill rate comes from the
    /// trained model when one is configured and covers the bin, otherwise
    /// from the jittered heuristic table.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::BinNotFound`] for unknown ids, or another
    /// [`StoreError`] when the backend read fails.
    pub async fn forecast(
        &self,
        id: &BinId,
        now: DateTime<Utc>,
    ) -> Result<OverflowForecast, StoreError> {
        let bin = self
            .backend
            .bins
            .get(id)
            .await?
            .ok_or(StoreError::BinNotFound)?;

        let daily_rate = match self.fill_model.as_ref().and_then(|model| model.daily_rate(&bin)) {
            Some(rate) => rate,
            None => predict::heuristic_fill_rate(bin.waste_type, &mut *self.rng_lock()),
        };

        Ok(predict::predict(&bin, now, daily_rate))
    }

    /// Driving estimate from the depot to one bin.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::BinNotFound`] for unknown ids, or another
    /// [`StoreError`] when the backend read fails.
    pub async fn navigate(&self, id: &BinId) -> Result<NavigationEstimate, StoreError> {
        let bin = self
            .backend
            .bins
            .get(id)
            .await?
            .ok_or(StoreError::BinNotFound)?;

        let estimate = route::navigate(&bin, route::DEPOT, &mut *self.rng_lock());
        Ok(estimate)
    }

    /// Fresh detection pass over the current snapshot. Alert ids are
    /// deterministic, so repeated passes over unchanged bins re-emit the
    /// same alerts for callers that dedup by id.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the backend read fails.
    pub async fn active_alerts(&self, now: DateTime<Utc>) -> Result<Vec<Alert>, StoreError> {
        let bins = self.backend.bins.list().await?;
        Ok(bins
            .iter()
            .flat_map(|bin| alerts::detect(bin, now))
            .collect())
    }

    /// Alerts recorded at ingestion time, from the log.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the backend read fails.
    pub async fn alert_history(&self) -> Result<Vec<Alert>, StoreError> {
        self.backend.alerts.active().await
    }

    /// Number of bins currently known to the store.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the backend read fails.
    pub async fn bin_count(&self) -> Result<usize, StoreError> {
        Ok(self.backend.bins.list().await?.len())
    }

    /// Seed the store with the demo fleet: the five fixed bins plus `extra`
    /// randomly scattered ones. Returns how many bins were written.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when a backend write fails.
    pub async fn seed_demo(&self, extra: usize, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let bins = {
            let mut rng = self.rng_lock();
            demo::demo_fleet(extra, now, &mut *rng)
        };

        let count = bins.len();
        for bin in bins {
            self.backend.bins.upsert(bin).await?;
        }
        Ok(count)
    }

    fn rng_lock(&self) -> MutexGuard<'_, StdRng> {
        // A poisoned rng mutex only means another thread panicked mid-draw;
        // the generator state is still usable.
        self.rng.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Build the stored bin from a raw update, resolving documented defaults
/// and clamping out-of-range numerics, then derive priority, score, and
/// status.
fn resolve_update(id: BinId, update: TelemetryUpdate, now: DateTime<Utc>) -> Bin {
    let waste_type = update
        .bin_type
        .map_or(WasteType::General, WasteType::from);

    let location = update
        .location_name
        .unwrap_or_else(|| format!("Location {id}"));
    let address = update.address.unwrap_or_else(|| format!("Address for {id}"));

    let fill_level = clamp_to_u8(update.fill_percentage.unwrap_or(0), 100);
    let hazard_score = clamp_to_u8(update.hazard_score.unwrap_or(1), 10);

    // A sensor timestamp that fails to parse is tolerated: the bin keeps no
    // last-update and the scoring/risk time factors use their defaults.
    let last_update = match update.timestamp.as_deref() {
        Some(raw) => parse_sensor_timestamp(raw),
        None => Some(now),
    };

    let mut bin = Bin {
        id,
        waste_type,
        location,
        address,
        fill_level,
        capacity: update.capacity.unwrap_or(DEFAULT_CAPACITY),
        hazard_score,
        coordinates: update.coordinates.unwrap_or(route::DEPOT),
        battery_level: update.battery_level.unwrap_or(DEFAULT_BATTERY_LEVEL),
        temperature: update.temperature.unwrap_or(DEFAULT_TEMPERATURE),
        weight: update.weight.unwrap_or(0.0),
        signal_strength: update.signal_strength.unwrap_or(DEFAULT_SIGNAL_STRENGTH),
        last_update,
        status: BinStatus::Normal,
        priority: Priority::Low,
        priority_score: 0.0,
    };
    scoring::classify(&mut bin, now);
    bin
}

fn reading_for(bin: &Bin, now: DateTime<Utc>) -> TelemetryReading {
    TelemetryReading {
        bin_id: bin.id.clone(),
        timestamp: bin.last_update.unwrap_or(now),
        fill_level: bin.fill_level,
        temperature: bin.temperature,
        weight: bin.weight,
        hazard_score: bin.hazard_score,
        battery_level: bin.battery_level,
    }
}

fn clamp_to_u8(value: i64, max: u8) -> u8 {
    value.clamp(0, i64::from(max)) as u8
}

/// Parse a sensor-reported timestamp: RFC 3339 first, then the bare ISO
/// format some simulators emit (no offset, assumed UTC).
fn parse_sensor_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|parsed| parsed.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}
