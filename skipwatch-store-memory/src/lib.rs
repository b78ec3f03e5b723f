//! In-process storage backend. Keeps the whole fleet in HashMaps behind
//! async read-write locks; the fallback repository when no document store
//! is configured, and the backend the operator console runs on.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use skipwatch_core::model::{Alert, AlertId, Bin, BinId, TelemetryReading};
use skipwatch_core::ports::{AlertLog, BinStore, StorageBackend, StoreError};

/// Fleet state held entirely in process memory.
///
/// Reads return point-in-time clones, so callers always work on a
/// consistent snapshot per bin; writes replace whole records.
#[derive(Default)]
pub struct MemoryStore {
    bins: RwLock<HashMap<BinId, Bin>>,
    alerts: RwLock<HashMap<AlertId, Alert>>,
    readings: RwLock<Vec<TelemetryReading>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bundle a fresh store into the port set the service expects.
    #[must_use]
    pub fn backend() -> StorageBackend {
        let store = Arc::new(MemoryStore::new());
        StorageBackend {
            name: "memory",
            bins: Arc::clone(&store) as Arc<dyn BinStore>,
            alerts: store,
        }
    }

    /// Point-in-time copy of the telemetry timeseries, oldest first.
    pub async fn readings(&self) -> Vec<TelemetryReading> {
        self.readings.read().await.clone()
    }
}

#[async_trait]
impl BinStore for MemoryStore {
    async fn list(&self) -> Result<Vec<Bin>, StoreError> {
        let mut bins: Vec<Bin> = self.bins.read().await.values().cloned().collect();
        // HashMap iteration order is arbitrary; keep listings stable.
        bins.sort_by(|left, right| left.id.0.cmp(&right.id.0));
        Ok(bins)
    }

    async fn get(&self, id: &BinId) -> Result<Option<Bin>, StoreError> {
        Ok(self.bins.read().await.get(id).cloned())
    }

    async fn upsert(&self, bin: Bin) -> Result<(), StoreError> {
        self.bins.write().await.insert(bin.id.clone(), bin);
        Ok(())
    }

    async fn append_reading(&self, reading: TelemetryReading) -> Result<(), StoreError> {
        self.readings.write().await.push(reading);
        Ok(())
    }
}

#[async_trait]
impl AlertLog for MemoryStore {
    async fn append(&self, alerts: &[Alert]) -> Result<(), StoreError> {
        let mut log = self.alerts.write().await;
        for alert in alerts {
            // Deterministic ids: re-detection of an unchanged condition
            // replaces the entry instead of duplicating it.
            log.insert(alert.id.clone(), alert.clone());
        }
        Ok(())
    }

    async fn active(&self) -> Result<Vec<Alert>, StoreError> {
        let mut alerts: Vec<Alert> = self
            .alerts
            .read()
            .await
            .values()
            .filter(|alert| alert.active)
            .cloned()
            .collect();
        alerts.sort_by(|left, right| left.id.0.cmp(&right.id.0));
        Ok(alerts)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use skipwatch_core::model::{AlertKind, BinStatus, Coordinates, Priority, TelemetryUpdate};
    use skipwatch_core::service::FleetService;

    use super::*;

    fn service() -> FleetService {
        FleetService::new(MemoryStore::backend(), None, StdRng::seed_from_u64(1))
    }

    fn update(fill: i64, hazard: i64) -> TelemetryUpdate {
        TelemetryUpdate {
            bin_type: Some("Organic Waste".to_owned()),
            location_name: Some("Harbor Market".to_owned()),
            fill_percentage: Some(fill),
            hazard_score: Some(hazard),
            coordinates: Some(Coordinates {
                lat: 40.71,
                lng: -74.01,
            }),
            temperature: Some(24.0),
            weight: Some(31.5),
            ..TelemetryUpdate::default()
        }
    }

    #[tokio::test]
    async fn ingest_stores_the_classified_bin_and_reading() {
        let fleet = service();
        let now = Utc::now();

        let outcome = fleet
            .ingest(BinId("BIN100".to_owned()), update(55, 2), now)
            .await
            .expect("ingest succeeds");

        assert_eq!(outcome.bin.priority, Priority::Medium);
        assert_eq!(outcome.bin.status, BinStatus::Normal);
        assert!(outcome.alerts.is_empty());

        let (bins, stats) = fleet.overview(now).await.expect("overview succeeds");
        assert_eq!(bins.len(), 1);
        assert_eq!(stats.total_bins, 1);
        assert!((stats.average_fill - 55.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn ingest_replaces_rather_than_patches() {
        let fleet = service();
        let now = Utc::now();
        let id = BinId("BIN101".to_owned());

        fleet
            .ingest(id.clone(), update(90, 8), now)
            .await
            .expect("first ingest");
        // Second update omits most fields; defaults must replace the old
        // values instead of leaking through.
        let sparse = TelemetryUpdate {
            fill_percentage: Some(10),
            ..TelemetryUpdate::default()
        };
        let outcome = fleet
            .ingest(id.clone(), sparse, now)
            .await
            .expect("second ingest");

        assert_eq!(outcome.bin.location, "Location BIN101");
        assert_eq!(outcome.bin.fill_level, 10);
        assert_eq!(outcome.bin.hazard_score, 1);
        assert_eq!(outcome.bin.status, BinStatus::Normal);
    }

    #[tokio::test]
    async fn ingest_logs_alerts_and_detection_pass_re_emits_them() {
        let fleet = service();
        let now = Utc::now();

        let outcome = fleet
            .ingest(BinId("BIN102".to_owned()), update(88, 9), now)
            .await
            .expect("ingest succeeds");
        assert_eq!(outcome.alerts.len(), 2);

        let logged = fleet.alert_history().await.expect("history succeeds");
        assert_eq!(logged.len(), 2);

        let detected = fleet.active_alerts(now).await.expect("detection succeeds");
        assert_eq!(detected.len(), 2);
        assert!(
            detected
                .iter()
                .any(|alert| alert.kind == AlertKind::Overflow)
        );
        assert!(detected.iter().any(|alert| alert.kind == AlertKind::Hazard));

        // Ingesting the same snapshot again must not duplicate log entries.
        fleet
            .ingest(BinId("BIN102".to_owned()), update(88, 9), now)
            .await
            .expect("repeat ingest");
        let logged_again = fleet.alert_history().await.expect("history succeeds");
        assert_eq!(logged_again.len(), 2);
    }

    #[tokio::test]
    async fn route_covers_only_candidates_and_respects_the_cap() {
        let fleet = service();
        let now = Utc::now();

        for index in 0..10_i64 {
            fleet
                .ingest(
                    BinId(format!("BIN2{index:02}")),
                    update(75 + index, 0),
                    now,
                )
                .await
                .expect("ingest succeeds");
        }
        // One quiet bin that must not make the route.
        fleet
            .ingest(
                BinId("BIN299".to_owned()),
                TelemetryUpdate {
                    bin_type: Some("Recycling".to_owned()),
                    fill_percentage: Some(5),
                    hazard_score: Some(0),
                    ..TelemetryUpdate::default()
                },
                now,
            )
            .await
            .expect("ingest succeeds");

        let plan = fleet.optimize_route(now).await.expect("plan succeeds");
        assert_eq!(plan.route.len(), 6);
        assert!(
            plan.route
                .iter()
                .all(|stop| stop.bin_id.0.starts_with("BIN2") && stop.bin_id.0 != "BIN299")
        );
        assert_eq!(plan.summary.total_stops, 6);
    }

    #[tokio::test]
    async fn forecast_and_navigate_require_a_known_bin() {
        let fleet = service();
        let now = Utc::now();
        let missing = BinId("NOPE".to_owned());

        assert!(matches!(
            fleet.forecast(&missing, now).await,
            Err(StoreError::BinNotFound)
        ));
        assert!(matches!(
            fleet.navigate(&missing).await,
            Err(StoreError::BinNotFound)
        ));

        fleet
            .ingest(BinId("BIN300".to_owned()), update(60, 1), now)
            .await
            .expect("ingest succeeds");

        let forecast = fleet
            .forecast(&BinId("BIN300".to_owned()), now)
            .await
            .expect("forecast succeeds");
        // Organic baseline 12 %/day with jitter in [-2, +3).
        assert!((10.0..15.0).contains(&forecast.predictions.daily_fill_rate_percent));

        let estimate = fleet
            .navigate(&BinId("BIN300".to_owned()))
            .await
            .expect("navigate succeeds");
        assert!(estimate.distance_km >= 2.3);
    }

    #[tokio::test]
    async fn seed_demo_populates_the_fleet_deterministically() {
        let fleet = service();
        let other = service();
        let now = Utc::now();

        let seeded = fleet.seed_demo(10, now).await.expect("seeding succeeds");
        assert_eq!(seeded, 15);
        let again = other.seed_demo(10, now).await.expect("seeding succeeds");
        assert_eq!(again, 15);

        let (first, _) = fleet.overview(now).await.expect("overview succeeds");
        let (second, _) = other.overview(now).await.expect("overview succeeds");
        for (left, right) in first.iter().zip(&second) {
            assert_eq!(left.id, right.id);
            assert_eq!(left.fill_level, right.fill_level);
        }
    }

    #[tokio::test]
    async fn timeseries_grows_by_one_record_per_ingest() {
        let store = Arc::new(MemoryStore::new());
        let backend = StorageBackend {
            name: "memory",
            bins: Arc::clone(&store) as Arc<dyn BinStore>,
            alerts: Arc::clone(&store) as Arc<dyn AlertLog>,
        };
        let fleet = FleetService::new(backend, None, StdRng::seed_from_u64(5));
        let now = Utc::now();

        fleet
            .ingest(BinId("BIN400".to_owned()), update(20, 0), now)
            .await
            .expect("ingest succeeds");
        fleet
            .ingest(BinId("BIN400".to_owned()), update(25, 0), now)
            .await
            .expect("ingest succeeds");

        let readings = store.readings().await;
        assert_eq!(readings.len(), 2);
        assert_eq!(readings.first().expect("two readings").fill_level, 20);
        assert_eq!(readings.get(1).expect("two readings").fill_level, 25);
    }
}
