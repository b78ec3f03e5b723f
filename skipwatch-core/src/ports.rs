//! Traits describing storage backends and the optional fill-rate estimator.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Error as ReqwestError;

use crate::model::{Alert, Bin, BinId, TelemetryReading};

#[derive(thiserror::Error, Debug)]
/// Errors that can occur while talking to storage backends.
pub enum StoreError {
    /// Network layer failed while talking to a remote store.
    #[error("Network error: {0}")]
    Network(#[from] ReqwestError),
    /// A stored document could not be decoded into a domain type.
    #[error("Decode error: {0}")]
    Decode(String),
    /// Requested bin does not exist.
    #[error("Bin not found")]
    BinNotFound,
    /// Backend rejected or could not complete the request; retryable.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    /// Internal backend error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[async_trait]
/// Key-value repository of bin records plus the per-update timeseries.
///
/// Implementations must provide read-after-write consistency per bin id;
/// the core makes no ordering assumptions across different bins.
pub trait BinStore: Send + Sync {
    /// All bins currently known to the store.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the backend request fails.
    async fn list(&self) -> Result<Vec<Bin>, StoreError>;

    /// Fetch one bin by id; `None` when the id is unknown.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the backend request fails.
    async fn get(&self, id: &BinId) -> Result<Option<Bin>, StoreError>;

    /// Insert or fully replace a bin record (writes replace, never patch).
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the backend request fails.
    async fn upsert(&self, bin: Bin) -> Result<(), StoreError>;

    /// Append one record to the per-update telemetry timeseries.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the backend request fails.
    async fn append_reading(&self, reading: TelemetryReading) -> Result<(), StoreError>;
}

#[async_trait]
/// Log of alerts fired at ingestion time. The core only appends; closing
/// stale alerts is the collaborator's business.
pub trait AlertLog: Send + Sync {
    /// Record freshly fired alerts. Implementations dedup by alert id.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the backend request fails.
    async fn append(&self, alerts: &[Alert]) -> Result<(), StoreError>;

    /// Alerts still marked active.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the backend request fails.
    async fn active(&self) -> Result<Vec<Alert>, StoreError>;
}

/// Externally trained estimator for a bin's daily fill rate in percent per
/// day. `None` falls back to the jittered heuristic table.
pub trait FillRateModel: Send + Sync {
    /// Estimated fill rate for this bin, if the model covers it.
    fn daily_rate(&self, bin: &Bin) -> Option<f64>;
}

#[derive(Clone)]
/// Bundle of storage ports selected at startup.
pub struct StorageBackend {
    /// Short backend name reported by health checks (`"memory"`, ...).
    pub name: &'static str,
    /// Bin repository implementation.
    pub bins: Arc<dyn BinStore>,
    /// Alert log implementation.
    pub alerts: Arc<dyn AlertLog>,
}
