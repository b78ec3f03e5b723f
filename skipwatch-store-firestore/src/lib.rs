//! Storage backend speaking the Firestore REST API.
//!
//! One document per bin in `bins/{id}`, one per alert in `alerts/{id}`, and
//! an append-only `bin_timeseries` collection with one auto-id document per
//! ingested update. Against production Firestore a bearer token must be
//! supplied; the emulator accepts unauthenticated requests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use skipwatch_core::model::{
    Alert, AlertId, AlertKind, Bin, BinId, BinStatus, Coordinates, Priority, Severity,
    TelemetryReading, WasteType,
};
use skipwatch_core::ports::{AlertLog, BinStore, StorageBackend, StoreError};

const PRODUCTION_BASE_URL: &str = "https://firestore.googleapis.com/v1";

const BINS_COLLECTION: &str = "bins";
const ALERTS_COLLECTION: &str = "alerts";
const TIMESERIES_COLLECTION: &str = "bin_timeseries";

/// Collections are small (a municipal fleet, not a data lake); a single
/// page covers them.
const PAGE_SIZE: u32 = 1000;

#[derive(Debug, Clone)]
/// Connection settings for a Firestore project.
pub struct FirestoreConfig {
    /// GCP project id owning the database.
    pub project_id: String,
    /// OAuth bearer token; `None` when talking to the emulator.
    pub token: Option<String>,
    /// Override for the API base URL, e.g. an emulator endpoint.
    pub base_url: Option<String>,
}

/// Firestore-backed implementation of both storage ports.
pub struct FirestoreStore {
    client: Client,
    config: FirestoreConfig,
}

impl FirestoreStore {
    /// Create a store bound to the given HTTP client and project.
    #[must_use]
    pub fn new(client: Client, config: FirestoreConfig) -> Self {
        Self { client, config }
    }

    /// Bundle a store into the port set the service expects.
    #[must_use]
    pub fn backend(client: Client, config: FirestoreConfig) -> StorageBackend {
        let store = Arc::new(FirestoreStore::new(client, config));
        StorageBackend {
            name: "firestore",
            bins: Arc::clone(&store) as Arc<dyn BinStore>,
            alerts: store,
        }
    }

    fn documents_url(&self, collection: &str) -> String {
        let base = self
            .config
            .base_url
            .as_deref()
            .unwrap_or(PRODUCTION_BASE_URL);
        format!(
            "{base}/projects/{}/databases/(default)/documents/{collection}",
            self.config.project_id
        )
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{id}", self.documents_url(collection))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.config.token.as_deref() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn list_documents(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let request = self
            .client
            .get(self.documents_url(collection))
            .query(&[("pageSize", PAGE_SIZE.to_string())]);
        let response: ListResponse = fetch_json(self.authorize(request)).await?;
        Ok(response.documents.unwrap_or_default())
    }
}

#[async_trait]
impl BinStore for FirestoreStore {
    async fn list(&self) -> Result<Vec<Bin>, StoreError> {
        let documents = self.list_documents(BINS_COLLECTION).await?;
        let mut bins = documents
            .into_iter()
            .map(|document| bin_from_fields(&document.fields))
            .collect::<Result<Vec<Bin>, StoreError>>()?;
        bins.sort_by(|left, right| left.id.0.cmp(&right.id.0));
        Ok(bins)
    }

    async fn get(&self, id: &BinId) -> Result<Option<Bin>, StoreError> {
        let request = self.client.get(self.document_url(BINS_COLLECTION, &id.0));
        let response = self.authorize(request).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let document: Document = response.error_for_status()?.json().await?;
        bin_from_fields(&document.fields).map(Some)
    }

    async fn upsert(&self, bin: Bin) -> Result<(), StoreError> {
        let request = self
            .client
            .patch(self.document_url(BINS_COLLECTION, &bin.id.0))
            .json(&Document::new(bin_to_fields(&bin)));
        send_checked(self.authorize(request)).await
    }

    async fn append_reading(&self, reading: TelemetryReading) -> Result<(), StoreError> {
        // POST without a document id lets Firestore assign one, which is all
        // an append-only timeseries needs.
        let request = self
            .client
            .post(self.documents_url(TIMESERIES_COLLECTION))
            .json(&Document::new(reading_to_fields(&reading)));
        send_checked(self.authorize(request)).await
    }
}

#[async_trait]
impl AlertLog for FirestoreStore {
    async fn append(&self, alerts: &[Alert]) -> Result<(), StoreError> {
        for alert in alerts {
            let request = self
                .client
                .patch(self.document_url(ALERTS_COLLECTION, &alert.id.0))
                .json(&Document::new(alert_to_fields(alert)));
            send_checked(self.authorize(request)).await?;
        }
        Ok(())
    }

    async fn active(&self) -> Result<Vec<Alert>, StoreError> {
        let documents = self.list_documents(ALERTS_COLLECTION).await?;
        let mut alerts = documents
            .into_iter()
            .map(|document| alert_from_fields(&document.fields))
            .collect::<Result<Vec<Alert>, StoreError>>()?;
        alerts.retain(|alert| alert.active);
        alerts.sort_by(|left, right| left.id.0.cmp(&right.id.0));
        Ok(alerts)
    }
}

/// Response wrapper from a collection listing.
#[derive(Debug, Deserialize)]
struct ListResponse {
    documents: Option<Vec<Document>>,
}

/// A Firestore document: just its typed field map, for our purposes.
#[derive(Debug, Serialize, Deserialize)]
struct Document {
    fields: HashMap<String, Value>,
}

impl Document {
    fn new(fields: HashMap<String, Value>) -> Self {
        Self { fields }
    }
}

/// Firestore's typed value encoding. Only the variants this backend writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
enum Value {
    StringValue(String),
    /// Firestore transports 64-bit integers as strings.
    IntegerValue(String),
    DoubleValue(f64),
    BooleanValue(bool),
    TimestampValue(DateTime<Utc>),
    NullValue(Option<()>),
    MapValue(MapFields),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MapFields {
    fields: HashMap<String, Value>,
}

fn bin_to_fields(bin: &Bin) -> HashMap<String, Value> {
    let mut coordinate_fields = HashMap::new();
    coordinate_fields.insert("lat".to_owned(), Value::DoubleValue(bin.coordinates.lat));
    coordinate_fields.insert("lng".to_owned(), Value::DoubleValue(bin.coordinates.lng));

    let mut fields = HashMap::new();
    fields.insert("id".to_owned(), Value::StringValue(bin.id.0.clone()));
    fields.insert(
        "type".to_owned(),
        Value::StringValue(bin.waste_type.label().to_owned()),
    );
    fields.insert(
        "location".to_owned(),
        Value::StringValue(bin.location.clone()),
    );
    fields.insert(
        "address".to_owned(),
        Value::StringValue(bin.address.clone()),
    );
    fields.insert("fillLevel".to_owned(), integer(i64::from(bin.fill_level)));
    fields.insert("capacity".to_owned(), integer(i64::from(bin.capacity)));
    fields.insert(
        "hazardScore".to_owned(),
        integer(i64::from(bin.hazard_score)),
    );
    fields.insert(
        "coordinates".to_owned(),
        Value::MapValue(MapFields {
            fields: coordinate_fields,
        }),
    );
    fields.insert(
        "batteryLevel".to_owned(),
        integer(i64::from(bin.battery_level)),
    );
    fields.insert("temperature".to_owned(), Value::DoubleValue(bin.temperature));
    fields.insert("weight".to_owned(), Value::DoubleValue(bin.weight));
    fields.insert(
        "signalStrength".to_owned(),
        integer(i64::from(bin.signal_strength)),
    );
    fields.insert(
        "lastUpdate".to_owned(),
        bin.last_update
            .map_or(Value::NullValue(None), Value::TimestampValue),
    );
    fields.insert(
        "status".to_owned(),
        Value::StringValue(bin.status.to_string()),
    );
    fields.insert(
        "priority".to_owned(),
        Value::StringValue(bin.priority.to_string()),
    );
    fields.insert(
        "priority_score".to_owned(),
        Value::DoubleValue(bin.priority_score),
    );
    fields
}

fn bin_from_fields(fields: &HashMap<String, Value>) -> Result<Bin, StoreError> {
    Ok(Bin {
        id: BinId(require_string(fields, "id")?),
        waste_type: WasteType::from(optional_string(fields, "type").unwrap_or_default()),
        location: optional_string(fields, "location").unwrap_or_default(),
        address: optional_string(fields, "address").unwrap_or_default(),
        fill_level: integer_or(fields, "fillLevel", 0) as u8,
        capacity: integer_or(fields, "capacity", 100) as u32,
        hazard_score: integer_or(fields, "hazardScore", 0) as u8,
        coordinates: coordinates_from(fields),
        battery_level: integer_or(fields, "batteryLevel", 90) as u8,
        temperature: double_or(fields, "temperature", 22.0),
        weight: double_or(fields, "weight", 0.0),
        signal_strength: integer_or(fields, "signalStrength", 80) as u8,
        last_update: timestamp_from(fields, "lastUpdate"),
        status: parse_status(optional_string(fields, "status").as_deref()),
        priority: parse_priority(optional_string(fields, "priority").as_deref()),
        priority_score: double_or(fields, "priority_score", 0.0),
    })
}

fn alert_to_fields(alert: &Alert) -> HashMap<String, Value> {
    let mut fields = HashMap::new();
    fields.insert("id".to_owned(), Value::StringValue(alert.id.0.clone()));
    fields.insert(
        "binId".to_owned(),
        Value::StringValue(alert.bin_id.0.clone()),
    );
    fields.insert(
        "type".to_owned(),
        Value::StringValue(kind_tag(alert.kind).to_owned()),
    );
    fields.insert(
        "severity".to_owned(),
        Value::StringValue(severity_tag(alert.severity).to_owned()),
    );
    fields.insert(
        "message".to_owned(),
        Value::StringValue(alert.message.clone()),
    );
    fields.insert(
        "location".to_owned(),
        Value::StringValue(alert.location.clone()),
    );
    fields.insert(
        "timestamp".to_owned(),
        Value::TimestampValue(alert.timestamp),
    );
    fields.insert("active".to_owned(), Value::BooleanValue(alert.active));
    fields
}

fn alert_from_fields(fields: &HashMap<String, Value>) -> Result<Alert, StoreError> {
    Ok(Alert {
        id: AlertId(require_string(fields, "id")?),
        bin_id: BinId(require_string(fields, "binId")?),
        kind: parse_kind(&require_string(fields, "type")?)?,
        severity: parse_severity(&require_string(fields, "severity")?)?,
        message: optional_string(fields, "message").unwrap_or_default(),
        location: optional_string(fields, "location").unwrap_or_default(),
        timestamp: timestamp_from(fields, "timestamp").unwrap_or_else(Utc::now),
        active: boolean_or(fields, "active", true),
    })
}

fn reading_to_fields(reading: &TelemetryReading) -> HashMap<String, Value> {
    let mut fields = HashMap::new();
    fields.insert(
        "binId".to_owned(),
        Value::StringValue(reading.bin_id.0.clone()),
    );
    fields.insert("ts".to_owned(), Value::TimestampValue(reading.timestamp));
    fields.insert(
        "fillLevel".to_owned(),
        integer(i64::from(reading.fill_level)),
    );
    fields.insert(
        "temperature".to_owned(),
        Value::DoubleValue(reading.temperature),
    );
    fields.insert("weight".to_owned(), Value::DoubleValue(reading.weight));
    fields.insert(
        "hazardScore".to_owned(),
        integer(i64::from(reading.hazard_score)),
    );
    fields.insert(
        "batteryLevel".to_owned(),
        integer(i64::from(reading.battery_level)),
    );
    fields
}

fn integer(value: i64) -> Value {
    Value::IntegerValue(value.to_string())
}

fn require_string(fields: &HashMap<String, Value>, key: &str) -> Result<String, StoreError> {
    optional_string(fields, key)
        .ok_or_else(|| StoreError::Decode(format!("missing string field `{key}`")))
}

fn optional_string(fields: &HashMap<String, Value>, key: &str) -> Option<String> {
    match fields.get(key) {
        Some(Value::StringValue(text)) => Some(text.clone()),
        _ => None,
    }
}

fn integer_or(fields: &HashMap<String, Value>, key: &str, default: i64) -> i64 {
    match fields.get(key) {
        Some(Value::IntegerValue(raw)) => raw.parse().unwrap_or(default),
        Some(Value::DoubleValue(number)) => *number as i64,
        _ => default,
    }
}

fn double_or(fields: &HashMap<String, Value>, key: &str, default: f64) -> f64 {
    match fields.get(key) {
        Some(Value::DoubleValue(number)) => *number,
        Some(Value::IntegerValue(raw)) => raw.parse().unwrap_or(default),
        _ => default,
    }
}

fn boolean_or(fields: &HashMap<String, Value>, key: &str, default: bool) -> bool {
    match fields.get(key) {
        Some(Value::BooleanValue(flag)) => *flag,
        _ => default,
    }
}

fn timestamp_from(fields: &HashMap<String, Value>, key: &str) -> Option<DateTime<Utc>> {
    match fields.get(key) {
        Some(Value::TimestampValue(timestamp)) => Some(*timestamp),
        _ => None,
    }
}

fn coordinates_from(fields: &HashMap<String, Value>) -> Coordinates {
    if let Some(Value::MapValue(map)) = fields.get("coordinates") {
        Coordinates {
            lat: double_or(&map.fields, "lat", 0.0),
            lng: double_or(&map.fields, "lng", 0.0),
        }
    } else {
        Coordinates { lat: 0.0, lng: 0.0 }
    }
}

fn parse_status(raw: Option<&str>) -> BinStatus {
    match raw {
        Some("warning") => BinStatus::Warning,
        Some("alert") => BinStatus::Alert,
        Some("critical") => BinStatus::Critical,
        Some("offline") => BinStatus::Offline,
        _ => BinStatus::Normal,
    }
}

fn parse_priority(raw: Option<&str>) -> Priority {
    match raw {
        Some("high") => Priority::High,
        Some("medium") => Priority::Medium,
        _ => Priority::Low,
    }
}

fn kind_tag(kind: AlertKind) -> &'static str {
    match kind {
        AlertKind::Overflow => "overflow",
        AlertKind::Hazard => "hazard",
    }
}

fn parse_kind(raw: &str) -> Result<AlertKind, StoreError> {
    match raw {
        "overflow" => Ok(AlertKind::Overflow),
        "hazard" => Ok(AlertKind::Hazard),
        other => Err(StoreError::Decode(format!("unknown alert type `{other}`"))),
    }
}

fn severity_tag(severity: Severity) -> &'static str {
    match severity {
        Severity::High => "high",
        Severity::Critical => "critical",
    }
}

fn parse_severity(raw: &str) -> Result<Severity, StoreError> {
    match raw {
        "high" => Ok(Severity::High),
        "critical" => Ok(Severity::Critical),
        other => Err(StoreError::Decode(format!("unknown severity `{other}`"))),
    }
}

// Small helpers to send requests and decode JSON with status handling.
async fn fetch_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, StoreError> {
    request
        .send()
        .await
        .map_err(StoreError::from)?
        .error_for_status()
        .map_err(StoreError::from)?
        .json()
        .await
        .map_err(StoreError::from)
}

async fn send_checked(request: RequestBuilder) -> Result<(), StoreError> {
    request
        .send()
        .await
        .map_err(StoreError::from)?
        .error_for_status()
        .map_err(StoreError::from)?;
    Ok(())
}
