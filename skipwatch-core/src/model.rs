//! Domain data structures for bins, telemetry, and alerts.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Capacity assumed for bins that never reported one, in litres.
pub const DEFAULT_CAPACITY: u32 = 100;
/// Battery percentage assumed for bins that never reported one.
pub const DEFAULT_BATTERY_LEVEL: u8 = 90;
/// Ambient temperature assumed for bins that never reported one, in °C.
pub const DEFAULT_TEMPERATURE: f64 = 22.0;
/// Signal strength assumed for bins that never reported one.
pub const DEFAULT_SIGNAL_STRENGTH: u8 = 80;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Identifier for a monitored bin.
pub struct BinId(pub String);

impl fmt::Display for BinId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Identifier for an alert, derived from the bin id and alert kind.
pub struct AlertId(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
/// Waste categories a bin can hold. Unknown wire values fold to
/// [`WasteType::General`], whose factors match the legacy defaults.
pub enum WasteType {
    /// Residual household and street waste.
    General,
    /// Recyclable packaging, paper, and glass.
    Recycling,
    /// Compostable organic waste.
    Organic,
    /// Hazardous material requiring special handling.
    Hazardous,
}

impl WasteType {
    /// Human-readable label used on the wire (`"General Waste"`, ...).
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            WasteType::General => "General Waste",
            WasteType::Recycling => "Recycling",
            WasteType::Organic => "Organic Waste",
            WasteType::Hazardous => "Hazardous",
        }
    }

    /// Short machine-friendly slug (`"general"`, `"recycling"`, ...).
    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            WasteType::General => "general",
            WasteType::Recycling => "recycling",
            WasteType::Organic => "organic",
            WasteType::Hazardous => "hazardous",
        }
    }
}

impl fmt::Display for WasteType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.label())
    }
}

impl From<&str> for WasteType {
    fn from(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "hazardous" => WasteType::Hazardous,
            "organic waste" | "organic" => WasteType::Organic,
            "recycling" | "recyclable" => WasteType::Recycling,
            _ => WasteType::General,
        }
    }
}

impl From<String> for WasteType {
    fn from(raw: String) -> Self {
        WasteType::from(raw.as_str())
    }
}

impl From<WasteType> for String {
    fn from(waste_type: WasteType) -> Self {
        waste_type.label().to_owned()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Operational status derived from the latest telemetry.
pub enum BinStatus {
    /// Nothing to do.
    Normal,
    /// Approaching a threshold; keep an eye on it.
    Warning,
    /// A collection threshold was crossed.
    Alert,
    /// Severe hazard reading.
    Critical,
    /// Sensor went silent; set by the repository layer, never derived here.
    Offline,
}

impl fmt::Display for BinStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BinStatus::Normal => "normal",
            BinStatus::Warning => "warning",
            BinStatus::Alert => "alert",
            BinStatus::Critical => "critical",
            BinStatus::Offline => "offline",
        };
        write!(formatter, "{label}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Categorical collection urgency.
pub enum Priority {
    /// Routine schedule.
    Low,
    /// Should be scheduled soon.
    Medium,
    /// Collect next.
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        };
        write!(formatter, "{label}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Alert categories emitted by the detector.
pub enum AlertKind {
    /// Fill level crossed the overflow threshold.
    Overflow,
    /// Hazard score crossed the hazard threshold.
    Hazard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// How urgently an alert needs attention.
pub enum Severity {
    /// Needs a response within the day.
    High,
    /// Needs an immediate response.
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
/// WGS84 position of a bin or the depot.
pub struct Coordinates {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// One physical waste receptacle with its latest telemetry and the
/// scheduling attributes derived from it.
///
/// `status`, `priority`, and `priority_score` are recomputed from the other
/// fields on every write (see [`crate::scoring::classify`]); they are never
/// mutated independently.
pub struct Bin {
    /// Unique identifier, immutable once assigned.
    pub id: BinId,
    /// Waste category held by this bin.
    #[serde(rename = "type")]
    pub waste_type: WasteType,
    /// Human-readable site name.
    pub location: String,
    /// Street address of the site.
    pub address: String,
    /// Fill level as a percentage of capacity, clamped to 0–100 at ingestion.
    pub fill_level: u8,
    /// Capacity in litres.
    pub capacity: u32,
    /// Hazard indicator from 0 (benign) to 10.
    pub hazard_score: u8,
    /// Position of the bin.
    pub coordinates: Coordinates,
    /// Sensor battery percentage.
    pub battery_level: u8,
    /// Last measured temperature in °C.
    pub temperature: f64,
    /// Last measured content weight in kg.
    pub weight: f64,
    /// Radio signal strength.
    pub signal_strength: u8,
    /// Timestamp of the most recent telemetry; `None` when the sensor never
    /// reported a parsable one.
    pub last_update: Option<DateTime<Utc>>,
    /// Derived operational status.
    pub status: BinStatus,
    /// Derived categorical priority.
    pub priority: Priority,
    /// Derived continuous priority in [0, 1].
    #[serde(rename = "priority_score")]
    pub priority_score: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Raw telemetry payload as pushed by a sensor or simulator. Every field is
/// optional; the service resolves documented defaults at ingestion.
pub struct TelemetryUpdate {
    /// Waste category label; unknown values fold to General Waste.
    pub bin_type: Option<String>,
    /// Human-readable site name.
    pub location_name: Option<String>,
    /// Street address of the site.
    pub address: Option<String>,
    /// Fill percentage; out-of-range values are clamped at ingestion.
    #[serde(alias = "fillLevel")]
    pub fill_percentage: Option<i64>,
    /// Capacity in litres.
    pub capacity: Option<u32>,
    /// Hazard indicator; clamped to 0–10 at ingestion.
    pub hazard_score: Option<i64>,
    /// Sensor-reported timestamp; parsed leniently, unparsable values are
    /// tolerated and fall back to the documented defaults downstream.
    pub timestamp: Option<String>,
    /// Position; rides in the `location` field of the wire payload.
    #[serde(rename = "location")]
    pub coordinates: Option<Coordinates>,
    /// Sensor battery percentage.
    pub battery_level: Option<u8>,
    /// Measured temperature in °C.
    pub temperature: Option<f64>,
    /// Measured content weight in kg.
    pub weight: Option<f64>,
    /// Radio signal strength.
    pub signal_strength: Option<u8>,
    /// Free-form sensor self-report (`"active"`, ...); informational only.
    pub sensor_status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Time-stamped notification tied to one bin. Created fresh on each
/// detection pass; closure of stale alerts is a collaborator's concern.
pub struct Alert {
    /// Deterministic id (`overflow_<binId>` / `hazard_<binId>`) so repeated
    /// detection of an unchanged condition dedups cleanly.
    pub id: AlertId,
    /// Bin this alert refers to.
    pub bin_id: BinId,
    /// What fired.
    #[serde(rename = "type")]
    pub kind: AlertKind,
    /// How urgent it is.
    pub severity: Severity,
    /// Operator-facing description.
    pub message: String,
    /// Site name of the bin at detection time.
    pub location: String,
    /// When the detection pass ran.
    pub timestamp: DateTime<Utc>,
    /// Whether the alert is still considered open.
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Append-only timeseries record written once per ingested update.
pub struct TelemetryReading {
    /// Bin this reading belongs to.
    pub bin_id: BinId,
    /// Sensor-reported time of the reading.
    #[serde(rename = "ts")]
    pub timestamp: DateTime<Utc>,
    /// Fill percentage at the time of the reading.
    pub fill_level: u8,
    /// Temperature in °C.
    pub temperature: f64,
    /// Content weight in kg.
    pub weight: f64,
    /// Hazard indicator.
    pub hazard_score: u8,
    /// Sensor battery percentage.
    pub battery_level: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_waste_types_fold_to_general() {
        assert_eq!(WasteType::from("Construction Debris"), WasteType::General);
        assert_eq!(WasteType::from("hazardous"), WasteType::Hazardous);
        assert_eq!(WasteType::from("Organic Waste"), WasteType::Organic);
        assert_eq!(WasteType::from("recyclable"), WasteType::Recycling);
    }

    #[test]
    fn waste_type_round_trips_through_label() {
        for waste_type in [
            WasteType::General,
            WasteType::Recycling,
            WasteType::Organic,
            WasteType::Hazardous,
        ] {
            assert_eq!(WasteType::from(waste_type.label()), waste_type);
        }
    }

    #[test]
    fn telemetry_update_accepts_both_fill_field_names() {
        let with_percentage: TelemetryUpdate =
            serde_json::from_str(r#"{"fillPercentage": 55}"#).expect("valid payload");
        assert_eq!(with_percentage.fill_percentage, Some(55));

        let with_level: TelemetryUpdate =
            serde_json::from_str(r#"{"fillLevel": 42}"#).expect("valid payload");
        assert_eq!(with_level.fill_percentage, Some(42));
    }
}
