//! Priority scoring: categorical priority, continuous score, and status
//! derivation. All functions here are pure over the snapshot they are given.

use chrono::{DateTime, Utc};

use crate::model::{Bin, BinStatus, Priority, WasteType};

/// Placeholder until scoring becomes geography-aware.
const LOCATION_FACTOR: f64 = 0.7;

/// Relative urgency weight of a waste category, in [0, 1].
#[must_use]
pub fn type_factor(waste_type: WasteType) -> f64 {
    match waste_type {
        WasteType::Hazardous => 1.0,
        WasteType::Organic => 0.8,
        WasteType::Recycling => 0.6,
        WasteType::General => 0.4,
    }
}

/// Categorical priority from a weighted sum of fill level (30%), waste type
/// (40%), and hazard score (30%). Boundary values belong to the higher
/// bucket.
#[must_use]
pub fn calculate_priority(bin: &Bin) -> Priority {
    let score = f64::from(bin.fill_level) * 0.3
        + type_factor(bin.waste_type) * 100.0 * 0.4
        + f64::from(bin.hazard_score) * 10.0 * 0.3;

    if score >= 80.0 {
        Priority::High
    } else if score >= 50.0 {
        Priority::Medium
    } else {
        Priority::Low
    }
}

/// Continuous priority score in [0, 1]: fill 30%, waste type 40%, telemetry
/// staleness 20%, location 10%.
#[must_use]
pub fn calculate_priority_score(bin: &Bin, now: DateTime<Utc>) -> f64 {
    let fill = f64::from(bin.fill_level) / 100.0;
    let score = fill * 0.3
        + type_factor(bin.waste_type) * 0.4
        + time_factor(bin.last_update, now) * 0.2
        + LOCATION_FACTOR * 0.1;

    score.min(1.0)
}

/// Staleness factor: saturates at 1.0 after a week without telemetry. Bins
/// without a parsable update timestamp sit in the middle of the range.
fn time_factor(last_update: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    last_update.map_or(0.5, |updated| {
        let days = (now - updated).num_days();
        (days as f64 / 7.0).min(1.0)
    })
}

/// Operational status thresholds from the ingestion path. [`BinStatus::Offline`]
/// is never derived here; marking silent sensors is a repository concern.
#[must_use]
pub fn derive_status(bin: &Bin) -> BinStatus {
    if bin.hazard_score >= 9 {
        BinStatus::Critical
    } else if bin.fill_level >= 85 || bin.hazard_score >= 8 {
        BinStatus::Alert
    } else if bin.fill_level >= 70 || bin.hazard_score >= 6 {
        BinStatus::Warning
    } else {
        BinStatus::Normal
    }
}

/// Recompute every derived field on a bin. Callers must run this on each
/// write; derived fields are never mutated independently.
pub fn classify(bin: &mut Bin, now: DateTime<Utc>) {
    bin.priority = calculate_priority(bin);
    bin.priority_score = calculate_priority_score(bin, now);
    bin.status = derive_status(bin);
}
