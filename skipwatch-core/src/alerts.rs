//! Alert detection over a single bin snapshot.

use chrono::{DateTime, Utc};

use crate::model::{Alert, AlertId, AlertKind, Bin, Severity};

/// Fill level at or above which an overflow alert fires (inclusive).
pub const OVERFLOW_THRESHOLD: u8 = 80;
/// Hazard score above which a hazard alert fires (strict).
pub const HAZARD_THRESHOLD: u8 = 7;

/// Run both detection rules against a snapshot. Returns 0–2 alerts; the
/// rules are independent and may both fire for the same bin.
///
/// Alert ids are derived from the bin id, so re-detecting an unchanged
/// condition re-emits the same alert rather than a duplicate.
#[must_use]
pub fn detect(bin: &Bin, now: DateTime<Utc>) -> Vec<Alert> {
    let mut alerts = Vec::new();

    if bin.fill_level >= OVERFLOW_THRESHOLD {
        alerts.push(Alert {
            id: AlertId(format!("overflow_{}", bin.id)),
            bin_id: bin.id.clone(),
            kind: AlertKind::Overflow,
            severity: Severity::High,
            message: format!("Bin {} is {}% full", bin.id, bin.fill_level),
            location: bin.location.clone(),
            timestamp: now,
            active: true,
        });
    }

    if bin.hazard_score > HAZARD_THRESHOLD {
        alerts.push(Alert {
            id: AlertId(format!("hazard_{}", bin.id)),
            bin_id: bin.id.clone(),
            kind: AlertKind::Hazard,
            severity: Severity::Critical,
            message: format!(
                "Hazardous conditions in {} (score: {})",
                bin.id, bin.hazard_score
            ),
            location: bin.location.clone(),
            timestamp: now,
            active: true,
        });
    }

    alerts
}
