//! Aggregate statistics over the bin collection. A pure reduction; empty
//! input yields zeroed counters, never a division fault.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::{Bin, BinStatus, Priority, WasteType};

/// Priority score above which a bin counts as high priority fleet-wide.
const HIGH_PRIORITY_SCORE: f64 = 0.7;
/// Fill level at or above which a bin counts as critical fleet-wide.
const CRITICAL_FILL: u8 = 90;

#[derive(Debug, Clone, Copy, Default, Serialize)]
/// Bin counts per categorical priority.
pub struct PriorityCounts {
    /// Bins classified high.
    pub high: usize,
    /// Bins classified medium.
    pub medium: usize,
    /// Bins classified low.
    pub low: usize,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
/// Bin counts per operational status.
pub struct StatusCounts {
    /// Bins in normal operation.
    pub normal: usize,
    /// Bins in warning state.
    pub warning: usize,
    /// Bins in alert state.
    pub alert: usize,
    /// Bins in critical state.
    pub critical: usize,
    /// Bins marked offline by the repository layer.
    pub offline: usize,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
/// Bin counts per waste category.
pub struct WasteTypeCounts {
    /// General waste bins.
    pub general: usize,
    /// Recycling bins.
    pub recycling: usize,
    /// Organic waste bins.
    pub organic: usize,
    /// Hazardous waste bins.
    pub hazardous: usize,
}

#[derive(Debug, Clone, Serialize)]
/// Fleet-wide roll-up computed fresh for every overview request.
pub struct SystemStats {
    /// Total bins known to the repository.
    pub total_bins: usize,
    /// Bins not marked offline.
    pub active_bins: usize,
    /// Bins whose priority score exceeds 0.7.
    pub high_priority_count: usize,
    /// Bins at or above 90% fill.
    pub critical_count: usize,
    /// Mean fill level, rounded to one decimal; 0 for an empty fleet.
    pub average_fill: f64,
    /// Distribution over categorical priorities.
    pub bins_by_priority: PriorityCounts,
    /// Distribution over operational statuses.
    pub bins_by_status: StatusCounts,
    /// Distribution over waste categories.
    pub waste_type_distribution: WasteTypeCounts,
    /// When this roll-up was computed.
    pub last_updated: DateTime<Utc>,
}

/// Reduce the current snapshot into [`SystemStats`].
#[must_use]
pub fn summarize(bins: &[Bin], now: DateTime<Utc>) -> SystemStats {
    let mut by_priority = PriorityCounts::default();
    let mut by_status = StatusCounts::default();
    let mut by_type = WasteTypeCounts::default();
    let mut fill_sum: u64 = 0;

    for bin in bins {
        match bin.priority {
            Priority::High => by_priority.high += 1,
            Priority::Medium => by_priority.medium += 1,
            Priority::Low => by_priority.low += 1,
        }
        match bin.status {
            BinStatus::Normal => by_status.normal += 1,
            BinStatus::Warning => by_status.warning += 1,
            BinStatus::Alert => by_status.alert += 1,
            BinStatus::Critical => by_status.critical += 1,
            BinStatus::Offline => by_status.offline += 1,
        }
        match bin.waste_type {
            WasteType::General => by_type.general += 1,
            WasteType::Recycling => by_type.recycling += 1,
            WasteType::Organic => by_type.organic += 1,
            WasteType::Hazardous => by_type.hazardous += 1,
        }
        fill_sum += u64::from(bin.fill_level);
    }

    let average_fill = if bins.is_empty() {
        0.0
    } else {
        let mean = fill_sum as f64 / bins.len() as f64;
        (mean * 10.0).round() / 10.0
    };

    SystemStats {
        total_bins: bins.len(),
        active_bins: bins
            .iter()
            .filter(|bin| bin.status != BinStatus::Offline)
            .count(),
        high_priority_count: bins
            .iter()
            .filter(|bin| bin.priority_score > HIGH_PRIORITY_SCORE)
            .count(),
        critical_count: bins
            .iter()
            .filter(|bin| bin.fill_level >= CRITICAL_FILL)
            .count(),
        average_fill,
        bins_by_priority: by_priority,
        bins_by_status: by_status,
        waste_type_distribution: by_type,
        last_updated: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BinId, Coordinates};

    fn bin(
        id: &str,
        waste_type: WasteType,
        fill_level: u8,
        status: BinStatus,
        priority: Priority,
        priority_score: f64,
    ) -> Bin {
        Bin {
            id: BinId(id.to_owned()),
            waste_type,
            location: "Somewhere".to_owned(),
            address: "1 Nowhere Ln".to_owned(),
            fill_level,
            capacity: 100,
            hazard_score: 1,
            coordinates: Coordinates {
                lat: 40.7,
                lng: -74.0,
            },
            battery_level: 85,
            temperature: 20.0,
            weight: 10.0,
            signal_strength: 80,
            last_update: Some(Utc::now()),
            status,
            priority,
            priority_score,
        }
    }

    #[test]
    fn empty_fleet_yields_zeroed_stats() {
        let stats = summarize(&[], Utc::now());
        assert_eq!(stats.total_bins, 0);
        assert_eq!(stats.active_bins, 0);
        assert_eq!(stats.high_priority_count, 0);
        assert_eq!(stats.critical_count, 0);
        assert!((stats.average_fill - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn counts_and_average_cover_the_whole_fleet() {
        let fleet = vec![
            bin(
                "A",
                WasteType::General,
                45,
                BinStatus::Normal,
                Priority::Low,
                0.4,
            ),
            bin(
                "B",
                WasteType::Recycling,
                92,
                BinStatus::Alert,
                Priority::High,
                0.8,
            ),
            bin(
                "C",
                WasteType::Organic,
                90,
                BinStatus::Critical,
                Priority::High,
                0.75,
            ),
            bin(
                "D",
                WasteType::Hazardous,
                20,
                BinStatus::Offline,
                Priority::Medium,
                0.6,
            ),
        ];
        let stats = summarize(&fleet, Utc::now());

        assert_eq!(stats.total_bins, 4);
        assert_eq!(stats.active_bins, 3);
        assert_eq!(stats.high_priority_count, 2);
        assert_eq!(stats.critical_count, 2);
        // (45 + 92 + 90 + 20) / 4 = 61.75, rounded to one decimal.
        assert!((stats.average_fill - 61.8).abs() < 1e-9);
        assert_eq!(stats.bins_by_priority.high, 2);
        assert_eq!(stats.bins_by_priority.medium, 1);
        assert_eq!(stats.bins_by_priority.low, 1);
        assert_eq!(stats.bins_by_status.alert, 1);
        assert_eq!(stats.bins_by_status.critical, 1);
        assert_eq!(stats.bins_by_status.offline, 1);
        assert_eq!(stats.waste_type_distribution.recycling, 1);
        assert_eq!(stats.waste_type_distribution.hazardous, 1);
    }
}
