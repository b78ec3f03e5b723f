//! Demo-fleet generation for local runs and the operator console.
//!
//! Fully deterministic under a seeded rng; the binaries seed from the
//! environment so a demo session can be replayed.

use std::f64::consts::TAU;

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::SliceRandom;

use crate::model::{
    Bin, BinId, BinStatus, Coordinates, DEFAULT_SIGNAL_STRENGTH, Priority, WasteType,
};
use crate::route::DEPOT;
use crate::scoring;

/// Radius of the random scatter disc around the depot, in km.
const SCATTER_RADIUS_KM: f64 = 40.0;
/// Rough km per degree of latitude.
const KM_PER_DEGREE: f64 = 111.0;

/// The five fixed seed bins plus `extra` randomly scattered ones, every
/// derived field computed through the scoring engine.
pub fn demo_fleet<R: Rng + ?Sized>(extra: usize, now: DateTime<Utc>, rng: &mut R) -> Vec<Bin> {
    let mut bins = seed_bins(now);
    bins.extend(random_bins(extra, DEPOT, SCATTER_RADIUS_KM, now, rng));
    bins
}

/// Scatter `count` bins uniformly in a disc around `center` and give them
/// randomized telemetry. Ids continue after the fixed seed bins (BIN006…).
pub fn random_bins<R: Rng + ?Sized>(
    count: usize,
    center: Coordinates,
    max_radius_km: f64,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Vec<Bin> {
    let waste_types = [
        WasteType::General,
        WasteType::Recycling,
        WasteType::Organic,
        WasteType::Hazardous,
    ];

    (0..count)
        .map(|index| {
            let waste_type = *waste_types.choose(rng).unwrap_or(&WasteType::General);
            let position = random_point(center, max_radius_km, rng);

            let mut bin = Bin {
                id: BinId(format!("BIN{:03}", 6 + index)),
                waste_type,
                location: format!("Random Location {}", index + 1),
                address: format!("Random Address {}", index + 1),
                fill_level: rng.gen_range(10..=90),
                capacity: 100,
                hazard_score: rng.gen_range(0..=10),
                coordinates: position,
                battery_level: rng.gen_range(70..=100),
                temperature: round1(rng.gen_range(15.0..35.0)),
                weight: round1(rng.gen_range(5.0..50.0)),
                signal_strength: DEFAULT_SIGNAL_STRENGTH,
                last_update: Some(now),
                status: BinStatus::Normal,
                priority: Priority::Low,
                priority_score: 0.0,
            };
            scoring::classify(&mut bin, now);
            bin
        })
        .collect()
}

fn random_point<R: Rng + ?Sized>(
    center: Coordinates,
    max_radius_km: f64,
    rng: &mut R,
) -> Coordinates {
    let radius_degrees = max_radius_km / KM_PER_DEGREE;
    let angle = rng.gen_range(0.0..TAU);
    let radius = rng.gen_range(0.0..radius_degrees);
    Coordinates {
        lat: center.lat + radius * angle.cos(),
        lng: center.lng + radius * angle.sin(),
    }
}

fn seed_bins(now: DateTime<Utc>) -> Vec<Bin> {
    let seeds = [
        (
            "BIN001",
            WasteType::General,
            "Downtown Plaza",
            "123 Main St, Downtown",
            45_u8,
            100_u32,
            2_u8,
            Coordinates {
                lat: 40.7128,
                lng: -74.0060,
            },
            92_u8,
            22.3,
            20.5,
        ),
        (
            "BIN002",
            WasteType::Recycling,
            "Central Park North",
            "456 Park Ave, Midtown",
            78,
            100,
            1,
            Coordinates {
                lat: 40.7829,
                lng: -73.9654,
            },
            88,
            21.8,
            19.5,
        ),
        (
            "BIN003",
            WasteType::Organic,
            "Market Street",
            "789 Market St, Financial",
            92,
            100,
            7,
            Coordinates {
                lat: 40.7589,
                lng: -73.9851,
            },
            95,
            28.5,
            55.2,
        ),
        (
            "BIN004",
            WasteType::Hazardous,
            "Industrial Zone",
            "321 Industrial Ave, Zone B",
            65,
            100,
            9,
            Coordinates {
                lat: 40.7505,
                lng: -73.9934,
            },
            78,
            31.2,
            42.8,
        ),
        (
            "BIN005",
            WasteType::General,
            "Residential Block A",
            "567 Oak Street, Residential",
            35,
            150,
            2,
            Coordinates {
                lat: 40.7335,
                lng: -74.0027,
            },
            96,
            23.1,
            28.4,
        ),
    ];

    seeds
        .into_iter()
        .map(
            |(
                id,
                waste_type,
                location,
                address,
                fill_level,
                capacity,
                hazard_score,
                coordinates,
                battery_level,
                temperature,
                weight,
            )| {
                let mut bin = Bin {
                    id: BinId(id.to_owned()),
                    waste_type,
                    location: location.to_owned(),
                    address: address.to_owned(),
                    fill_level,
                    capacity,
                    hazard_score,
                    coordinates,
                    battery_level,
                    temperature,
                    weight,
                    signal_strength: DEFAULT_SIGNAL_STRENGTH,
                    last_update: Some(now),
                    status: BinStatus::Normal,
                    priority: Priority::Low,
                    priority_score: 0.0,
                };
                scoring::classify(&mut bin, now);
                bin
            },
        )
        .collect()
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn fixed_seeds_have_derived_fields_computed() {
        let fleet = demo_fleet(0, Utc::now(), &mut StdRng::seed_from_u64(1));
        assert_eq!(fleet.len(), 5);

        let market = fleet
            .iter()
            .find(|bin| bin.id.0 == "BIN003")
            .expect("seed bin present");
        assert_eq!(market.status, BinStatus::Alert);
        assert_eq!(market.priority, Priority::High);

        let industrial = fleet
            .iter()
            .find(|bin| bin.id.0 == "BIN004")
            .expect("seed bin present");
        assert_eq!(industrial.status, BinStatus::Critical);
    }

    #[test]
    fn random_bins_are_deterministic_for_a_seed() {
        let now = Utc::now();
        let first = demo_fleet(10, now, &mut StdRng::seed_from_u64(42));
        let second = demo_fleet(10, now, &mut StdRng::seed_from_u64(42));

        assert_eq!(first.len(), 15);
        for (left, right) in first.iter().zip(&second) {
            assert_eq!(left.id, right.id);
            assert_eq!(left.fill_level, right.fill_level);
            assert!((left.coordinates.lat - right.coordinates.lat).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn random_bins_stay_inside_the_scatter_disc() {
        let now = Utc::now();
        let scattered = random_bins(50, DEPOT, 40.0, now, &mut StdRng::seed_from_u64(3));

        let max_degrees = 40.0 / 111.0;
        for bin in &scattered {
            let lat_delta = bin.coordinates.lat - DEPOT.lat;
            let lng_delta = bin.coordinates.lng - DEPOT.lng;
            let radius = lat_delta.hypot(lng_delta);
            assert!(radius <= max_degrees, "bin {} outside disc", bin.id);
            assert!((10..=90).contains(&bin.fill_level));
            assert!((0..=10).contains(&bin.hazard_score));
        }
    }
}
