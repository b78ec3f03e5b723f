//! Collection-route planning and single-bin navigation estimates.
//!
//! Distances and arrival times come from a simplified index-based model, not
//! real routing. The formulas are kept bit-for-bit compatible with the wire
//! contract, including the arrival offset that does not chain cumulative
//! travel across stops.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::Serialize;

use crate::model::{Bin, BinId, Coordinates, WasteType};

/// Depot the collection fleet departs from.
pub const DEPOT: Coordinates = Coordinates {
    lat: 40.7128,
    lng: -74.0060,
};

/// Fixed service time per stop, in minutes.
pub const COLLECTION_MINUTES: u32 = 15;
/// Stop cap per plan; lower-priority candidates beyond it are dropped.
pub const MAX_STOPS: usize = 6;

#[derive(Debug, Clone, Serialize)]
/// One visit within a route plan.
pub struct RouteStop {
    /// 1-based position in the route.
    pub stop_number: u32,
    /// Bin to collect at this stop.
    pub bin_id: BinId,
    /// Site name of the bin.
    pub location: String,
    /// Position of the bin.
    pub coordinates: Coordinates,
    /// Waste category, for crew equipment planning.
    pub waste_type: WasteType,
    /// Fill level at planning time.
    pub fill_level: u8,
    /// Priority score that ranked this stop.
    pub priority_score: f64,
    /// Distance from the previous stop in km (index-based model).
    pub distance_from_previous: f64,
    /// Travel time to this stop in minutes.
    pub travel_time_minutes: u32,
    /// Service time at this stop in minutes.
    pub collection_time_minutes: u32,
    /// Estimated arrival; `now + i*20 + travel` minutes by contract.
    pub estimated_arrival: DateTime<Utc>,
    /// Fill level expected by the time the crew arrives.
    pub predicted_fill_on_arrival: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
/// Roll-up over a route plan. All fields are zero for an empty plan.
pub struct RouteSummary {
    /// Number of stops in the plan.
    pub total_stops: usize,
    /// Sum of per-stop distances in km.
    pub total_distance_km: f64,
    /// Sum of travel and collection minutes.
    pub estimated_time_minutes: u32,
    /// Estimated fuel saving versus an unordered run.
    pub fuel_savings_percent: f64,
    /// Stops whose priority score exceeds 0.7.
    pub high_priority_stops: usize,
}

#[derive(Debug, Clone, Serialize)]
/// Ordered visitation plan over the bins that currently need collection.
/// Computed fresh on every request and never persisted as a source of truth.
pub struct RoutePlan {
    /// Start position of the route.
    pub depot: Coordinates,
    /// Stops in visiting order.
    pub route: Vec<RouteStop>,
    /// Roll-up totals.
    pub summary: RouteSummary,
}

/// Plan a collection route over the current bin snapshot.
///
/// Candidates are bins with `priority_score > 0.5` or `fill_level > 70`,
/// ordered by descending score (stable, so ties keep their relative order)
/// and capped at [`MAX_STOPS`]. No candidates is a valid outcome, not an
/// error: the plan comes back with zero stops and a zeroed summary.
#[must_use]
pub fn plan(bins: &[Bin], depot: Coordinates, now: DateTime<Utc>) -> RoutePlan {
    let mut candidates: Vec<&Bin> = bins
        .iter()
        .filter(|bin| bin.priority_score > 0.5 || bin.fill_level > 70)
        .collect();

    candidates.sort_by(|left, right| right.priority_score.total_cmp(&left.priority_score));

    let route: Vec<RouteStop> = candidates
        .iter()
        .take(MAX_STOPS)
        .enumerate()
        .map(|(index, bin)| route_stop(bin, index, now))
        .collect();

    let summary = summarize_route(&route);

    RoutePlan {
        depot,
        route,
        summary,
    }
}

fn route_stop(bin: &Bin, index: usize, now: DateTime<Utc>) -> RouteStop {
    let distance = 2.3 + 0.8 * index as f64;
    let travel_minutes = travel_time_minutes(distance);

    // Contractual arrival offset; intentionally not a running sum of the
    // previous stops' travel and service times.
    let arrival_offset_minutes = index as i64 * 20 + i64::from(travel_minutes);

    RouteStop {
        stop_number: index as u32 + 1,
        bin_id: bin.id.clone(),
        location: bin.location.clone(),
        coordinates: bin.coordinates,
        waste_type: bin.waste_type,
        fill_level: bin.fill_level,
        priority_score: bin.priority_score,
        distance_from_previous: round2(distance),
        travel_time_minutes: travel_minutes,
        collection_time_minutes: COLLECTION_MINUTES,
        estimated_arrival: now + Duration::minutes(arrival_offset_minutes),
        predicted_fill_on_arrival: predicted_fill(bin.fill_level, travel_minutes),
    }
}

fn summarize_route(route: &[RouteStop]) -> RouteSummary {
    if route.is_empty() {
        return RouteSummary::default();
    }

    let total_distance: f64 = route.iter().map(|stop| stop.distance_from_previous).sum();
    let estimated_minutes: u32 = route
        .iter()
        .map(|stop| stop.travel_time_minutes + stop.collection_time_minutes)
        .sum();
    let stop_count = route.len();

    RouteSummary {
        total_stops: stop_count,
        total_distance_km: round2(total_distance),
        estimated_time_minutes: estimated_minutes,
        fuel_savings_percent: (25 + 2 * stop_count).min(40) as f64,
        high_priority_stops: route
            .iter()
            .filter(|stop| stop.priority_score > 0.7)
            .count(),
    }
}

/// Travel time at roughly 3 minutes per km, never below 5 minutes.
fn travel_time_minutes(distance_km: f64) -> u32 {
    ((distance_km * 3.0).round() as u32).max(5)
}

/// Fill expected after `travel_minutes` of further accumulation, capped at
/// 100%.
fn predicted_fill(fill_level: u8, travel_minutes: u32) -> f64 {
    (f64::from(fill_level) + f64::from(travel_minutes) / 60.0 * 0.5).min(100.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
/// Coarse congestion report for a navigation estimate.
pub enum RouteCondition {
    /// Free-flowing.
    Clear,
    /// Minor congestion.
    LightTraffic,
    /// Noticeable congestion.
    ModerateTraffic,
}

#[derive(Debug, Clone, Copy, Serialize)]
/// Simulated traffic situation along a navigation estimate.
pub struct TrafficInfo {
    /// Extra minutes expected from congestion.
    pub estimated_delay_minutes: u32,
    /// Coarse congestion report.
    pub route_status: RouteCondition,
}

#[derive(Debug, Clone, Serialize)]
/// Driving estimate from the depot to a single bin.
pub struct NavigationEstimate {
    /// Target bin.
    pub bin_id: BinId,
    /// Simulated driving distance in km.
    pub distance_km: f64,
    /// Travel time at the fleet's pace.
    pub estimated_travel_time_minutes: u32,
    /// Start position.
    pub from_location: Coordinates,
    /// Target position.
    pub to_location: Coordinates,
    /// Fill level expected on arrival.
    pub predicted_fill_on_arrival: f64,
    /// One-line explanation of why this bin ranks where it does.
    pub priority_justification: String,
    /// Simulated congestion along the way.
    pub traffic: TrafficInfo,
}

/// Estimate the drive from the depot to one bin. The distance and traffic
/// draws are stand-ins for a routing engine; the rng is injected so they are
/// seedable.
pub fn navigate<R: Rng + ?Sized>(bin: &Bin, depot: Coordinates, rng: &mut R) -> NavigationEstimate {
    let distance = 2.3 + rng.gen_range(0.0..3.0);
    let travel_minutes = travel_time_minutes(distance);

    let route_status = match rng.gen_range(0_u8..3) {
        0 => RouteCondition::Clear,
        1 => RouteCondition::LightTraffic,
        _ => RouteCondition::ModerateTraffic,
    };

    NavigationEstimate {
        bin_id: bin.id.clone(),
        distance_km: round2(distance),
        estimated_travel_time_minutes: travel_minutes,
        from_location: depot,
        to_location: bin.coordinates,
        predicted_fill_on_arrival: predicted_fill(bin.fill_level, travel_minutes),
        priority_justification: format!(
            "Priority: {:.2} - {} at {}% capacity",
            bin.priority_score, bin.waste_type, bin.fill_level
        ),
        traffic: TrafficInfo {
            estimated_delay_minutes: rng.gen_range(0..=10),
            route_status,
        },
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::model::{BinStatus, Priority};

    fn bin(id: &str, fill_level: u8, priority_score: f64) -> Bin {
        Bin {
            id: BinId(id.to_owned()),
            waste_type: WasteType::General,
            location: format!("Site {id}"),
            address: format!("Address {id}"),
            fill_level,
            capacity: 100,
            hazard_score: 2,
            coordinates: Coordinates {
                lat: 40.75,
                lng: -73.99,
            },
            battery_level: 90,
            temperature: 21.0,
            weight: 15.0,
            signal_strength: 80,
            last_update: Some(Utc::now()),
            status: BinStatus::Normal,
            priority: Priority::Medium,
            priority_score,
        }
    }

    #[test]
    fn no_candidates_yields_an_empty_zeroed_plan() {
        let quiet = vec![bin("BIN001", 10, 0.2), bin("BIN002", 40, 0.5)];
        let empty = plan(&quiet, DEPOT, Utc::now());

        assert!(empty.route.is_empty());
        assert_eq!(empty.summary.total_stops, 0);
        assert!((empty.summary.total_distance_km - 0.0).abs() < f64::EPSILON);
        assert_eq!(empty.summary.estimated_time_minutes, 0);
        assert!((empty.summary.fuel_savings_percent - 0.0).abs() < f64::EPSILON);
        assert_eq!(empty.summary.high_priority_stops, 0);
    }

    #[test]
    fn candidate_filter_accepts_either_condition() {
        let fleet = vec![
            bin("SCORE", 10, 0.6),  // score only
            bin("FILL", 71, 0.1),   // fill only
            bin("NEITHER", 70, 0.5) // both boundaries are exclusive
        ];
        let planned = plan(&fleet, DEPOT, Utc::now());
        let ids: Vec<&str> = planned
            .route
            .iter()
            .map(|stop| stop.bin_id.0.as_str())
            .collect();
        assert_eq!(ids, vec!["SCORE", "FILL"]);
    }

    #[test]
    fn stops_are_capped_at_six_highest_scores() {
        let fleet: Vec<Bin> = (0..20)
            .map(|index| {
                bin(
                    &format!("BIN{index:03}"),
                    80,
                    0.5 + f64::from(index) * 0.02,
                )
            })
            .collect();
        let planned = plan(&fleet, DEPOT, Utc::now());

        assert_eq!(planned.route.len(), MAX_STOPS);
        assert_eq!(planned.summary.total_stops, MAX_STOPS);
        // The six highest scores, in descending order.
        let first = planned.route.first().expect("six stops");
        assert_eq!(first.bin_id.0, "BIN019");
        let scores: Vec<f64> = planned.route.iter().map(|stop| stop.priority_score).collect();
        assert!(scores.windows(2).all(|pair| pair[0] >= pair[1]));
    }

    #[test]
    fn equal_scores_keep_their_original_order() {
        let fleet = vec![
            bin("FIRST", 80, 0.8),
            bin("SECOND", 80, 0.8),
            bin("THIRD", 80, 0.8),
        ];
        let planned = plan(&fleet, DEPOT, Utc::now());
        let ids: Vec<&str> = planned
            .route
            .iter()
            .map(|stop| stop.bin_id.0.as_str())
            .collect();
        assert_eq!(ids, vec!["FIRST", "SECOND", "THIRD"]);
    }

    #[test]
    fn distances_and_times_follow_the_index_model() {
        let now = Utc::now();
        let fleet = vec![
            bin("A1", 90, 0.9),
            bin("A2", 85, 0.8),
            bin("A3", 80, 0.7),
        ];
        let planned = plan(&fleet, DEPOT, now);

        let stops = &planned.route;
        assert_eq!(stops.len(), 3);

        let first = stops.first().expect("three stops");
        assert!((first.distance_from_previous - 2.3).abs() < f64::EPSILON);
        assert_eq!(first.travel_time_minutes, 7); // round(2.3 * 3) = 7
        assert_eq!(first.estimated_arrival, now + Duration::minutes(7));

        let second = stops.get(1).expect("three stops");
        assert!((second.distance_from_previous - 3.1).abs() < f64::EPSILON);
        assert_eq!(second.travel_time_minutes, 9); // round(3.1 * 3) = 9
        assert_eq!(second.estimated_arrival, now + Duration::minutes(20 + 9));

        let third = stops.get(2).expect("three stops");
        assert!((third.distance_from_previous - 3.9).abs() < f64::EPSILON);
        assert_eq!(third.travel_time_minutes, 12); // round(3.9 * 3) = 12
        assert_eq!(third.estimated_arrival, now + Duration::minutes(40 + 12));

        assert!((planned.summary.total_distance_km - 9.3).abs() < 1e-9);
        assert_eq!(
            planned.summary.estimated_time_minutes,
            7 + 9 + 12 + 3 * COLLECTION_MINUTES
        );
        assert!((planned.summary.fuel_savings_percent - 31.0).abs() < f64::EPSILON);
    }

    #[test]
    fn fuel_savings_cap_at_forty_percent() {
        let fleet: Vec<Bin> = (0..8)
            .map(|index| bin(&format!("BIN{index:03}"), 90, 0.9))
            .collect();
        let planned = plan(&fleet, DEPOT, Utc::now());
        // 25 + 2 * 6 = 37, still under the cap.
        assert!((planned.summary.fuel_savings_percent - 37.0).abs() < f64::EPSILON);
    }

    #[test]
    fn predicted_fill_never_exceeds_one_hundred() {
        let fleet = vec![bin("FULL", 100, 0.95)];
        let planned = plan(&fleet, DEPOT, Utc::now());
        let stop = planned.route.first().expect("one stop");
        assert!((stop.predicted_fill_on_arrival - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn navigation_is_reproducible_under_a_seed() {
        let target = bin("NAV", 60, 0.72);
        let mut first_rng = StdRng::seed_from_u64(11);
        let mut second_rng = StdRng::seed_from_u64(11);

        let first = navigate(&target, DEPOT, &mut first_rng);
        let second = navigate(&target, DEPOT, &mut second_rng);

        assert!((first.distance_km - second.distance_km).abs() < f64::EPSILON);
        assert_eq!(
            first.traffic.estimated_delay_minutes,
            second.traffic.estimated_delay_minutes
        );
        assert_eq!(first.traffic.route_status, second.traffic.route_status);
        assert!((2.3..5.3).contains(&first.distance_km));
        assert!(first.estimated_travel_time_minutes >= 5);
        assert!(first.priority_justification.contains("General Waste"));
    }
}
