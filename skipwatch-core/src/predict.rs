//! Overflow prediction: time-to-threshold estimates and a four-factor risk
//! assessment with textual recommendations.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::Serialize;

use crate::model::{Bin, BinId, WasteType};

/// Temperature above which the sensor-anomaly risk signal fires, in °C.
const ANOMALY_TEMPERATURE: f64 = 35.0;

/// Baseline fill rate of a waste category in percent per day.
#[must_use]
pub fn base_fill_rate(waste_type: WasteType) -> f64 {
    match waste_type {
        WasteType::General => 8.0,
        WasteType::Recycling => 5.0,
        WasteType::Organic => 12.0,
        WasteType::Hazardous => 3.0,
    }
}

/// Heuristic daily fill rate: the per-type baseline perturbed by a bounded
/// jitter in [-2, +3) emulating sensor noise. Callers inject the rng so the
/// draw is seedable; a trained model may replace this entirely (see
/// [`crate::ports::FillRateModel`]).
pub fn heuristic_fill_rate<R: Rng + ?Sized>(waste_type: WasteType, rng: &mut R) -> f64 {
    base_fill_rate(waste_type) + rng.gen_range(-2.0..3.0)
}

/// Inherent risk of a waste category, in [0, 1].
#[must_use]
pub fn waste_type_risk(waste_type: WasteType) -> f64 {
    match waste_type {
        WasteType::Hazardous => 0.9,
        WasteType::Organic => 0.7,
        WasteType::Recycling => 0.4,
        WasteType::General => 0.5,
    }
}

#[derive(Debug, Clone, Serialize)]
/// Projected hours until each fill threshold is reached.
pub struct FillPredictions {
    /// Hours until 80% fill; 0 when already at or above.
    pub hours_to_80_percent: f64,
    /// Hours until 90% fill; 0 when already at or above.
    pub hours_to_90_percent: f64,
    /// Hours until the bin is full; 0 when already full.
    pub hours_to_full: f64,
    /// Daily fill rate the projection used, percent per day.
    pub daily_fill_rate_percent: f64,
    /// Suggested collection time, when the 90% threshold is projected to hit.
    pub predicted_collection_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize)]
/// The four independent risk signals, each normalized to [0, 1].
pub struct RiskFactors {
    /// Current fill as a fraction of capacity.
    pub fill_level_risk: f64,
    /// Inherent risk of the waste category.
    pub waste_type_risk: f64,
    /// Telemetry staleness, saturating after a week.
    pub time_risk: f64,
    /// 0.1 when the temperature reading looks anomalous, else 0.
    pub sensor_anomaly_risk: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
/// Bucketed overall risk.
pub enum RiskLevel {
    /// Overall risk above 0.7.
    High,
    /// Overall risk above 0.4.
    Medium,
    /// Everything else.
    Low,
}

#[derive(Debug, Clone, Serialize)]
/// Equal-weight aggregation of the risk signals plus operator guidance.
pub struct RiskAssessment {
    /// Arithmetic mean of the four factors.
    pub overall_risk_score: f64,
    /// Bucketed overall risk.
    pub risk_level: RiskLevel,
    /// The individual signals that went into the mean.
    pub factors: RiskFactors,
    /// Fixed-ladder recommendations plus type-specific add-ons.
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
/// Full prediction output for one bin.
pub struct OverflowForecast {
    /// Bin the forecast refers to.
    pub bin_id: BinId,
    /// Time-to-threshold projections.
    pub predictions: FillPredictions,
    /// Risk aggregation and recommendations.
    pub risk_assessment: RiskAssessment,
}

/// Project time-to-threshold and assess overall risk for one bin.
///
/// `daily_rate` comes from [`heuristic_fill_rate`] or an externally trained
/// model; the projection itself is a pure function of its inputs. An absent
/// update timestamp never aborts the prediction — the time-risk signal
/// falls back to zero, as if the sensor had just reported.
#[must_use]
pub fn predict(bin: &Bin, now: DateTime<Utc>, daily_rate: f64) -> OverflowForecast {
    let hours_to_80 = hours_to_threshold(bin.fill_level, 80, daily_rate);
    let hours_to_90 = hours_to_threshold(bin.fill_level, 90, daily_rate);
    let hours_to_full = hours_to_threshold(bin.fill_level, 100, daily_rate);

    let factors = RiskFactors {
        fill_level_risk: f64::from(bin.fill_level) / 100.0,
        waste_type_risk: waste_type_risk(bin.waste_type),
        time_risk: time_risk(bin.last_update, now),
        sensor_anomaly_risk: if bin.temperature > ANOMALY_TEMPERATURE {
            0.1
        } else {
            0.0
        },
    };

    let overall = (factors.fill_level_risk
        + factors.waste_type_risk
        + factors.time_risk
        + factors.sensor_anomaly_risk)
        / 4.0;

    let risk_level = if overall > 0.7 {
        RiskLevel::High
    } else if overall > 0.4 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    OverflowForecast {
        bin_id: bin.id.clone(),
        predictions: FillPredictions {
            hours_to_80_percent: round1(hours_to_80),
            hours_to_90_percent: round1(hours_to_90),
            hours_to_full: round1(hours_to_full),
            daily_fill_rate_percent: round2(daily_rate),
            predicted_collection_date: now + Duration::minutes((hours_to_90 * 60.0) as i64),
        },
        risk_assessment: RiskAssessment {
            overall_risk_score: round3(overall),
            risk_level,
            factors,
            recommendations: recommendations(overall, bin.waste_type),
        },
    }
}

/// Hours until `threshold` percent at `daily_rate` percent per day; 0 when
/// the bin is already at or above the threshold.
fn hours_to_threshold(fill_level: u8, threshold: u8, daily_rate: f64) -> f64 {
    if fill_level >= threshold {
        return 0.0;
    }
    ((f64::from(threshold) - f64::from(fill_level)) / daily_rate * 24.0).max(0.0)
}

/// Staleness risk: saturates at 1.0 after a week. A missing timestamp reads
/// as "just reported" rather than as a fault.
fn time_risk(last_update: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    last_update.map_or(0.0, |updated| {
        let days = (now - updated).num_days();
        (days as f64 / 7.0).min(1.0)
    })
}

fn recommendations(overall_risk: f64, waste_type: WasteType) -> Vec<String> {
    let ladder = if overall_risk > 0.8 {
        "Immediate collection required"
    } else if overall_risk > 0.6 {
        "Schedule collection within 24 hours"
    } else if overall_risk > 0.4 {
        "Monitor closely, collection needed soon"
    } else {
        "Normal monitoring schedule"
    };

    let mut all = vec![ladder.to_owned()];
    match waste_type {
        WasteType::Hazardous => all.push("Special handling equipment required".to_owned()),
        WasteType::Organic => {
            all.push("Priority collection due to decomposition risk".to_owned());
        }
        WasteType::General | WasteType::Recycling => {}
    }
    all
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::model::{BinId, BinStatus, Coordinates, Priority};

    fn bin(waste_type: WasteType, fill_level: u8, temperature: f64) -> Bin {
        Bin {
            id: BinId("BIN007".to_owned()),
            waste_type,
            location: "Industrial Zone".to_owned(),
            address: "321 Industrial Ave".to_owned(),
            fill_level,
            capacity: 100,
            hazard_score: 3,
            coordinates: Coordinates {
                lat: 40.7505,
                lng: -73.9934,
            },
            battery_level: 80,
            temperature,
            weight: 12.0,
            signal_strength: 75,
            last_update: Some(Utc::now()),
            status: BinStatus::Normal,
            priority: Priority::Low,
            priority_score: 0.0,
        }
    }

    #[test]
    fn thresholds_already_crossed_report_zero_hours() {
        let forecast = predict(&bin(WasteType::General, 92, 20.0), Utc::now(), 8.0);
        assert!((forecast.predictions.hours_to_80_percent - 0.0).abs() < f64::EPSILON);
        assert!((forecast.predictions.hours_to_90_percent - 0.0).abs() < f64::EPSILON);
        assert!(forecast.predictions.hours_to_full > 0.0);
    }

    #[test]
    fn hours_scale_with_the_daily_rate() {
        // 40 points to go at 8 %/day is 5 days, i.e. 120 hours.
        let forecast = predict(&bin(WasteType::General, 40, 20.0), Utc::now(), 8.0);
        assert!((forecast.predictions.hours_to_80_percent - 120.0).abs() < 0.05);
        assert!((forecast.predictions.hours_to_full - 180.0).abs() < 0.05);
    }

    #[test]
    fn heuristic_rate_stays_within_jitter_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let rate = heuristic_fill_rate(WasteType::Organic, &mut rng);
            assert!((10.0..15.0).contains(&rate), "rate {rate} outside bounds");
        }
    }

    #[test]
    fn seeded_heuristic_is_reproducible() {
        let mut first = StdRng::seed_from_u64(99);
        let mut second = StdRng::seed_from_u64(99);
        for _ in 0..10 {
            let left = heuristic_fill_rate(WasteType::General, &mut first);
            let right = heuristic_fill_rate(WasteType::General, &mut second);
            assert!((left - right).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn risk_is_the_mean_of_four_factors() {
        let now = Utc::now();
        // Fresh hazardous bin at 60%: (0.6 + 0.9 + 0.0 + 0.0) / 4 = 0.375.
        let forecast = predict(&bin(WasteType::Hazardous, 60, 20.0), now, 3.0);
        assert!((forecast.risk_assessment.overall_risk_score - 0.375).abs() < 1e-9);
        assert_eq!(forecast.risk_assessment.risk_level, RiskLevel::Low);
    }

    #[test]
    fn hot_sensor_adds_anomaly_risk() {
        let now = Utc::now();
        let cool = predict(&bin(WasteType::General, 40, 20.0), now, 8.0);
        let hot = predict(&bin(WasteType::General, 40, 36.0), now, 8.0);
        let delta = hot.risk_assessment.overall_risk_score
            - cool.risk_assessment.overall_risk_score;
        assert!((delta - 0.025).abs() < 1e-9);
    }

    #[test]
    fn missing_timestamp_does_not_abort_prediction() {
        let mut snapshot = bin(WasteType::Recycling, 50, 20.0);
        snapshot.last_update = None;
        let forecast = predict(&snapshot, Utc::now(), 5.0);
        assert!((forecast.risk_assessment.factors.time_risk - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn recommendations_follow_the_ladder_and_type_addons() {
        let now = Utc::now();
        // Full, stale organic bin: (1.0 + 0.7 + 1.0 + 0.0) / 4 = 0.675.
        let mut stale = bin(WasteType::Organic, 100, 20.0);
        stale.last_update = Some(now - chrono::Duration::days(10));
        let forecast = predict(&stale, now, 12.0);
        assert_eq!(forecast.risk_assessment.risk_level, RiskLevel::Medium);
        assert_eq!(
            forecast.risk_assessment.recommendations,
            vec![
                "Schedule collection within 24 hours".to_owned(),
                "Priority collection due to decomposition risk".to_owned(),
            ]
        );

        let calm = predict(&bin(WasteType::General, 10, 20.0), now, 8.0);
        assert_eq!(
            calm.risk_assessment.recommendations,
            vec!["Normal monitoring schedule".to_owned()]
        );
    }
}
