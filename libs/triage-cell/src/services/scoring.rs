// libs/triage-cell/src/services/scoring.rs
//
// Clinical urgency scoring over a vitals snapshot. Each vital contributes
// points for the single worst band it falls in; bands are checked most severe
// first and short-circuit, so a reading never accumulates points from more
// than one tier. An unmeasured vital contributes nothing.

use crate::models::{TriageLevel, VitalSignsRecord};

/// Total urgency score for a vitals snapshot. Pure function of its input.
pub fn priority_score(vitals: &VitalSignsRecord) -> i32 {
    temperature_points(vitals.temperature_celsius)
        + heart_rate_points(vitals.heart_rate_bpm)
        + blood_pressure_points(vitals.systolic_mmhg, vitals.diastolic_mmhg)
        + oxygen_saturation_points(vitals.oxygen_saturation_pct)
}

/// Urgency band for display. Ordering always uses the raw score.
pub fn classify(score: i32) -> TriageLevel {
    match score {
        s if s >= 6 => TriageLevel::Critical,
        3..=5 => TriageLevel::High,
        1..=2 => TriageLevel::Medium,
        _ => TriageLevel::Low,
    }
}

/// Normal 36.1-37.2. One point just outside, two outside 36-38, three
/// outside 35-39.
fn temperature_points(value: Option<f64>) -> i32 {
    let Some(temp) = value else { return 0 };

    if temp < 35.0 || temp > 39.0 {
        3
    } else if temp < 36.0 || temp > 38.0 {
        2
    } else if temp < 36.1 || temp > 37.2 {
        1
    } else {
        0
    }
}

/// Normal 60-100 bpm. Mild deviation is not scored; two points outside the
/// normal range, three outside 50-120.
fn heart_rate_points(value: Option<i32>) -> i32 {
    let Some(rate) = value else { return 0 };

    if rate < 50 || rate > 120 {
        3
    } else if rate < 60 || rate > 100 {
        2
    } else {
        0
    }
}

/// Normal at or below 120/80. Either component exceeding a tier's threshold
/// triggers that tier. A missing component simply cannot trigger.
fn blood_pressure_points(systolic: Option<i32>, diastolic: Option<i32>) -> i32 {
    let exceeds = |systolic_limit: i32, diastolic_limit: i32| {
        systolic.is_some_and(|s| s > systolic_limit)
            || diastolic.is_some_and(|d| d > diastolic_limit)
    };

    if exceeds(180, 110) {
        3
    } else if exceeds(140, 90) {
        2
    } else if exceeds(120, 80) {
        1
    } else {
        0
    }
}

/// Normal above 98%. One point from 95, two from 90, three below 90.
fn oxygen_saturation_points(value: Option<f64>) -> i32 {
    let Some(saturation) = value else { return 0 };

    if saturation < 90.0 {
        3
    } else if saturation < 95.0 {
        2
    } else if saturation < 98.0 {
        1
    } else {
        0
    }
}
