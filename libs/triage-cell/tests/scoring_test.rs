// libs/triage-cell/tests/scoring_test.rs
use chrono::Utc;
use uuid::Uuid;

use triage_cell::models::{TriageLevel, VitalSignsRecord};
use triage_cell::services::scoring::{classify, priority_score};

fn empty_vitals() -> VitalSignsRecord {
    VitalSignsRecord {
        id: Uuid::new_v4(),
        hospital_id: Uuid::new_v4(),
        patient_id: Uuid::new_v4(),
        temperature_celsius: None,
        heart_rate_bpm: None,
        systolic_mmhg: None,
        diastolic_mmhg: None,
        oxygen_saturation_pct: None,
        weight_kg: None,
        complaints: None,
        recorded_by: None,
        recorded_at: Utc::now(),
    }
}

fn with_temperature(value: f64) -> VitalSignsRecord {
    VitalSignsRecord { temperature_celsius: Some(value), ..empty_vitals() }
}

fn with_heart_rate(value: i32) -> VitalSignsRecord {
    VitalSignsRecord { heart_rate_bpm: Some(value), ..empty_vitals() }
}

fn with_blood_pressure(systolic: Option<i32>, diastolic: Option<i32>) -> VitalSignsRecord {
    VitalSignsRecord { systolic_mmhg: systolic, diastolic_mmhg: diastolic, ..empty_vitals() }
}

fn with_oxygen(value: f64) -> VitalSignsRecord {
    VitalSignsRecord { oxygen_saturation_pct: Some(value), ..empty_vitals() }
}

#[test]
fn unmeasured_vitals_score_zero() {
    let vitals = empty_vitals();

    assert_eq!(priority_score(&vitals), 0);
    assert_eq!(classify(0), TriageLevel::Low);
}

#[test]
fn temperature_bands_score_their_worst_tier_only() {
    // Severe band scores exactly 3, never 3+2+1
    assert_eq!(priority_score(&with_temperature(34.0)), 3);
    assert_eq!(priority_score(&with_temperature(34.9)), 3);
    assert_eq!(priority_score(&with_temperature(40.1)), 3);

    assert_eq!(priority_score(&with_temperature(35.5)), 2);
    assert_eq!(priority_score(&with_temperature(38.5)), 2);

    assert_eq!(priority_score(&with_temperature(36.05)), 1);
    assert_eq!(priority_score(&with_temperature(37.5)), 1);

    assert_eq!(priority_score(&with_temperature(36.5)), 0);
    assert_eq!(priority_score(&with_temperature(37.2)), 0);
}

#[test]
fn heart_rate_skips_the_one_point_tier() {
    assert_eq!(priority_score(&with_heart_rate(45)), 3);
    assert_eq!(priority_score(&with_heart_rate(130)), 3);

    assert_eq!(priority_score(&with_heart_rate(55)), 2);
    assert_eq!(priority_score(&with_heart_rate(110)), 2);

    assert_eq!(priority_score(&with_heart_rate(60)), 0);
    assert_eq!(priority_score(&with_heart_rate(80)), 0);
    assert_eq!(priority_score(&with_heart_rate(100)), 0);
}

#[test]
fn blood_pressure_uses_or_logic_across_components() {
    // Either component past a tier's threshold triggers that tier
    assert_eq!(priority_score(&with_blood_pressure(Some(150), Some(80))), 2);
    assert_eq!(priority_score(&with_blood_pressure(Some(110), Some(95))), 2);
    assert_eq!(priority_score(&with_blood_pressure(Some(190), Some(70))), 3);
    assert_eq!(priority_score(&with_blood_pressure(Some(110), Some(120))), 3);
    assert_eq!(priority_score(&with_blood_pressure(Some(121), Some(80))), 1);
    assert_eq!(priority_score(&with_blood_pressure(Some(120), Some(80))), 0);
}

#[test]
fn missing_blood_pressure_component_cannot_trigger() {
    assert_eq!(priority_score(&with_blood_pressure(Some(150), None)), 2);
    assert_eq!(priority_score(&with_blood_pressure(None, Some(95))), 2);
    assert_eq!(priority_score(&with_blood_pressure(None, None)), 0);
}

#[test]
fn oxygen_saturation_bands() {
    assert_eq!(priority_score(&with_oxygen(85.0)), 3);
    assert_eq!(priority_score(&with_oxygen(89.9)), 3);
    assert_eq!(priority_score(&with_oxygen(93.0)), 2);
    assert_eq!(priority_score(&with_oxygen(97.0)), 1);
    assert_eq!(priority_score(&with_oxygen(98.0)), 0);
    assert_eq!(priority_score(&with_oxygen(99.0)), 0);
}

#[test]
fn contributions_sum_across_vitals() {
    let vitals = VitalSignsRecord {
        temperature_celsius: Some(39.5),     // 3
        heart_rate_bpm: Some(110),           // 2
        systolic_mmhg: Some(150),            // 2
        diastolic_mmhg: Some(85),
        oxygen_saturation_pct: Some(96.0),   // 1
        ..empty_vitals()
    };

    assert_eq!(priority_score(&vitals), 8);
    assert_eq!(classify(8), TriageLevel::Critical);
}

#[test]
fn worst_case_vitals_hit_the_theoretical_maximum() {
    let vitals = VitalSignsRecord {
        temperature_celsius: Some(33.0),
        heart_rate_bpm: Some(140),
        systolic_mmhg: Some(200),
        diastolic_mmhg: Some(120),
        oxygen_saturation_pct: Some(80.0),
        ..empty_vitals()
    };

    assert_eq!(priority_score(&vitals), 12);
}

#[test]
fn classification_bands() {
    assert_eq!(classify(0), TriageLevel::Low);
    assert_eq!(classify(1), TriageLevel::Medium);
    assert_eq!(classify(2), TriageLevel::Medium);
    assert_eq!(classify(3), TriageLevel::High);
    assert_eq!(classify(5), TriageLevel::High);
    assert_eq!(classify(6), TriageLevel::Critical);
    assert_eq!(classify(12), TriageLevel::Critical);
}
