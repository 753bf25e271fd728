// libs/triage-cell/src/models.rs
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use std::fmt;

use scheduling_cell::models::Appointment;

// ==============================================================================
// VITAL SIGNS MODELS
// ==============================================================================

/// One timestamped vitals snapshot for a patient. Append-only: records are
/// never updated after creation. Any field may be unmeasured.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VitalSignsRecord {
    pub id: Uuid,
    pub hospital_id: Uuid,
    pub patient_id: Uuid,
    pub temperature_celsius: Option<f64>,
    pub heart_rate_bpm: Option<i32>,
    pub systolic_mmhg: Option<i32>,
    pub diastolic_mmhg: Option<i32>,
    pub oxygen_saturation_pct: Option<f64>,
    pub weight_kg: Option<f64>,
    pub complaints: Option<String>,
    pub recorded_by: Option<Uuid>,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordVitalsRequest {
    pub patient_id: Uuid,
    pub temperature_celsius: Option<f64>,
    pub heart_rate_bpm: Option<i32>,
    pub systolic_mmhg: Option<i32>,
    pub diastolic_mmhg: Option<i32>,
    pub oxygen_saturation_pct: Option<f64>,
    pub weight_kg: Option<f64>,
    pub complaints: Option<String>,
}

// ==============================================================================
// TRIAGE QUEUE MODELS
// ==============================================================================

/// Urgency band shown next to a queue entry. Presentation only - ordering
/// uses the raw score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TriageLevel {
    Critical,
    High,
    Medium,
    Low,
}

impl fmt::Display for TriageLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriageLevel::Critical => write!(f, "Critical"),
            TriageLevel::High => write!(f, "High"),
            TriageLevel::Medium => write!(f, "Medium"),
            TriageLevel::Low => write!(f, "Low"),
        }
    }
}

/// One position in the day's triage queue. Derived on every fetch, never
/// persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageQueueEntry {
    pub patient_id: Uuid,
    pub vitals: VitalSignsRecord,
    pub appointment: Option<Appointment>,
    pub priority_score: i32,
    pub level: TriageLevel,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum TriageError {
    #[error("Patient not found")]
    PatientNotFound,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl TriageError {
    pub fn from_db(err: shared_database::DbError) -> Self {
        TriageError::DatabaseError(err.to_string())
    }
}
