// libs/lab-cell/src/models.rs
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use std::fmt;

// ==============================================================================
// LAB ORDER MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabOrder {
    pub id: Uuid,
    pub hospital_id: Uuid,
    pub patient_id: Uuid,
    pub test_name: String,
    pub status: LabOrderStatus,
    pub bill_id: Option<Uuid>,
    pub result: Option<String>,
    pub ordered_by: Option<Uuid>,
    pub ordered_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Lab workflow states, forward-only. The first two transitions are gated on
/// the linked bill being fully paid.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LabOrderStatus {
    Ordered,
    SampleCollected,
    InProgress,
    Completed,
}

impl fmt::Display for LabOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabOrderStatus::Ordered => write!(f, "ordered"),
            LabOrderStatus::SampleCollected => write!(f, "sample_collected"),
            LabOrderStatus::InProgress => write!(f, "in_progress"),
            LabOrderStatus::Completed => write!(f, "completed"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLabOrderRequest {
    pub patient_id: Uuid,
    pub test_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordResultRequest {
    pub result: String,
}

// ==============================================================================
// BILLING MODELS
// ==============================================================================

/// The finance-side bill a lab order is gated on. Modeled only as far as the
/// gate needs it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bill {
    pub id: Uuid,
    pub hospital_id: Uuid,
    pub patient_id: Uuid,
    pub amount: f64,
    pub amount_paid: f64,
    pub paid: bool,
    pub created_at: DateTime<Utc>,
}

impl Bill {
    pub fn is_settled(&self) -> bool {
        self.amount_paid >= self.amount
    }

    pub fn outstanding(&self) -> f64 {
        (self.amount - self.amount_paid).max(0.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillItem {
    pub id: Uuid,
    pub bill_id: Uuid,
    pub description: String,
    pub amount: f64,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum LabError {
    #[error("Lab order not found")]
    NotFound,

    #[error("Payment of {outstanding:.2} is still outstanding on this order's bill")]
    PaymentRequired { outstanding: f64 },

    #[error("No bill is linked to this lab order yet")]
    BillNotLinked,

    #[error("Lab order cannot move from {0} to the requested status")]
    InvalidStatusTransition(LabOrderStatus),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl LabError {
    pub fn from_db(err: shared_database::DbError) -> Self {
        LabError::DatabaseError(err.to_string())
    }
}
