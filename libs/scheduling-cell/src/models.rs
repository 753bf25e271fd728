// libs/scheduling-cell/src/models.rs
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc, NaiveDate};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

// ==============================================================================
// SLOT TIME
// ==============================================================================

/// A bookable time of day. The datastore stores appointment times both as
/// `HH:MM` (manual booking grid) and `HH:MM:SS` (automatic allocation), so the
/// value remembers which rendering it was parsed from and round-trips it
/// unchanged. Comparisons and hashing use the time value only: `"09:00"` and
/// `"09:00:00"` are the same slot.
#[derive(Debug, Clone, Copy)]
pub struct SlotTime {
    hour: u8,
    minute: u8,
    second: u8,
    renders_seconds: bool,
}

impl SlotTime {
    pub fn new(hour: u8, minute: u8) -> Self {
        Self { hour, minute, second: 0, renders_seconds: false }
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn second(&self) -> u8 {
        self.second
    }

    /// Switch to the `HH:MM:SS` rendering without changing the value.
    pub fn with_seconds(mut self) -> Self {
        self.renders_seconds = true;
        self
    }

    /// Minute arithmetic with hour carry. Never clamps: 16:50 plus 15 minutes
    /// is 17:05 even though the booking window nominally ends at 17:00.
    pub fn plus_minutes(&self, minutes: u32) -> Self {
        let total = self.minute as u32 + minutes;
        Self {
            hour: self.hour + (total / 60) as u8,
            minute: (total % 60) as u8,
            second: self.second,
            renders_seconds: self.renders_seconds,
        }
    }

    fn value(&self) -> (u8, u8, u8) {
        (self.hour, self.minute, self.second)
    }
}

impl PartialEq for SlotTime {
    fn eq(&self, other: &Self) -> bool {
        self.value() == other.value()
    }
}

impl Eq for SlotTime {}

impl PartialOrd for SlotTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SlotTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value().cmp(&other.value())
    }
}

impl Hash for SlotTime {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value().hash(state);
    }
}

impl fmt::Display for SlotTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.renders_seconds {
            write!(f, "{:02}:{:02}:{:02}", self.hour, self.minute, self.second)
        } else {
            write!(f, "{:02}:{:02}", self.hour, self.minute)
        }
    }
}

impl FromStr for SlotTime {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 2 && parts.len() != 3 {
            return Err(format!("Invalid time value: {}", s));
        }

        let hour: u8 = parts[0].parse().map_err(|_| format!("Invalid hour in: {}", s))?;
        let minute: u8 = parts[1].parse().map_err(|_| format!("Invalid minute in: {}", s))?;
        let second: u8 = if parts.len() == 3 {
            parts[2].parse().map_err(|_| format!("Invalid second in: {}", s))?
        } else {
            0
        };

        if hour > 23 || minute > 59 || second > 59 {
            return Err(format!("Time value out of range: {}", s));
        }

        Ok(Self {
            hour,
            minute,
            second,
            renders_seconds: parts.len() == 3,
        })
    }
}

impl Serialize for SlotTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where S: serde::Serializer {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for SlotTime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where D: serde::Deserializer<'de> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub hospital_id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Option<Uuid>,
    pub scheduled_date: NaiveDate,
    pub start_time: SlotTime,
    pub end_time: SlotTime,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Arrived,
    Completed,
    Cancelled,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "scheduled"),
            AppointmentStatus::Arrived => write!(f, "arrived"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub patient_id: Uuid,
    pub doctor_id: Option<Uuid>,
    pub scheduled_date: NaiveDate,
    pub start_time: SlotTime,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleAppointmentRequest {
    pub new_date: NaiveDate,
    pub new_start_time: SlotTime,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringAppointmentRequest {
    pub patient_id: Uuid,
    pub doctor_id: Option<Uuid>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_time: SlotTime,
    pub frequency: RecurrenceFrequency,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceFrequency {
    Daily,
    Weekly,
    Biweekly,
    Monthly,
}

/// One grid slot with its advisory availability flag. The flag disables the
/// slot in the booking UI; the datastore uniqueness guard stays authoritative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotAvailability {
    pub start_time: SlotTime,
    pub end_time: SlotTime,
    pub booked: bool,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum ScheduleError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Appointment slot was just taken by another booking")]
    SlotTaken,

    #[error("No appointment slots remaining for the day")]
    NoFreeSlot,

    #[error("Invalid appointment time: {0}")]
    InvalidTime(String),

    #[error("Appointment cannot be modified in current status: {0}")]
    InvalidStatusTransition(AppointmentStatus),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl ScheduleError {
    /// Map a datastore failure, keeping the uniqueness-guard rejection typed.
    pub fn from_db(err: shared_database::DbError) -> Self {
        if err.is_conflict() {
            ScheduleError::SlotTaken
        } else {
            ScheduleError::DatabaseError(err.to_string())
        }
    }
}
