pub mod handlers;
pub mod router;
pub mod models;
pub mod services;

pub use models::{TriageLevel, TriageQueueEntry, VitalSignsRecord};
pub use services::scoring::{classify, priority_score};
