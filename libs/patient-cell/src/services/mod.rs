pub mod patient;
pub mod registration;
