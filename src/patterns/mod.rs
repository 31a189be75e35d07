//! Behavioral pattern detection: postponed tasks, approaching deadlines and
//! client names typed into titles, surfaced as rate-limited suggestions.

pub mod detector;
pub mod store;
pub mod types;

pub use detector::{detect, DetectionOutcome, DetectionSnapshot};
pub use store::{PatternAccess, PatternStore};
pub use types::*;
