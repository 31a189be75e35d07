//! Content-free session telemetry.
//!
//! Events carry kinds, counts and outcomes only. Never text typed by the
//! user, task titles or client names. Decision logic never reads it.

pub mod event;
pub mod metrics;
pub mod recorder;

pub use event::*;
pub use metrics::{compute_snapshot, TelemetrySnapshot};
pub use recorder::TelemetryRecorder;
