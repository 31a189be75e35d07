pub mod engine;
pub mod scheduler;
pub mod session;
pub mod time;

pub use engine::{run_scan, Engine, ScanReport, SharedEngine};
pub use scheduler::{ScanReason, ScanScheduler, ScanTrigger};
pub use session::{Reply, Session};
pub use time::{Clock, FixedClock, Moment, SystemClock};
