pub mod config;
pub mod error;
pub mod intent;
pub mod kernel;
pub mod model;
pub mod patterns;
pub mod store;
pub mod telemetry;

pub use config::EngineConfig;
pub use kernel::{Engine, Session};
