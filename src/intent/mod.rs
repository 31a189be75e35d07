//! Free text to confirmed task mutations.
//!
//! `parser` turns an utterance into an `Intent`, `confirm` phrases the
//! question asked before a mutation runs, and `executor` runs it against
//! the task store.

pub mod confirm;
pub mod context;
pub mod executor;
pub mod parser;
pub mod resolve;
pub mod scorers;
pub mod types;

pub use confirm::{build_confirmation, ConfirmSnapshot, Confirmation};
pub use context::ConversationContext;
pub use executor::{execute_intent, ExecutionEnv, ExecutionResult};
pub use parser::{parse_intent, ParseSnapshot};
pub use types::*;
