//! Task and client records owned by the store collaborator.
//! The core only ever reads snapshots of these and writes through `TaskStore`.

pub mod client;
pub mod task;

pub use client::*;
pub use task::*;
