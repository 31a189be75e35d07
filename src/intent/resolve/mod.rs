//! Pure lexical helpers shared by the scorers, the confirmation builder and
//! the executor.

pub mod client;
pub mod date;
pub mod synonyms;
pub mod task;
pub mod time;

pub use client::{match_client, mentions_name, title_mentions_name};
pub use date::{resolve_date, DateMatch};
pub use synonyms::{count_matching, matches_group, SynonymGroup, SYNONYM_GROUPS};
pub use task::{matching_tasks, resolve_task};
pub use time::{resolve_time, TimeMatch};
