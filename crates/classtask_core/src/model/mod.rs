//! Domain model for coursework: people, courses, tasks, submissions.
//!
//! # Responsibility
//! - Define the canonical data structures used by core business logic.
//! - Keep field-level constraints (lengths, ranges, pairings) next to the
//!   types they constrain.
//!
//! # Invariants
//! - Every domain object is identified by a stable `Uuid`-backed alias.
//! - Timestamps are Unix epoch milliseconds (`i64`) everywhere.
//!
//! # See also
//! - `repo` for persistence of tasks and submissions.
//! - `directory` for persistence of users, courses and enrollment.

use std::time::{SystemTime, UNIX_EPOCH};

pub mod course;
pub mod notification;
pub mod submission;
pub mod task;
pub mod user;

/// Current wall-clock time as Unix epoch milliseconds.
///
/// A clock set before 1970 yields 0 instead of an error.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis() as i64)
}
