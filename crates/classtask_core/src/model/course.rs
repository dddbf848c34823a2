//! Course record as seen by the coursework core.
//!
//! # Responsibility
//! - Define the minimal course shape needed for ownership checks and
//!   roster-driven notification fan-out.
//!
//! # Invariants
//! - `teacher_id` is the single owner; task management rights derive from it.
//! - Enrollment lives in a join table, not on this record.
//!
//! # See also
//! - `crate::directory` for enrollment and ownership queries.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::now_epoch_ms;
use crate::model::user::UserId;

/// Stable identifier for a course.
pub type CourseId = Uuid;

/// Course as stored in the directory.
///
/// Course administration (creation forms, join codes, archival) is handled
/// upstream; the core only reads ownership and roster facts from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseRecord {
    /// Stable global ID referenced by tasks.
    pub id: CourseId,
    /// Human-facing course name.
    pub name: String,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Short join code students use upstream to enroll.
    pub code: String,
    /// Owning teacher; grants `can_manage_task` over the course's tasks.
    pub teacher_id: UserId,
    /// Inactive courses are kept for history but accept no new work.
    pub active: bool,
    /// Unix epoch milliseconds at creation.
    pub created_at: i64,
}

impl CourseRecord {
    /// Creates an active course owned by `teacher_id`.
    pub fn new(name: impl Into<String>, code: impl Into<String>, teacher_id: UserId) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            code: code.into(),
            teacher_id,
            active: true,
            created_at: now_epoch_ms(),
        }
    }
}
