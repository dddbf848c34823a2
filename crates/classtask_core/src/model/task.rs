//! Task domain model.
//!
//! # Responsibility
//! - Define the assignment record attached to a course.
//! - Enforce field constraints before any write reaches storage.
//!
//! # Invariants
//! - `title` is 3 to 200 characters; `description` is at most 1000.
//! - `points` is never negative; grades are later bounded by it.
//! - `status` starts at `Pending` and is managed manually by the teacher.
//!
//! # See also
//! - `crate::repo::task_repo` for persistence.
//! - `crate::service::task_service` for lifecycle and notification fan-out.

use std::error::Error;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::course::CourseId;
use crate::model::now_epoch_ms;

/// Stable identifier for a task.
pub type TaskId = Uuid;

/// Shortest accepted task title, in characters.
pub const TITLE_MIN_CHARS: usize = 3;
/// Longest accepted task title, in characters.
pub const TITLE_MAX_CHARS: usize = 200;
/// Longest accepted task description, in characters.
pub const DESCRIPTION_MAX_CHARS: usize = 1000;

/// Publication state of a task.
///
/// The owning teacher moves a task through these states by editing it;
/// nothing in the core advances the state automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Created, not yet open for work.
    Pending,
    /// Open for submissions.
    Active,
    /// Past its useful life; kept for history.
    Closed,
}

/// Field-level constraint violation for task data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    /// Title length outside `TITLE_MIN_CHARS..=TITLE_MAX_CHARS`.
    TitleLength { chars: usize },
    /// Description longer than `DESCRIPTION_MAX_CHARS`.
    DescriptionTooLong { chars: usize },
    /// Maximum points below zero.
    NegativePoints { points: i32 },
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TitleLength { chars } => write!(
                f,
                "task title must be between {TITLE_MIN_CHARS} and {TITLE_MAX_CHARS} characters, got {chars}"
            ),
            Self::DescriptionTooLong { chars } => write!(
                f,
                "task description must be at most {DESCRIPTION_MAX_CHARS} characters, got {chars}"
            ),
            Self::NegativePoints { points } => {
                write!(f, "task points must not be negative, got {points}")
            }
        }
    }
}

impl Error for TaskValidationError {}

/// Assignment published to a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Stable global ID referenced by submissions.
    pub id: TaskId,
    /// Course this task belongs to; ownership checks go through it.
    pub course_id: CourseId,
    /// Short human-facing title, 3 to 200 characters.
    pub title: String,
    /// Optional longer instructions, at most 1000 characters.
    pub description: Option<String>,
    /// Due date as Unix epoch milliseconds. Informational only; late
    /// submissions are accepted and flagged by callers, not rejected.
    pub due_at: i64,
    /// Maximum achievable points; upper bound for grades.
    pub points: i32,
    /// Manual publication state.
    pub status: TaskStatus,
    /// Unix epoch milliseconds at creation.
    pub created_at: i64,
    /// Unix epoch milliseconds of the last edit, if any.
    pub updated_at: Option<i64>,
}

/// Input for creating a task.
///
/// Carries only the teacher-supplied fields; identity, status and
/// timestamps are assigned at creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub due_at: i64,
    pub points: i32,
}

/// Input for editing a task.
///
/// Every field overwrites the stored value; there is no partial patch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskChanges {
    pub title: String,
    pub description: Option<String>,
    pub due_at: i64,
    pub points: i32,
    pub status: TaskStatus,
}

impl Task {
    /// Materializes a draft into a new `Pending` task for a course.
    pub fn from_draft(course_id: CourseId, draft: &TaskDraft) -> Self {
        Self {
            id: Uuid::new_v4(),
            course_id,
            title: draft.title.clone(),
            description: draft.description.clone(),
            due_at: draft.due_at,
            points: draft.points,
            status: TaskStatus::Pending,
            created_at: now_epoch_ms(),
            updated_at: None,
        }
    }

    /// Applies a full edit, keeping identity and creation time.
    ///
    /// `updated_at` is stamped by the repository at write time.
    pub fn with_changes(&self, changes: &TaskChanges) -> Self {
        Self {
            id: self.id,
            course_id: self.course_id,
            title: changes.title.clone(),
            description: changes.description.clone(),
            due_at: changes.due_at,
            points: changes.points,
            status: changes.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// Checks all field constraints.
    ///
    /// Write paths call this before SQL; read paths call it to reject
    /// invalid persisted state instead of masking it.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        check_title(&self.title)?;
        check_description(self.description.as_deref())?;
        check_points(self.points)
    }

    /// Whether the due date is in the past relative to `at`.
    pub fn is_overdue_at(&self, at: i64) -> bool {
        self.due_at < at
    }
}

impl TaskDraft {
    /// Checks the teacher-supplied fields against task constraints.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        check_title(&self.title)?;
        check_description(self.description.as_deref())?;
        check_points(self.points)
    }
}

impl TaskChanges {
    /// Checks the edited fields against task constraints.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        check_title(&self.title)?;
        check_description(self.description.as_deref())?;
        check_points(self.points)
    }
}

fn check_title(title: &str) -> Result<(), TaskValidationError> {
    let chars = title.chars().count();
    if chars < TITLE_MIN_CHARS || chars > TITLE_MAX_CHARS {
        return Err(TaskValidationError::TitleLength { chars });
    }
    Ok(())
}

fn check_description(description: Option<&str>) -> Result<(), TaskValidationError> {
    if let Some(text) = description {
        let chars = text.chars().count();
        if chars > DESCRIPTION_MAX_CHARS {
            return Err(TaskValidationError::DescriptionTooLong { chars });
        }
    }
    Ok(())
}

fn check_points(points: i32) -> Result<(), TaskValidationError> {
    if points < 0 {
        return Err(TaskValidationError::NegativePoints { points });
    }
    Ok(())
}
