//! Submission domain model.
//!
//! # Responsibility
//! - Define one student's answer to one task, including the optional
//!   attachment reference and the grading fields.
//! - Enforce field constraints and the attachment pairing rule.
//!
//! # Invariants
//! - A submission is immutable once stored; resubmission creates a new row.
//! - `file_key` and `file_name` are either both set or both absent.
//! - `status == Graded` exactly when `grade` is set; the two are written
//!   together by the grading flow.
//!
//! # See also
//! - `crate::repo::submission_repo` for persistence and "current" ordering.
//! - `crate::service::submission_service` for the submit/grade flows.

use std::error::Error;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::now_epoch_ms;
use crate::model::task::TaskId;
use crate::model::user::UserId;

/// Stable identifier for a submission.
pub type SubmissionId = Uuid;

/// Longest accepted student comment, in characters.
pub const COMMENT_MAX_CHARS: usize = 500;
/// Longest accepted teacher feedback, in characters.
pub const FEEDBACK_MAX_CHARS: usize = 1000;

/// Grading state of a submission.
///
/// The only transition is `Submitted` to `Graded`; a graded submission
/// never returns to `Submitted`, though its grade may be overwritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// Turned in, waiting for a grade.
    Submitted,
    /// Grade and optional feedback recorded.
    Graded,
}

/// Field-level constraint violation for submission data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionValidationError {
    /// Comment longer than `COMMENT_MAX_CHARS`.
    CommentTooLong { chars: usize },
    /// Feedback longer than `FEEDBACK_MAX_CHARS`.
    FeedbackTooLong { chars: usize },
    /// Exactly one of `file_key` / `file_name` is set.
    AttachmentPairMismatch,
    /// Grade outside `0..=max_points` for the task being graded.
    GradeOutOfRange { grade: i32, max_points: i32 },
    /// `status` and `grade` presence disagree.
    GradeStateMismatch,
}

impl Display for SubmissionValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CommentTooLong { chars } => write!(
                f,
                "submission comment must be at most {COMMENT_MAX_CHARS} characters, got {chars}"
            ),
            Self::FeedbackTooLong { chars } => write!(
                f,
                "submission feedback must be at most {FEEDBACK_MAX_CHARS} characters, got {chars}"
            ),
            Self::AttachmentPairMismatch => write!(
                f,
                "submission attachment key and file name must be set together"
            ),
            Self::GradeOutOfRange { grade, max_points } => write!(
                f,
                "grade must be between 0 and {max_points}, got {grade}"
            ),
            Self::GradeStateMismatch => write!(
                f,
                "submission status and grade presence disagree"
            ),
        }
    }
}

impl Error for SubmissionValidationError {}

/// One student's answer to one task.
///
/// Multiple rows may exist per (task, student) pair; the newest by
/// `submitted_at` is the current one, with the larger `id` breaking ties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    /// Stable global ID; also the deterministic tie-breaker for "current".
    pub id: SubmissionId,
    /// Task being answered.
    pub task_id: TaskId,
    /// Author of the submission.
    pub student_id: UserId,
    /// Optional note from the student, at most 500 characters.
    pub comment: Option<String>,
    /// Attachment store key; set together with `file_name`.
    pub file_key: Option<String>,
    /// Original upload name shown back on download; set with `file_key`.
    pub file_name: Option<String>,
    /// Unix epoch milliseconds when the work was turned in.
    pub submitted_at: i64,
    /// Awarded points, set by grading. Bounded by the task's `points`.
    pub grade: Option<i32>,
    /// Optional teacher feedback, at most 1000 characters.
    pub feedback: Option<String>,
    /// Grading state; moves from `Submitted` to `Graded` only.
    pub status: SubmissionStatus,
}

impl Submission {
    /// Creates a fresh ungraded submission stamped with the current time.
    pub fn new(task_id: TaskId, student_id: UserId, comment: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            task_id,
            student_id,
            comment,
            file_key: None,
            file_name: None,
            submitted_at: now_epoch_ms(),
            grade: None,
            feedback: None,
            status: SubmissionStatus::Submitted,
        }
    }

    /// Records the stored attachment reference on this submission.
    pub fn attach(&mut self, key: impl Into<String>, original_name: impl Into<String>) {
        self.file_key = Some(key.into());
        self.file_name = Some(original_name.into());
    }

    /// Whether a grade has been recorded.
    pub fn is_graded(&self) -> bool {
        self.status == SubmissionStatus::Graded
    }

    /// Whether an attachment reference is present.
    pub fn has_attachment(&self) -> bool {
        self.file_key.is_some()
    }

    /// Checks field constraints and internal consistency.
    ///
    /// The grade range against the task's maximum is enforced by the
    /// grading flow, which knows the task; everything else is checked here.
    pub fn validate(&self) -> Result<(), SubmissionValidationError> {
        check_comment(self.comment.as_deref())?;
        check_feedback(self.feedback.as_deref())?;
        if self.file_key.is_some() != self.file_name.is_some() {
            return Err(SubmissionValidationError::AttachmentPairMismatch);
        }
        let graded = self.status == SubmissionStatus::Graded;
        if graded != self.grade.is_some() {
            return Err(SubmissionValidationError::GradeStateMismatch);
        }
        Ok(())
    }
}

/// Checks a student comment against the length limit.
pub fn check_comment(comment: Option<&str>) -> Result<(), SubmissionValidationError> {
    if let Some(text) = comment {
        let chars = text.chars().count();
        if chars > COMMENT_MAX_CHARS {
            return Err(SubmissionValidationError::CommentTooLong { chars });
        }
    }
    Ok(())
}

/// Checks teacher feedback against the length limit.
pub fn check_feedback(feedback: Option<&str>) -> Result<(), SubmissionValidationError> {
    if let Some(text) = feedback {
        let chars = text.chars().count();
        if chars > FEEDBACK_MAX_CHARS {
            return Err(SubmissionValidationError::FeedbackTooLong { chars });
        }
    }
    Ok(())
}

/// Checks an awarded grade against a task's maximum points.
pub fn check_grade(grade: i32, max_points: i32) -> Result<(), SubmissionValidationError> {
    if grade < 0 || grade > max_points {
        return Err(SubmissionValidationError::GradeOutOfRange { grade, max_points });
    }
    Ok(())
}
