//! Notification request model.
//!
//! # Responsibility
//! - Define the outbound notification shape handed to a sink.
//! - Own the canonical texts for task lifecycle events.
//!
//! # Invariants
//! - Building a request never fails: messages are truncated to the limit
//!   instead of rejected, so notification work cannot abort a mutation.
//! - `kind` is a closed set; sinks may branch on it but must accept all.
//!
//! # See also
//! - `crate::notify` for delivery and the best-effort dispatch loop.

use serde::{Deserialize, Serialize};

use crate::model::task::Task;
use crate::model::user::{User, UserId};

/// Longest delivered message body, in characters.
pub const MESSAGE_MAX_CHARS: usize = 500;

/// Category of an outbound notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A task was published to a course the recipient is enrolled in.
    TaskAssigned,
    /// A student turned in work for a task the recipient owns.
    TaskSubmitted,
    /// The recipient's submission was graded.
    TaskGraded,
    /// Direct message arrived; delivered by upstream messaging, kept here
    /// so sinks handle one closed set.
    MessageReceived,
}

impl NotificationKind {
    /// Stable lowercase name used in stored rows and log lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TaskAssigned => "task_assigned",
            Self::TaskSubmitted => "task_submitted",
            Self::TaskGraded => "task_graded",
            Self::MessageReceived => "message_received",
        }
    }
}

/// One notification addressed to one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    /// Short headline; the constructors keep it within 3 to 200 characters.
    pub title: String,
    /// Body text, truncated to `MESSAGE_MAX_CHARS`.
    pub message: String,
    /// Event category.
    pub kind: NotificationKind,
    /// Target user.
    pub recipient: UserId,
}

impl NotificationRequest {
    /// Builds a request, truncating the message to the delivery limit.
    pub fn new(
        title: impl Into<String>,
        message: impl Into<String>,
        kind: NotificationKind,
        recipient: UserId,
    ) -> Self {
        Self {
            title: title.into(),
            message: truncate_message(message.into()),
            kind,
            recipient,
        }
    }

    /// Notice to an enrolled student that a task was published.
    pub fn task_assigned(task: &Task, student: UserId) -> Self {
        Self::new(
            "New Task Assigned",
            format!("A new task has been assigned: {}", task.title),
            NotificationKind::TaskAssigned,
            student,
        )
    }

    /// Notice to the course's teacher that a student turned in work.
    pub fn task_submitted(task: &Task, student: &User, teacher: UserId) -> Self {
        Self::new(
            "New Task Submission",
            format!(
                "Student {} has submitted the task: {}",
                student.full_name, task.title
            ),
            NotificationKind::TaskSubmitted,
            teacher,
        )
    }

    /// Notice to a student that their submission was graded.
    pub fn task_graded(task: &Task, grade: i32, student: UserId) -> Self {
        Self::new(
            "Task Graded",
            format!(
                "Your task '{}' has been graded: {} points",
                task.title, grade
            ),
            NotificationKind::TaskGraded,
            student,
        )
    }
}

fn truncate_message(message: String) -> String {
    if message.chars().count() <= MESSAGE_MAX_CHARS {
        return message;
    }
    let mut truncated: String = message.chars().take(MESSAGE_MAX_CHARS - 3).collect();
    truncated.push_str("...");
    truncated
}
