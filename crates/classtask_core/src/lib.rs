//! Core domain logic for ClassTask coursework.
//! This crate is the single source of truth for business invariants.

pub mod access;
pub mod db;
pub mod directory;
pub mod logging;
pub mod model;
pub mod notify;
pub mod repo;
pub mod service;
pub mod storage;

pub use directory::{DirectoryError, DirectoryProvider, SqliteDirectory};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::course::{CourseId, CourseRecord};
pub use model::notification::{NotificationKind, NotificationRequest};
pub use model::submission::{
    Submission, SubmissionId, SubmissionStatus, SubmissionValidationError,
};
pub use model::task::{Task, TaskChanges, TaskDraft, TaskId, TaskStatus, TaskValidationError};
pub use model::user::{Role, User, UserId};
pub use notify::{DeliveryReport, NotificationSink, SinkError, SqliteNotificationSink};
pub use repo::{
    RepoError, RepoResult, SqliteSubmissionRepository, SqliteTaskRepository, SubmissionRepository,
    TaskRepository,
};
pub use service::submission_service::{
    AttachmentDownload, AttachmentUpload, GradedSubmission, SubmissionReceipt, SubmissionService,
    SubmissionServiceError,
};
pub use service::task_service::{TaskCreated, TaskService, TaskServiceError};
pub use service::ErrorKind;
pub use storage::{
    AttachmentError, AttachmentStore, FsAttachmentStore, StoredAttachment,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
