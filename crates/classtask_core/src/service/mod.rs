//! Use-case services for task and submission lifecycles.
//!
//! # Responsibility
//! - Provide the operation entry points embedders call.
//! - Resolve authorization facts, run `crate::access` predicates, then
//!   delegate to repositories, storage and notification dispatch.
//!
//! # Invariants
//! - Services never bypass repository validation contracts.
//! - Authorization is checked before any mutation or byte write.
//! - Notification dispatch runs strictly after the mutation committed and
//!   cannot fail the operation.

pub mod submission_service;
pub mod task_service;

pub use submission_service::SubmissionService;
pub use task_service::TaskService;

/// Coarse classification of service errors.
///
/// Embedding surfaces map these to their own status codes; the precise
/// variant stays available on the concrete error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A referenced entity does not exist.
    NotFound,
    /// The actor is not allowed to perform the operation.
    Forbidden,
    /// Input violates a field constraint.
    Validation,
    /// Attachment byte storage failed.
    Storage,
    /// Persistence, directory or consistency failure inside the core.
    Internal,
}

impl ErrorKind {
    /// Stable lowercase name for log lines and transport mapping.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Forbidden => "forbidden",
            Self::Validation => "validation",
            Self::Storage => "storage",
            Self::Internal => "internal",
        }
    }
}
