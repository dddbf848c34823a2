//! User identity model.
//!
//! # Responsibility
//! - Define the account record and the closed set of platform roles.
//!
//! # Invariants
//! - `id` is stable and never reused for another user.
//! - `role` is fixed at account creation; there is no role-change flow here.
//!
//! # See also
//! - `crate::access` for the role-based permission predicates.
//! - `crate::directory` for lookup and enrollment queries.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a user account.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type UserId = Uuid;

/// Platform role attached to every account.
///
/// Permissions are derived from the role alone plus ownership facts; there
/// is no per-user permission storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Platform administration. Does not inherit teacher powers.
    Admin,
    /// Owns courses, creates tasks, grades submissions.
    Teacher,
    /// Enrolls in courses and submits work.
    Student,
}

/// Account record as resolved from the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable global ID used for ownership checks and notification routing.
    pub id: UserId,
    /// Login identity; unique across the directory.
    pub email: String,
    /// Display name used in notification texts.
    pub full_name: String,
    /// Fixed platform role.
    pub role: Role,
    /// Deactivated accounts stay resolvable but are flagged here.
    pub active: bool,
}

impl User {
    /// Creates an active user with a generated stable ID.
    pub fn new(email: impl Into<String>, full_name: impl Into<String>, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            full_name: full_name.into(),
            role,
            active: true,
        }
    }
}
