//! Permission predicates for coursework operations.
//!
//! # Responsibility
//! - Answer every "may this user do that" question in one place, as pure
//!   functions over already-resolved facts.
//!
//! # Invariants
//! - Predicates take ids and booleans, never repositories; callers resolve
//!   ownership and enrollment facts first, then ask.
//! - No predicate performs I/O or returns an error. Denial reasons are
//!   attached by the calling service.
//! - `Role::Admin` holds no coursework rights here; administration is an
//!   upstream concern.
//!
//! # See also
//! - `crate::service::task_service` and `crate::service::submission_service`
//!   for the call sites.

use crate::model::user::{Role, User, UserId};

/// Whether `actor` may create tasks at all.
///
/// Course ownership is checked separately by `can_manage_task`.
pub fn can_create_task(actor: &User) -> bool {
    actor.role == Role::Teacher
}

/// Whether `actor` may create, edit or delete tasks in a course owned by
/// `course_owner`.
pub fn can_manage_task(actor: &User, course_owner: UserId) -> bool {
    actor.role == Role::Teacher && actor.id == course_owner
}

/// Whether `actor` may submit work, given their enrollment in the
/// task's course.
pub fn can_submit(actor: &User, enrolled: bool) -> bool {
    actor.role == Role::Student && enrolled
}

/// Whether `actor` may grade submissions in a course owned by
/// `course_owner`.
///
/// Grading rights coincide with task management rights.
pub fn can_grade(actor: &User, course_owner: UserId) -> bool {
    can_manage_task(actor, course_owner)
}

/// Whether `actor` may read a submission authored by `submission_student`
/// in a course owned by `course_owner`.
///
/// The author always may; otherwise only someone who could grade it.
pub fn can_view_submission(actor: &User, submission_student: UserId, course_owner: UserId) -> bool {
    actor.id == submission_student || can_grade(actor, course_owner)
}
