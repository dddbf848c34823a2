//! Directory read contract.

use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::db::DbError;
use crate::model::course::CourseId;
use crate::model::user::{User, UserId};

pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Error for directory lookups.
#[derive(Debug)]
pub enum DirectoryError {
    UserNotFound(UserId),
    CourseNotFound(CourseId),
    Db(DbError),
    InvalidData(String),
}

impl Display for DirectoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::CourseNotFound(id) => write!(f, "course not found: {id}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => {
                write!(f, "invalid persisted directory data: {message}")
            }
        }
    }
}

impl Error for DirectoryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for DirectoryError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for DirectoryError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Read-only identity and enrollment facts.
///
/// Every method resolves ids to facts; none of them mutate. Services call
/// these before evaluating `crate::access` predicates.
pub trait DirectoryProvider {
    /// Resolves an account by id.
    fn resolve_user(&self, id: UserId) -> DirectoryResult<User>;

    /// Returns the owning teacher of a course.
    fn course_owner(&self, course_id: CourseId) -> DirectoryResult<UserId>;

    /// Whether `student_id` is enrolled in `course_id`.
    ///
    /// An unknown course or student simply yields `false`.
    fn is_enrolled(&self, course_id: CourseId, student_id: UserId) -> DirectoryResult<bool>;

    /// Ids of every student currently enrolled in `course_id`.
    fn enrolled_students(&self, course_id: CourseId) -> DirectoryResult<Vec<UserId>>;

    /// Ids of every course `student_id` is currently enrolled in.
    fn enrolled_courses(&self, student_id: UserId) -> DirectoryResult<Vec<CourseId>>;
}
