//! Persistence contracts and SQLite implementations for coursework data.
//!
//! # Responsibility
//! - Provide stable CRUD and query APIs over `tasks` and `submissions`.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Repositories are built with `try_new` and refuse connections whose
//!   schema does not match this build.
//! - Write paths must call the model's `validate()` before SQL mutations.
//! - Read paths must reject invalid persisted state instead of masking it.
//! - List orderings are total: a timestamp ordering always ends with an id
//!   tie-break so results are reproducible.

use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

use rusqlite::Connection;

use crate::db::{migrations, DbError};
use crate::model::submission::{SubmissionId, SubmissionValidationError};
use crate::model::task::{TaskId, TaskValidationError};

pub mod submission_repo;
pub mod task_repo;

pub use submission_repo::{SqliteSubmissionRepository, SubmissionRepository};
pub use task_repo::{SqliteTaskRepository, TaskRepository};

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by task and submission persistence.
#[derive(Debug)]
pub enum RepoError {
    TaskValidation(TaskValidationError),
    SubmissionValidation(SubmissionValidationError),
    Db(DbError),
    TaskNotFound(TaskId),
    SubmissionNotFound(SubmissionId),
    InvalidData(String),
    /// Connection schema version does not match this build.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// A table this repository depends on is absent.
    MissingRequiredTable(&'static str),
    /// A column this repository depends on is absent.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TaskValidation(err) => write!(f, "{err}"),
            Self::SubmissionValidation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::SubmissionNotFound(id) => write!(f, "submission not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted coursework data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection not migrated: schema version {actual_version}, expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "required table `{table}` is missing")
            }
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{column}` is missing from table `{table}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::TaskValidation(err) => Some(err),
            Self::SubmissionValidation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TaskValidationError> for RepoError {
    fn from(value: TaskValidationError) -> Self {
        Self::TaskValidation(value)
    }
}

impl From<SubmissionValidationError> for RepoError {
    fn from(value: SubmissionValidationError) -> Self {
        Self::SubmissionValidation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Checks that `conn` carries the schema this build expects.
///
/// Runs at repository construction so later queries can assume their
/// table and columns exist. Checks the version first, then the table,
/// then each required column in declaration order.
pub(crate) fn verify_connection(
    conn: &Connection,
    table: &'static str,
    required_columns: &[&'static str],
) -> RepoResult<()> {
    let expected_version = migrations::latest_version();
    let actual_version =
        conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let table_count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1;",
        [table],
        |row| row.get(0),
    )?;
    if table_count == 0 {
        return Err(RepoError::MissingRequiredTable(table));
    }

    // PRAGMA arguments cannot be bound; `table` only ever comes from the
    // repository's own constant.
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    let mut present: HashSet<String> = HashSet::new();
    while let Some(row) = rows.next()? {
        present.insert(row.get("name")?);
    }
    for &column in required_columns {
        if !present.contains(column) {
            return Err(RepoError::MissingRequiredColumn { table, column });
        }
    }

    Ok(())
}
