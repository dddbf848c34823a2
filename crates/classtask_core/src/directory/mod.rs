//! Identity and enrollment facts consumed by the coursework services.
//!
//! # Responsibility
//! - Define the read contract for users, course ownership and enrollment.
//! - Provide the SQLite adapter plus the seed writes tests and embedders
//!   use to populate it.
//!
//! # Invariants
//! - Services depend only on the `DirectoryProvider` trait; account and
//!   course administration is an upstream concern.
//!
//! # See also
//! - `crate::access` for the predicates fed by these facts.

mod provider;
mod sqlite;

pub use provider::{DirectoryError, DirectoryProvider, DirectoryResult};
pub use sqlite::SqliteDirectory;
