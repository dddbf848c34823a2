//! Notification sink contract and SQLite implementation.

use std::error::Error;
use std::fmt::{Display, Formatter};

use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DbError;
use crate::model::notification::NotificationRequest;
use crate::model::now_epoch_ms;

/// Delivery failure for a single notification.
#[derive(Debug)]
pub enum SinkError {
    Db(DbError),
    /// Transport-level failure outside the database.
    Unavailable(String),
}

impl Display for SinkError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Unavailable(message) => write!(f, "notification sink unavailable: {message}"),
        }
    }
}

impl Error for SinkError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Unavailable(_) => None,
        }
    }
}

impl From<rusqlite::Error> for SinkError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Target for outbound notifications.
///
/// Implementations deliver one request at a time and report failure per
/// request; the dispatch loop decides what failures mean.
pub trait NotificationSink {
    fn deliver(&self, request: &NotificationRequest) -> Result<(), SinkError>;
}

/// Sink that appends to the `notifications` inbox table.
pub struct SqliteNotificationSink<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNotificationSink<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl NotificationSink for SqliteNotificationSink<'_> {
    fn deliver(&self, request: &NotificationRequest) -> Result<(), SinkError> {
        self.conn.execute(
            "INSERT INTO notifications (id, user_id, title, message, kind, is_read, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6);",
            params![
                Uuid::new_v4().to_string(),
                request.recipient.to_string(),
                request.title.as_str(),
                request.message.as_str(),
                request.kind.as_str(),
                now_epoch_ms(),
            ],
        )?;
        Ok(())
    }
}
