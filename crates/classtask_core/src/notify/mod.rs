//! Notification delivery.
//!
//! # Responsibility
//! - Define the sink contract mutations hand their notifications to.
//! - Run the best-effort dispatch loop after a mutation commits.
//!
//! # Invariants
//! - `dispatch` is infallible by construction: delivery failures are
//!   counted and logged, never returned as errors. A committed mutation
//!   cannot be rolled back by its notifications.
//!
//! # See also
//! - `crate::model::notification` for request construction.

mod outbox;
mod sink;

pub use outbox::{dispatch, DeliveryReport};
pub use sink::{NotificationSink, SinkError, SqliteNotificationSink};
