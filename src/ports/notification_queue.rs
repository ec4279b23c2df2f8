//! Notification queue port.
//!
//! Conference creation enqueues a confirmation task for the organizer. The
//! enqueue is handed to the store's transaction handle, which dispatches it
//! to this port only after a successful commit, so a rolled-back creation
//! never notifies anyone.

use async_trait::async_trait;
use thiserror::Error;

/// A queued piece of outbound mail/notification work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationTask {
    /// Email address of the recipient.
    pub recipient: String,

    /// Human-readable payload (e.g. a conference summary).
    pub payload: String,
}

impl NotificationTask {
    pub fn new(recipient: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            payload: payload.into(),
        }
    }
}

/// Failures surfaced by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotificationError {
    #[error("notification queue unavailable: {0}")]
    Unavailable(String),
}

/// Task dispatcher contract. Delivery mechanics are out of scope; the
/// contract is accept-or-fail on enqueue.
#[async_trait]
pub trait NotificationQueue: Send + Sync {
    async fn enqueue(&self, task: NotificationTask) -> Result<(), NotificationError>;
}
