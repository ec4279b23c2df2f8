//! In-Memory Notification Queue Adapter
//!
//! Records every accepted task so tests can assert on what would have been
//! dispatched.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::ports::{NotificationError, NotificationQueue, NotificationTask};

/// Recording notification queue.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotificationQueue {
    tasks: Arc<RwLock<Vec<NotificationTask>>>,
}

impl InMemoryNotificationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every task accepted so far, in enqueue order.
    pub async fn sent(&self) -> Vec<NotificationTask> {
        self.tasks.read().await.clone()
    }
}

#[async_trait]
impl NotificationQueue for InMemoryNotificationQueue {
    async fn enqueue(&self, task: NotificationTask) -> Result<(), NotificationError> {
        info!(recipient = %task.recipient, "notification enqueued");
        self.tasks.write().await.push(task);
        Ok(())
    }
}
