//! Notification queue clients.
//!
//! The worker only needs two queue operations: a long-poll receive and a
//! delete by receipt handle. Receiving a message starts its visibility
//! timeout; a message that is not deleted before the timeout expires is
//! handed out again. That redelivery is the pipeline's only retry mechanism.

use async_trait::async_trait;

use crate::error::QueueError;

pub mod memory;
pub mod sqs;

pub use memory::InMemoryQueue;
pub use sqs::SqsQueue;

/// One queue message describing storage upload events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRecord {
    pub message_id: String,
    /// Opaque token needed to delete this delivery of the message.
    pub receipt_handle: String,
    /// Raw JSON storage-event envelope.
    pub body: String,
}

/// Result of one receive call, in receipt order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationBatch {
    pub records: Vec<NotificationRecord>,
}

impl NotificationBatch {
    pub fn new(records: Vec<NotificationRecord>) -> Self {
        Self { records }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn last(&self) -> Option<&NotificationRecord> {
        self.records.last()
    }
}

/// Queue operations used by the pipeline.
#[async_trait]
pub trait NotificationQueue: Send + Sync {
    /// Wait up to `wait_seconds` for up to `max_messages` messages.
    ///
    /// An empty batch means the wait timed out; it is not an error.
    async fn receive(
        &self,
        max_messages: i32,
        wait_seconds: i32,
    ) -> Result<NotificationBatch, QueueError>;

    /// Delete a received message so it is not redelivered.
    ///
    /// Fails if the handle is unknown or its visibility timeout has passed.
    async fn delete(&self, receipt_handle: &str) -> Result<(), QueueError>;
}
