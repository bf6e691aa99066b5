//! In-memory queue with SQS-like delivery semantics.
//!
//! Each delivery gets a fresh receipt handle. Delivered messages stay hidden
//! until they are deleted or [`InMemoryQueue::expire_visibility`] simulates
//! the visibility timeout running out, which makes them receivable again and
//! invalidates their old handles. Receive on an empty queue waits like a long
//! poll: `wait_seconds`, or a short pause when that is zero.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use uuid::Uuid;

use super::{NotificationBatch, NotificationQueue, NotificationRecord};
use crate::constants::MAX_WAIT_TIME_SECONDS;
use crate::error::QueueError;

/// Pause before an empty receive with `wait_seconds == 0` returns.
const EMPTY_POLL_PAUSE: Duration = Duration::from_millis(1);

#[derive(Debug, Clone)]
struct StoredMessage {
    message_id: String,
    body: String,
}

#[derive(Debug, Default)]
struct QueueState {
    pending: VecDeque<StoredMessage>,
    in_flight: Vec<(String, StoredMessage)>,
    delete_calls: Vec<String>,
    receive_calls: usize,
    receive_failures: VecDeque<String>,
    receive_counts: HashMap<String, u32>,
}

#[derive(Debug, Default)]
pub struct InMemoryQueue {
    state: Mutex<QueueState>,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a message body; returns its message id.
    pub fn push(&self, body: impl Into<String>) -> String {
        let message_id = Uuid::new_v4().to_string();
        self.state.lock().pending.push_back(StoredMessage {
            message_id: message_id.clone(),
            body: body.into(),
        });
        message_id
    }

    /// Make the next receive call fail with `message`.
    pub fn fail_next_receive(&self, message: impl Into<String>) {
        self.state.lock().receive_failures.push_back(message.into());
    }

    /// Return every in-flight message to the queue, as if its visibility
    /// timeout expired. Their current receipt handles stop working.
    pub fn expire_visibility(&self) {
        let mut state = self.state.lock();
        let expired: Vec<_> = state.in_flight.drain(..).map(|(_, m)| m).collect();
        for message in expired.into_iter().rev() {
            state.pending.push_front(message);
        }
    }

    /// Messages waiting to be received.
    pub fn pending_len(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Messages received but neither deleted nor expired.
    pub fn in_flight_len(&self) -> usize {
        self.state.lock().in_flight.len()
    }

    /// Every receipt handle passed to `delete`, successful or not, in order.
    pub fn delete_calls(&self) -> Vec<String> {
        self.state.lock().delete_calls.clone()
    }

    pub fn receive_calls(&self) -> usize {
        self.state.lock().receive_calls
    }

    /// How many times the message has been delivered.
    pub fn receive_count(&self, message_id: &str) -> u32 {
        self.state
            .lock()
            .receive_counts
            .get(message_id)
            .copied()
            .unwrap_or(0)
    }

    /// Hand out up to `max_messages` pending messages under fresh handles.
    fn take_batch(&self, max_messages: i32) -> Result<NotificationBatch, QueueError> {
        let mut state = self.state.lock();
        state.receive_calls += 1;

        if let Some(message) = state.receive_failures.pop_front() {
            return Err(QueueError::Receive {
                queue_url: "memory://".to_string(),
                message,
            });
        }

        let take = usize::try_from(max_messages.max(1)).unwrap_or(1);
        let mut records = Vec::new();

        while records.len() < take {
            let Some(message) = state.pending.pop_front() else {
                break;
            };
            *state
                .receive_counts
                .entry(message.message_id.clone())
                .or_insert(0) += 1;

            let receipt_handle = Uuid::new_v4().to_string();
            records.push(NotificationRecord {
                message_id: message.message_id.clone(),
                receipt_handle: receipt_handle.clone(),
                body: message.body.clone(),
            });
            state.in_flight.push((receipt_handle, message));
        }

        Ok(NotificationBatch::new(records))
    }
}

fn empty_poll_wait(wait_seconds: i32) -> Duration {
    match u64::try_from(wait_seconds.min(MAX_WAIT_TIME_SECONDS)) {
        Ok(seconds) if seconds > 0 => Duration::from_secs(seconds),
        _ => EMPTY_POLL_PAUSE,
    }
}

#[async_trait]
impl NotificationQueue for InMemoryQueue {
    async fn receive(
        &self,
        max_messages: i32,
        wait_seconds: i32,
    ) -> Result<NotificationBatch, QueueError> {
        let batch = self.take_batch(max_messages)?;
        if batch.is_empty() {
            tokio::time::sleep(empty_poll_wait(wait_seconds)).await;
        }
        Ok(batch)
    }

    async fn delete(&self, receipt_handle: &str) -> Result<(), QueueError> {
        let mut state = self.state.lock();
        state.delete_calls.push(receipt_handle.to_string());

        match state
            .in_flight
            .iter()
            .position(|(handle, _)| handle == receipt_handle)
        {
            Some(index) => {
                state.in_flight.remove(index);
                Ok(())
            }
            None => Err(QueueError::Delete {
                receipt_handle: receipt_handle.to_string(),
                message: "ReceiptHandleIsInvalid".to_string(),
            }),
        }
    }
}
