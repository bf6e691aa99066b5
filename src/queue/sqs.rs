//! Amazon SQS implementation of [`NotificationQueue`].

use async_trait::async_trait;
use aws_sdk_sqs::error::DisplayErrorContext;
use aws_sdk_sqs::Client as SqsClient;
use tracing::{debug, warn};

use super::{NotificationBatch, NotificationQueue, NotificationRecord};
use crate::constants::{MAX_MESSAGES_LIMIT, MAX_WAIT_TIME_SECONDS};
use crate::error::QueueError;

/// SQS queue bound to a single queue URL.
#[derive(Debug, Clone)]
pub struct SqsQueue {
    client: SqsClient,
    queue_url: String,
}

impl SqsQueue {
    pub fn new(client: SqsClient, queue_url: impl Into<String>) -> Self {
        Self {
            client,
            queue_url: queue_url.into(),
        }
    }
}

#[async_trait]
impl NotificationQueue for SqsQueue {
    async fn receive(
        &self,
        max_messages: i32,
        wait_seconds: i32,
    ) -> Result<NotificationBatch, QueueError> {
        let output = self
            .client
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(max_messages.clamp(1, MAX_MESSAGES_LIMIT))
            .wait_time_seconds(wait_seconds.clamp(0, MAX_WAIT_TIME_SECONDS))
            .send()
            .await
            .map_err(|e| QueueError::Receive {
                queue_url: self.queue_url.clone(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        let records = output
            .messages
            .unwrap_or_default()
            .into_iter()
            .map(|message| {
                if message.receipt_handle.is_none() || message.body.is_none() {
                    warn!(
                        message_id = ?message.message_id,
                        "Received message without receipt handle or body"
                    );
                }
                NotificationRecord {
                    message_id: message.message_id.unwrap_or_default(),
                    receipt_handle: message.receipt_handle.unwrap_or_default(),
                    body: message.body.unwrap_or_default(),
                }
            })
            .collect::<Vec<_>>();

        debug!(
            queue_url = %self.queue_url,
            received = records.len(),
            "Receive call completed"
        );

        Ok(NotificationBatch::new(records))
    }

    async fn delete(&self, receipt_handle: &str) -> Result<(), QueueError> {
        self.client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await
            .map_err(|e| QueueError::Delete {
                receipt_handle: receipt_handle.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;
        Ok(())
    }
}
