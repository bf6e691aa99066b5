// Pipeline controller
//
// One cycle: receive a batch, then for every record parse the storage events,
// fetch each image, watermark it and upload the result, then acknowledge.
// Failures are contained per record; nothing a record does can stop the loop.
// Records are handled strictly one after another in receipt order.

use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::{AckMode, Config, OutputConfig};
use crate::error::{ProcessError, QueueError};
use crate::event::{parse_storage_events, StorageEvent};
use crate::queue::{NotificationBatch, NotificationQueue, NotificationRecord};
use crate::shutdown::ShutdownSignal;
use crate::storage::ObjectStore;
use crate::watermark::{content_type, RenderedImage, WatermarkRenderer};
use crate::work::WorkItem;

/// Settings the controller needs, taken from [`Config`] at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub max_messages: i32,
    pub wait_time_seconds: i32,
    pub receive_error_backoff: Duration,
    pub ack_mode: AckMode,
    pub output: OutputConfig,
}

impl PipelineConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_messages: config.queue.max_messages,
            wait_time_seconds: config.queue.wait_time_seconds,
            receive_error_backoff: Duration::from_millis(config.queue.receive_error_backoff_ms),
            ack_mode: config.queue.acknowledgement,
            output: config.output.clone(),
        }
    }
}

/// What happened during one poll cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Records in the batch
    pub received: usize,
    /// Records whose every storage event was watermarked and uploaded
    pub succeeded: usize,
    /// Records with a malformed payload or at least one failed event
    pub failed: usize,
    /// Successful delete calls
    pub acknowledged: usize,
}

/// Owns the poll, process, acknowledge loop.
pub struct Pipeline {
    queue: Arc<dyn NotificationQueue>,
    store: Arc<dyn ObjectStore>,
    renderer: WatermarkRenderer,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(
        queue: Arc<dyn NotificationQueue>,
        store: Arc<dyn ObjectStore>,
        renderer: WatermarkRenderer,
        config: PipelineConfig,
    ) -> Self {
        Self {
            queue,
            store,
            renderer,
            config,
        }
    }

    /// Poll until `shutdown` is requested.
    ///
    /// The flag is checked between cycles only, so shutdown waits for the
    /// current long poll and batch to finish.
    pub async fn run(&self, shutdown: &ShutdownSignal) {
        info!(
            max_messages = self.config.max_messages,
            wait_time_seconds = self.config.wait_time_seconds,
            ack_mode = ?self.config.ack_mode,
            output_bucket = %self.config.output.bucket,
            output_prefix = %self.config.output.path_prefix,
            "Starting poll loop"
        );

        while !shutdown.is_requested() {
            if let Err(e) = self.poll_once().await {
                error!(
                    error = %e,
                    backoff_ms = self.config.receive_error_backoff.as_millis() as u64,
                    "Failed to receive messages"
                );
                tokio::time::sleep(self.config.receive_error_backoff).await;
            }
            tokio::task::yield_now().await;
        }

        info!("Shutdown requested, poll loop stopped");
    }

    /// Run a single cycle. Only a failed receive call is reported as an error.
    pub async fn poll_once(&self) -> Result<CycleReport, QueueError> {
        let batch = self
            .queue
            .receive(self.config.max_messages, self.config.wait_time_seconds)
            .await?;

        if batch.is_empty() {
            info!("No messages to process");
            return Ok(CycleReport::default());
        }

        Ok(self.process_batch(&batch).await)
    }

    /// Process every record, then acknowledge according to the ack mode.
    pub async fn process_batch(&self, batch: &NotificationBatch) -> CycleReport {
        let mut report = CycleReport {
            received: batch.len(),
            ..CycleReport::default()
        };

        for record in &batch.records {
            let succeeded = self.process_record(record).await;
            if succeeded {
                report.succeeded += 1;
            } else {
                report.failed += 1;
            }

            if succeeded
                && self.config.ack_mode == AckMode::PerRecord
                && self.acknowledge(record).await
            {
                report.acknowledged += 1;
            }
        }

        if self.config.ack_mode == AckMode::LastInBatch {
            // One delete per batch, with the last handle, whatever the outcomes.
            if let Some(last) = batch.last() {
                if self.acknowledge(last).await {
                    report.acknowledged += 1;
                }
            }
        }

        debug!(
            received = report.received,
            succeeded = report.succeeded,
            failed = report.failed,
            acknowledged = report.acknowledged,
            "Batch processed"
        );

        report
    }

    /// Handle one record. Returns whether all of its events succeeded.
    async fn process_record(&self, record: &NotificationRecord) -> bool {
        info!(message_id = %record.message_id, "Processing message");

        let events = match parse_storage_events(&record.body) {
            Ok(events) => events,
            Err(e) => {
                error!(
                    message_id = %record.message_id,
                    stage = "parse",
                    error = %e,
                    "Skipping malformed notification"
                );
                return false;
            }
        };

        if events.is_empty() {
            warn!(message_id = %record.message_id, "Notification carries no storage events");
        }

        let mut all_succeeded = true;
        for event in &events {
            if let Err(e) = self.process_event(event).await {
                all_succeeded = false;
                error!(
                    message_id = %record.message_id,
                    bucket = %event.source_bucket,
                    key = %event.source_key,
                    stage = e.stage(),
                    error = %e,
                    "Watermarking process failed"
                );
            }
        }

        all_succeeded
    }

    /// Resolve an event into a work item and watermark it.
    pub async fn process_event(&self, event: &StorageEvent) -> Result<WorkItem, ProcessError> {
        let item = WorkItem::from_event(event, &self.config.output)?;
        self.watermark(&item).await?;
        Ok(item)
    }

    /// Fetch, render and store one work item. Returns the output dimensions.
    pub async fn watermark(&self, item: &WorkItem) -> Result<(u32, u32), ProcessError> {
        let input = self
            .store
            .fetch(&item.input_bucket, &item.input_key)
            .await?;

        let rendered = self
            .renderer
            .render(&input, &item.watermark_text)
            .map_err(|source| ProcessError::Render {
                bucket: item.input_bucket.clone(),
                key: item.input_key.clone(),
                source,
            })?;

        let RenderedImage {
            bytes,
            format,
            width,
            height,
            ..
        } = rendered;

        self.store
            .store(
                &item.output_bucket,
                &item.output_key,
                Bytes::from(bytes),
                content_type(format),
            )
            .await?;

        info!(
            input_bucket = %item.input_bucket,
            input_key = %item.input_key,
            output_bucket = %item.output_bucket,
            output_key = %item.output_key,
            width,
            height,
            "Successfully watermarked and uploaded"
        );

        Ok((width, height))
    }

    /// Delete a record's message. Failures are logged, never propagated.
    async fn acknowledge(&self, record: &NotificationRecord) -> bool {
        match self.queue.delete(&record.receipt_handle).await {
            Ok(()) => {
                debug!(message_id = %record.message_id, "Message deleted");
                true
            }
            Err(e) => {
                warn!(
                    message_id = %record.message_id,
                    error = %e,
                    "Failed to delete message; it will be redelivered"
                );
                false
            }
        }
    }
}
