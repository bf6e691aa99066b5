// Pipeline controller tests
//
// Every test wires the controller to the in-memory queue and object store and
// renders with a block face, so outcomes are exact and need no font file.

use image::{DynamicImage, GenericImageView, ImageFormat, ImageOutputFormat, Rgba, RgbaImage};
use parking_lot::Mutex;
use std::io::{Cursor, Write};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::fmt::MakeWriter;
use watermark_worker::config::{AckMode, OutputConfig};
use watermark_worker::event::StorageEvent;
use watermark_worker::pipeline::{CycleReport, Pipeline, PipelineConfig};
use watermark_worker::queue::{InMemoryQueue, NotificationQueue};
use watermark_worker::shutdown::ShutdownSignal;
use watermark_worker::storage::InMemoryObjectStore;
use watermark_worker::watermark::{BlockFace, RenderOptions, WatermarkRenderer};

const INPUT_BUCKET: &str = "in-bucket";
const OUTPUT_BUCKET: &str = "out-bucket";

fn encoded_image(width: u32, height: u32, format: ImageOutputFormat) -> Vec<u8> {
    let white = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
    let image = match format {
        ImageOutputFormat::Jpeg(_) => {
            DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(white).to_rgb8())
        }
        _ => DynamicImage::ImageRgba8(white),
    };
    let mut cursor = Cursor::new(Vec::new());
    image.write_to(&mut cursor, format).unwrap();
    cursor.into_inner()
}

fn png(width: u32, height: u32) -> Vec<u8> {
    encoded_image(width, height, ImageOutputFormat::Png)
}

fn notification(bucket: &str, keys: &[&str]) -> String {
    let records: Vec<_> = keys
        .iter()
        .map(|key| {
            serde_json::json!({
                "eventName": "ObjectCreated:Put",
                "s3": { "bucket": { "name": bucket }, "object": { "key": key } }
            })
        })
        .collect();
    serde_json::json!({ "Records": records }).to_string()
}

/// Log sink shared between the subscriber and the test.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn capture_logs() -> (CapturedLogs, tracing::subscriber::DefaultGuard) {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (logs, guard)
}

struct Harness {
    queue: Arc<InMemoryQueue>,
    store: Arc<InMemoryObjectStore>,
    pipeline: Pipeline,
}

fn harness_with(max_messages: i32, ack_mode: AckMode, options: RenderOptions) -> Harness {
    let queue = Arc::new(InMemoryQueue::new());
    let store = Arc::new(InMemoryObjectStore::new());
    let renderer = WatermarkRenderer::new(Arc::new(BlockFace::new(4, 8)), options);
    let config = PipelineConfig {
        max_messages,
        wait_time_seconds: 0,
        receive_error_backoff: Duration::from_millis(5),
        ack_mode,
        output: OutputConfig {
            bucket: OUTPUT_BUCKET.to_string(),
            path_prefix: "done".to_string(),
        },
    };
    let pipeline = Pipeline::new(queue.clone(), store.clone(), renderer, config);
    Harness {
        queue,
        store,
        pipeline,
    }
}

fn harness(max_messages: i32, ack_mode: AckMode) -> Harness {
    harness_with(max_messages, ack_mode, RenderOptions::default())
}

// Test: a single PNG notification is watermarked, uploaded and acknowledged
#[tokio::test]
async fn test_single_png_is_watermarked_and_uploaded() {
    let h = harness(1, AckMode::LastInBatch);
    h.store.put(INPUT_BUCKET, "input/photo.png", png(120, 80));
    h.queue.push(notification(INPUT_BUCKET, &["input/photo.png"]));

    let report = h.pipeline.poll_once().await.unwrap();

    assert_eq!(
        report,
        CycleReport {
            received: 1,
            succeeded: 1,
            failed: 0,
            acknowledged: 1,
        }
    );

    let stored = h.store.get(OUTPUT_BUCKET, "done/photo.png").unwrap();
    assert_eq!(stored.content_type, "image/png");
    assert_eq!(image::guess_format(&stored.body).unwrap(), ImageFormat::Png);

    let output = image::load_from_memory(&stored.body).unwrap();
    assert_eq!(output.dimensions(), (120, 80));

    // "photo.png" is 9 glyphs of 4x8, anchored at (84, 72)
    let inked = output.get_pixel(100, 76);
    assert!((126..=128).contains(&inked[0]), "inked pixel was {:?}", inked);
    assert_eq!(output.get_pixel(10, 10), Rgba([255, 255, 255, 255]));
    assert_eq!(output.get_pixel(83, 76), Rgba([255, 255, 255, 255]));

    assert_eq!(h.queue.delete_calls().len(), 1);
    assert_eq!(h.queue.in_flight_len(), 0);
}

// Test: an empty receive does nothing and deletes nothing
#[tokio::test]
async fn test_empty_receive_makes_no_delete_call() {
    let h = harness(1, AckMode::LastInBatch);

    let report = h.pipeline.poll_once().await.unwrap();

    assert_eq!(report, CycleReport::default());
    assert!(h.queue.delete_calls().is_empty());
    assert!(h.store.store_calls().is_empty());
}

// Test: a message without Records is skipped without stopping the cycle
#[tokio::test]
async fn test_message_without_records_is_skipped() {
    let h = harness(1, AckMode::LastInBatch);
    h.queue
        .push(r#"{"Service":"Amazon S3","Event":"s3:TestEvent","Bucket":"in-bucket"}"#);

    let report = h.pipeline.poll_once().await.unwrap();

    assert_eq!(report.failed, 1);
    assert_eq!(report.acknowledged, 1);
    assert!(h.store.store_calls().is_empty());
}

// Test: a missing source object fails only that record; the loop keeps going
#[tokio::test]
async fn test_fetch_failure_does_not_stop_the_loop() {
    let h = harness(1, AckMode::LastInBatch);
    h.queue.push(notification(INPUT_BUCKET, &["input/gone.png"]));
    h.store.put(INPUT_BUCKET, "input/next.png", png(64, 32));
    h.queue.push(notification(INPUT_BUCKET, &["input/next.png"]));

    let first = h.pipeline.poll_once().await.unwrap();
    assert_eq!(first.failed, 1);
    assert!(h.store.store_calls().is_empty());

    let second = h.pipeline.poll_once().await.unwrap();
    assert_eq!(second.succeeded, 1);
    assert!(h.store.get(OUTPUT_BUCKET, "done/next.png").is_some());
}

// Test: a malformed first record does not prevent the second from being
// processed, and only the last handle is deleted
#[tokio::test]
async fn test_batch_with_malformed_first_record() {
    let h = harness(2, AckMode::LastInBatch);
    h.queue.push("not json at all");
    h.store.put(INPUT_BUCKET, "input/second.png", png(50, 50));
    h.queue.push(notification(INPUT_BUCKET, &["input/second.png"]));

    let batch = h.queue.receive(2, 0).await.unwrap();
    let second_handle = batch.records[1].receipt_handle.clone();

    let report = h.pipeline.process_batch(&batch).await;

    assert_eq!(report.received, 2);
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed, 1);
    assert!(h.store.get(OUTPUT_BUCKET, "done/second.png").is_some());
    assert_eq!(h.queue.delete_calls(), vec![second_handle]);
    // The first message was never deleted
    assert_eq!(h.queue.in_flight_len(), 1);
}

// Test: processing the same notification twice yields one identical object
#[tokio::test]
async fn test_reprocessing_overwrites_same_key() {
    let h = harness(1, AckMode::LastInBatch);
    h.store.put(INPUT_BUCKET, "input/photo.png", png(120, 80));
    let body = notification(INPUT_BUCKET, &["input/photo.png"]);

    h.queue.push(body.clone());
    h.pipeline.poll_once().await.unwrap();
    let first = h.store.get(OUTPUT_BUCKET, "done/photo.png").unwrap();

    h.queue.push(body);
    h.pipeline.poll_once().await.unwrap();
    let second = h.store.get(OUTPUT_BUCKET, "done/photo.png").unwrap();

    assert_eq!(first, second);
    assert_eq!(h.store.len(), 2);
    assert_eq!(h.store.store_calls().len(), 2);
}

// Test: keys are unescaped before fetching and naming the output
#[tokio::test]
async fn test_form_encoded_key_is_unescaped() {
    let h = harness(1, AckMode::LastInBatch);
    h.store.put(INPUT_BUCKET, "input/my photo (1).png", png(200, 40));
    h.queue
        .push(notification(INPUT_BUCKET, &["input/my+photo+%281%29.png"]));

    let report = h.pipeline.poll_once().await.unwrap();

    assert_eq!(report.succeeded, 1);
    assert!(h.store.get(OUTPUT_BUCKET, "done/my photo (1).png").is_some());
}

// Test: every event of a multi-event record is attempted
#[tokio::test]
async fn test_all_events_in_a_record_are_attempted() {
    let h = harness(1, AckMode::LastInBatch);
    h.store.put(INPUT_BUCKET, "a/present.png", png(40, 40));
    h.queue
        .push(notification(INPUT_BUCKET, &["a/missing.png", "a/present.png"]));

    let report = h.pipeline.poll_once().await.unwrap();

    assert_eq!(report.failed, 1);
    assert!(h.store.get(OUTPUT_BUCKET, "done/present.png").is_some());
}

// Test: a rejected upload fails the record without panicking
#[tokio::test]
async fn test_store_failure_is_contained() {
    let h = harness(1, AckMode::LastInBatch);
    h.store.deny_writes_to(OUTPUT_BUCKET);
    h.store.put(INPUT_BUCKET, "input/photo.png", png(120, 80));
    h.queue.push(notification(INPUT_BUCKET, &["input/photo.png"]));

    let report = h.pipeline.poll_once().await.unwrap();

    assert_eq!(report.failed, 1);
    assert_eq!(h.store.store_calls().len(), 1);
}

// Test: each failing stage is reported as such
#[tokio::test]
async fn test_failure_stages() {
    let h = harness(1, AckMode::LastInBatch);
    h.store.put(INPUT_BUCKET, "input/notes.png", b"plain text".to_vec());

    let event = |key: &str| StorageEvent {
        source_bucket: INPUT_BUCKET.to_string(),
        source_key: key.to_string(),
    };

    let err = h.pipeline.process_event(&event("input/absent.png")).await.unwrap_err();
    assert_eq!(err.stage(), "fetch");

    let err = h.pipeline.process_event(&event("input/notes.png")).await.unwrap_err();
    assert_eq!(err.stage(), "render");

    let err = h.pipeline.process_event(&event("input/")).await.unwrap_err();
    assert_eq!(err.stage(), "parse");
}

// Test: JPEG sources cannot be written back with an alpha channel
#[tokio::test]
async fn test_jpeg_fails_at_render_stage_by_default() {
    let h = harness(1, AckMode::LastInBatch);
    h.store.put(
        INPUT_BUCKET,
        "input/photo.jpg",
        encoded_image(64, 64, ImageOutputFormat::Jpeg(90)),
    );
    h.queue.push(notification(INPUT_BUCKET, &["input/photo.jpg"]));

    let report = h.pipeline.poll_once().await.unwrap();

    assert_eq!(report.failed, 1);
    assert!(h.store.store_calls().is_empty());
}

// Test: with flattening enabled JPEG sources are written as JPEG
#[tokio::test]
async fn test_jpeg_is_flattened_when_enabled() {
    let options = RenderOptions {
        flatten_opaque_formats: true,
        ..RenderOptions::default()
    };
    let h = harness_with(1, AckMode::LastInBatch, options);
    h.store.put(
        INPUT_BUCKET,
        "input/photo.jpg",
        encoded_image(64, 64, ImageOutputFormat::Jpeg(90)),
    );
    h.queue.push(notification(INPUT_BUCKET, &["input/photo.jpg"]));

    let report = h.pipeline.poll_once().await.unwrap();

    assert_eq!(report.succeeded, 1);
    let stored = h.store.get(OUTPUT_BUCKET, "done/photo.jpg").unwrap();
    assert_eq!(stored.content_type, "image/jpeg");
    assert_eq!(image::guess_format(&stored.body).unwrap(), ImageFormat::Jpeg);
}

// Test: per-record acknowledgement leaves failed records for redelivery
#[tokio::test]
async fn test_per_record_ack_redelivers_failures() {
    let h = harness(2, AckMode::PerRecord);
    let failing = h.queue.push(notification(INPUT_BUCKET, &["input/late.png"]));
    h.store.put(INPUT_BUCKET, "input/ready.png", png(40, 40));
    h.queue.push(notification(INPUT_BUCKET, &["input/ready.png"]));

    let report = h.pipeline.poll_once().await.unwrap();
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.acknowledged, 1);
    assert_eq!(h.queue.in_flight_len(), 1);

    // The source shows up before the visibility timeout lapses
    h.store.put(INPUT_BUCKET, "input/late.png", png(40, 40));
    h.queue.expire_visibility();

    let retry = h.pipeline.poll_once().await.unwrap();
    assert_eq!(retry.succeeded, 1);
    assert_eq!(retry.acknowledged, 1);
    assert_eq!(h.queue.receive_count(&failing), 2);
    assert_eq!(h.queue.in_flight_len(), 0);
    assert!(h.store.get(OUTPUT_BUCKET, "done/late.png").is_some());
}

// Test: a failed delete is logged and does not fail the cycle
#[tokio::test]
async fn test_delete_failure_is_not_fatal() {
    let h = harness(1, AckMode::LastInBatch);
    h.store.put(INPUT_BUCKET, "input/photo.png", png(120, 80));
    h.queue.push(notification(INPUT_BUCKET, &["input/photo.png"]));

    let batch = h.queue.receive(1, 0).await.unwrap();
    h.queue.expire_visibility();

    let report = h.pipeline.process_batch(&batch).await;

    assert_eq!(report.succeeded, 1);
    assert_eq!(report.acknowledged, 0);
    assert_eq!(h.queue.delete_calls().len(), 1);
    assert_eq!(h.queue.pending_len(), 1);
}

// Test: a receive error surfaces from a single cycle
#[tokio::test]
async fn test_receive_error_is_returned_from_poll_once() {
    let h = harness(1, AckMode::LastInBatch);
    h.queue.fail_next_receive("throttled");

    let err = h.pipeline.poll_once().await.unwrap_err();
    assert!(err.to_string().contains("throttled"));
    assert!(h.queue.delete_calls().is_empty());
}

// Test: the loop exits immediately when shutdown was already requested
#[tokio::test]
async fn test_run_returns_when_shutdown_requested() {
    let h = harness(1, AckMode::LastInBatch);
    let shutdown = ShutdownSignal::new();
    shutdown.request();

    h.pipeline.run(&shutdown).await;

    assert_eq!(h.queue.receive_calls(), 0);
}

// Test: the loop survives a receive error and keeps processing
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_run_recovers_from_receive_error() {
    let h = harness(1, AckMode::LastInBatch);
    h.queue.fail_next_receive("connection reset");
    h.store.put(INPUT_BUCKET, "input/photo.png", png(120, 80));
    h.queue.push(notification(INPUT_BUCKET, &["input/photo.png"]));

    let store = h.store.clone();
    let queue = h.queue.clone();
    let pipeline = Arc::new(h.pipeline);
    let shutdown = ShutdownSignal::new();

    let worker = {
        let pipeline = pipeline.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move { pipeline.run(&shutdown).await })
    };

    let uploaded = tokio::time::timeout(Duration::from_secs(5), async {
        while store.get(OUTPUT_BUCKET, "done/photo.png").is_none() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;

    shutdown.request();
    tokio::time::timeout(Duration::from_secs(5), worker)
        .await
        .expect("poll loop did not stop")
        .unwrap();

    assert!(uploaded.is_ok(), "image was never uploaded");
    assert!(queue.receive_calls() >= 2);
    assert_eq!(queue.delete_calls().len(), 1);
}

// Test: an idle loop pauses on every empty poll, so timers on the same
// runtime keep firing and shutdown is honored promptly
#[tokio::test]
async fn test_idle_run_does_not_starve_the_runtime() {
    let h = harness(1, AckMode::LastInBatch);
    let queue = h.queue.clone();
    let pipeline = Arc::new(h.pipeline);
    let shutdown = ShutdownSignal::new();

    let worker = {
        let pipeline = pipeline.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move { pipeline.run(&shutdown).await })
    };

    let slept = tokio::time::timeout(
        Duration::from_secs(3),
        tokio::time::sleep(Duration::from_millis(20)),
    )
    .await;

    shutdown.request();
    tokio::time::timeout(Duration::from_secs(5), worker)
        .await
        .expect("poll loop did not stop")
        .unwrap();

    assert!(slept.is_ok(), "timer starved by the poll loop");
    assert!(queue.receive_calls() >= 1);
    assert!(
        queue.receive_calls() < 1_000,
        "idle loop polled {} times",
        queue.receive_calls()
    );
}

// Test: an empty cycle is logged at info level
#[tokio::test]
async fn test_empty_receive_is_logged() {
    let (logs, _guard) = capture_logs();
    let h = harness(1, AckMode::LastInBatch);

    h.pipeline.poll_once().await.unwrap();

    let output = logs.contents();
    assert!(output.contains("INFO"), "logs: {}", output);
    assert!(output.contains("No messages to process"), "logs: {}", output);
}

// Test: a failed event is logged with its key and stage
#[tokio::test]
async fn test_failure_is_logged_with_key_and_stage() {
    let (logs, _guard) = capture_logs();
    let h = harness(1, AckMode::LastInBatch);
    h.queue.push(notification(INPUT_BUCKET, &["input/gone.png"]));

    h.pipeline.poll_once().await.unwrap();

    let output = logs.contents();
    assert!(output.contains("ERROR"), "logs: {}", output);
    assert!(output.contains("key=input/gone.png"), "logs: {}", output);
    assert!(output.contains("stage=\"fetch\""), "logs: {}", output);
}
