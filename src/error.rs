// Error types module
//
// Each collaborator of the pipeline reports failures through its own enum so
// the controller can tell a malformed payload from a storage outage. All of
// them funnel into `ProcessError`, the record-level failure type.

use thiserror::Error;

use crate::watermark::RenderError;

/// Failures talking to the notification queue.
#[derive(Debug, Error)]
pub enum QueueError {
    /// The receive call itself failed (network, credentials, missing queue).
    #[error("Failed to receive messages from {queue_url}: {message}")]
    Receive { queue_url: String, message: String },

    /// The delete call failed, usually because the receipt handle expired.
    #[error("Failed to delete message with receipt handle {receipt_handle}: {message}")]
    Delete {
        receipt_handle: String,
        message: String,
    },
}

/// Failures reading an object from storage.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Object s3://{bucket}/{key} does not exist")]
    NotFound { bucket: String, key: String },

    #[error("Failed to fetch s3://{bucket}/{key}: {message}")]
    Request {
        bucket: String,
        key: String,
        message: String,
    },

    #[error("Failed to read body of s3://{bucket}/{key}: {message}")]
    Body {
        bucket: String,
        key: String,
        message: String,
    },
}

/// Failure writing an object to storage.
#[derive(Debug, Error)]
#[error("Failed to store s3://{bucket}/{key}: {message}")]
pub struct StoreError {
    pub bucket: String,
    pub key: String,
    pub message: String,
}

/// A queue message whose body does not describe a usable storage event.
#[derive(Debug, Error)]
pub enum PayloadError {
    /// Body is not JSON, or lacks `Records` / `s3` / bucket / key fields.
    #[error("Malformed notification body: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Object key '{key}' is not valid percent-encoded UTF-8")]
    InvalidKeyEncoding { key: String },

    /// Keys such as `input/` name a folder placeholder, not a file.
    #[error("Object key '{key}' has no file name")]
    EmptyFileName { key: String },
}

/// Everything that can abandon a single record.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error(transparent)]
    Payload(#[from] PayloadError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Failed to watermark s3://{bucket}/{key}: {source}")]
    Render {
        bucket: String,
        key: String,
        #[source]
        source: RenderError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ProcessError {
    /// Short stage label used as a structured log field.
    pub fn stage(&self) -> &'static str {
        match self {
            ProcessError::Payload(_) => "parse",
            ProcessError::Fetch(_) => "fetch",
            ProcessError::Render { .. } => "render",
            ProcessError::Store(_) => "store",
        }
    }
}
