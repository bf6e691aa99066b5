//! Storage event notifications.
//!
//! S3 publishes one JSON envelope per queue message:
//!
//! ```json
//! { "Records": [ { "s3": { "bucket": { "name": "in-bucket" },
//!                          "object": { "key": "input/my+photo.png" } } } ] }
//! ```
//!
//! Object keys arrive form-encoded (`+` for space, `%XX` escapes) and are
//! decoded here. Fields we do not use are ignored.

use serde::Deserialize;

use crate::error::PayloadError;

#[derive(Debug, Deserialize)]
struct S3EventEnvelope {
    #[serde(rename = "Records")]
    records: Vec<S3EventRecord>,
}

#[derive(Debug, Deserialize)]
struct S3EventRecord {
    s3: S3Entity,
}

#[derive(Debug, Deserialize)]
struct S3Entity {
    bucket: S3Bucket,
    object: S3Object,
}

#[derive(Debug, Deserialize)]
struct S3Bucket {
    name: String,
}

#[derive(Debug, Deserialize)]
struct S3Object {
    key: String,
}

/// One uploaded object, with its key already unescaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub source_bucket: String,
    pub source_key: String,
}

/// Parse a notification body into its storage events, in order.
///
/// A body without `Records` (for example the `s3:TestEvent` S3 sends when a
/// notification is first configured) is malformed.
pub fn parse_storage_events(body: &str) -> Result<Vec<StorageEvent>, PayloadError> {
    let envelope: S3EventEnvelope = serde_json::from_str(body)?;

    envelope
        .records
        .into_iter()
        .map(|record| {
            Ok(StorageEvent {
                source_bucket: record.s3.bucket.name,
                source_key: unescape_key(&record.s3.object.key)?,
            })
        })
        .collect()
}

/// Decode a form-encoded object key.
///
/// A literal `+` in the original key is indistinguishable from an encoded
/// space (S3 sends `%2B` for it), so `+` always decodes to a space.
pub fn unescape_key(raw: &str) -> Result<String, PayloadError> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|decoded| decoded.into_owned())
        .map_err(|_| PayloadError::InvalidKeyEncoding {
            key: raw.to_string(),
        })
}
