//! Work items: a storage event resolved against the output settings.

use crate::config::OutputConfig;
use crate::error::PayloadError;
use crate::event::StorageEvent;

/// Everything needed to watermark one object and upload the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub input_bucket: String,
    pub input_key: String,
    pub output_bucket: String,
    pub output_key: String,
    pub watermark_text: String,
}

impl WorkItem {
    /// Resolve an event into a work item.
    ///
    /// The output key depends only on the input key and the configured
    /// prefix, so reprocessing the same upload overwrites the same object.
    pub fn from_event(event: &StorageEvent, output: &OutputConfig) -> Result<Self, PayloadError> {
        let file_name = file_name(&event.source_key);
        if file_name.is_empty() {
            return Err(PayloadError::EmptyFileName {
                key: event.source_key.clone(),
            });
        }

        Ok(Self {
            input_bucket: event.source_bucket.clone(),
            input_key: event.source_key.clone(),
            output_bucket: output.bucket.clone(),
            output_key: output_key(&output.path_prefix, file_name),
            watermark_text: file_name.to_string(),
        })
    }
}

/// Last path segment of an object key (`input/a/photo.png` -> `photo.png`).
pub fn file_name(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

/// `<prefix>/<file_name>`, tolerating a trailing slash on the prefix.
pub fn output_key(prefix: &str, file_name: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        file_name.to_string()
    } else {
        format!("{}/{}", prefix, file_name)
    }
}
