//! Object storage clients.
//!
//! `fetch` and `store` move whole objects as byte buffers; images handled by
//! the worker are small enough that streaming brings nothing.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{FetchError, StoreError};

pub mod memory;
pub mod s3;

pub use memory::InMemoryObjectStore;
pub use s3::S3ObjectStore;

/// Read and write whole objects by bucket and key.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Read an object. Missing objects are `FetchError::NotFound`.
    async fn fetch(&self, bucket: &str, key: &str) -> Result<Bytes, FetchError>;

    /// Write an object, replacing any existing one with the same key.
    async fn store(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<(), StoreError>;
}
