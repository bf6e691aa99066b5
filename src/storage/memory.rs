//! In-memory object store for tests and local runs.

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};

use super::ObjectStore;
use crate::error::{FetchError, StoreError};

/// A stored object and the content type it was written with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Bytes,
    pub content_type: String,
}

#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<(String, String), StoredObject>>,
    /// Buckets whose writes are rejected
    read_only_buckets: RwLock<HashSet<String>>,
    store_calls: RwLock<Vec<(String, String)>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, bucket: &str, key: &str, body: impl Into<Bytes>) {
        self.objects.write().insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                body: body.into(),
                content_type: "application/octet-stream".to_string(),
            },
        );
    }

    pub fn get(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.objects
            .read()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    pub fn remove(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.objects
            .write()
            .remove(&(bucket.to_string(), key.to_string()))
    }

    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }

    /// Reject every subsequent write to `bucket`.
    pub fn deny_writes_to(&self, bucket: &str) {
        self.read_only_buckets.write().insert(bucket.to_string());
    }

    /// `(bucket, key)` of every store call, including rejected ones.
    pub fn store_calls(&self) -> Vec<(String, String)> {
        self.store_calls.read().clone()
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn fetch(&self, bucket: &str, key: &str) -> Result<Bytes, FetchError> {
        self.get(bucket, key)
            .map(|object| object.body)
            .ok_or_else(|| FetchError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }

    async fn store(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<(), StoreError> {
        self.store_calls
            .write()
            .push((bucket.to_string(), key.to_string()));

        if self.read_only_buckets.read().contains(bucket) {
            return Err(StoreError {
                bucket: bucket.to_string(),
                key: key.to_string(),
                message: "AccessDenied".to_string(),
            });
        }

        self.objects.write().insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                body,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }
}
