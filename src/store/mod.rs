// Copyright (c) 2025 - Cowboy AI, Inc.
//! Document Store
//!
//! System events are persisted as documents in a time-partitioned search
//! index. This module splits that concern in two:
//!
//! ```text
//! DocumentStoreClient          (partition choice, fallback, instrumentation)
//!        │
//!        ▼
//! dyn SearchBackend            (raw index/update/get against one partition)
//!   ├── ElasticsearchBackend   (REST over reqwest)
//!   └── InMemoryBackend        (tests, dry runs)
//! ```
//!
//! # Validity
//!
//! A backend that answers but refuses a write reports `is_valid == false` on
//! the response. Callers must check the flag before treating the write as
//! committed. `Err` is reserved for transport, decoding and cancellation
//! failures.
//!
//! # Partition fallback
//!
//! An event started yesterday lives in yesterday's partition. Updates made
//! with [`UpdateOptions::spanning_partitions`] therefore retry once against
//! the previous partition when the current one fails, and reads always look
//! in the current partition first, then the previous one.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::errors::StoreResult;
use crate::index::IndexNameResolver;
use crate::model::{PartialSystemEventDocument, SystemEventDocument};
use crate::monitoring::{ClientMonitor, Outcome};

pub mod elasticsearch;
pub mod memory;

pub use elasticsearch::{ElasticsearchBackend, ElasticsearchConfig};
pub use memory::InMemoryBackend;

/// Client label used for instrumentation
pub const CLIENT_NAME: &str = "ElasticsearchClient";

const INDEX_METHOD: &str = "IndexAsync";
const UPDATE_METHOD: &str = "UpdateAsync";
const GET_METHOD: &str = "GetAsync";

/// Default optimistic-concurrency retries for partial updates
pub const DEFAULT_RETRY_ON_CONFLICT: u32 = 3;

/// Result of writing a new document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexResponse {
    /// Store-assigned id; empty when the write was refused
    pub id: String,

    /// Partition the write targeted
    pub index: String,

    pub is_valid: bool,

    /// Backend explanation for a refused write
    pub debug_information: Option<String>,
}

impl IndexResponse {
    pub fn accepted(id: impl Into<String>, index: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            index: index.into(),
            is_valid: true,
            debug_information: None,
        }
    }

    pub fn refused(index: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            index: index.into(),
            is_valid: false,
            debug_information: Some(reason.into()),
        }
    }
}

impl Outcome for IndexResponse {
    fn succeeded(&self) -> bool {
        self.is_valid
    }
}

/// Result of a partial update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateResponse {
    pub id: String,

    /// Partition the update targeted
    pub index: String,

    pub is_valid: bool,

    pub debug_information: Option<String>,
}

impl UpdateResponse {
    pub fn accepted(id: impl Into<String>, index: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            index: index.into(),
            is_valid: true,
            debug_information: None,
        }
    }

    pub fn refused(
        id: impl Into<String>,
        index: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            index: index.into(),
            is_valid: false,
            debug_information: Some(reason.into()),
        }
    }
}

impl Outcome for UpdateResponse {
    fn succeeded(&self) -> bool {
        self.is_valid
    }
}

/// Raw operations against a single partition of the search index
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Write a new document, letting the store assign its id
    async fn index(&self, index: &str, document: &SystemEventDocument)
        -> StoreResult<IndexResponse>;

    /// Merge `partial` into an existing document
    async fn update(
        &self,
        index: &str,
        id: &str,
        partial: &PartialSystemEventDocument,
        retry_on_conflict: u32,
    ) -> StoreResult<UpdateResponse>;

    /// Fetch a document; `None` when the partition or the id is unknown
    async fn get(&self, index: &str, id: &str) -> StoreResult<Option<SystemEventDocument>>;
}

/// Options for [`DocumentStoreClient::update`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOptions {
    pub retry_on_conflict: u32,

    /// Retry once against the previous partition when the current one fails
    pub retry_with_previous_index: bool,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            retry_on_conflict: DEFAULT_RETRY_ON_CONFLICT,
            retry_with_previous_index: false,
        }
    }
}

impl UpdateOptions {
    /// Options for documents that may sit in the previous partition
    pub fn spanning_partitions() -> Self {
        Self {
            retry_with_previous_index: true,
            ..Self::default()
        }
    }
}

/// Instrumented, partition-aware façade over a [`SearchBackend`]
///
/// Stateless apart from its collaborators; cheap to clone and safe to share.
#[derive(Clone)]
pub struct DocumentStoreClient {
    backend: Arc<dyn SearchBackend>,
    indices: IndexNameResolver,
    monitor: ClientMonitor,
}

impl DocumentStoreClient {
    pub fn new(backend: Arc<dyn SearchBackend>, indices: IndexNameResolver) -> Self {
        Self {
            backend,
            indices,
            monitor: ClientMonitor::new(CLIENT_NAME),
        }
    }

    /// Write a document into the current partition
    pub async fn index(&self, document: &SystemEventDocument) -> StoreResult<IndexResponse> {
        let index = self.indices.current_index_name();
        debug!("Indexing system event into {}", index);

        self.monitor
            .observe(INDEX_METHOD, self.backend.index(&index, document))
            .await
    }

    /// Apply a partial update, optionally falling back to the previous partition
    pub async fn update(
        &self,
        id: &str,
        partial: &PartialSystemEventDocument,
        options: UpdateOptions,
    ) -> StoreResult<UpdateResponse> {
        let current = self.indices.current_index_name();
        let first = self
            .update_in(&current, id, partial, options.retry_on_conflict)
            .await;

        if !options.retry_with_previous_index || matches!(&first, Ok(r) if r.is_valid) {
            return first;
        }

        let previous = self.indices.previous_index_name();
        if previous == current {
            return first;
        }

        match &first {
            Ok(response) => info!(
                "Document {} not updated in {} ({}), retrying in {}",
                id,
                current,
                response.debug_information.as_deref().unwrap_or("no details"),
                previous
            ),
            Err(e) => warn!(
                "Updating document {} in {} failed ({}), retrying in {}",
                id, current, e, previous
            ),
        }

        self.update_in(&previous, id, partial, options.retry_on_conflict)
            .await
    }

    /// Apply a partial update to one named partition
    pub async fn update_in(
        &self,
        index: &str,
        id: &str,
        partial: &PartialSystemEventDocument,
        retry_on_conflict: u32,
    ) -> StoreResult<UpdateResponse> {
        self.monitor
            .observe(
                UPDATE_METHOD,
                self.backend.update(index, id, partial, retry_on_conflict),
            )
            .await
    }

    /// Read a document from the current partition, then the previous one
    pub async fn get(&self, id: &str) -> StoreResult<Option<SystemEventDocument>> {
        let current = self.indices.current_index_name();
        if let Some(document) = self.get_in(&current, id).await? {
            return Ok(Some(document));
        }

        let previous = self.indices.previous_index_name();
        if previous == current {
            return Ok(None);
        }

        debug!("Document {} not in {}, looking in {}", id, current, previous);
        self.get_in(&previous, id).await
    }

    /// Read a document from one named partition
    pub async fn get_in(&self, index: &str, id: &str) -> StoreResult<Option<SystemEventDocument>> {
        self.monitor
            .observe(GET_METHOD, self.backend.get(index, id))
            .await
    }
}

impl std::fmt::Debug for DocumentStoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStoreClient")
            .field("indices", &self.indices)
            .field("monitor", &self.monitor)
            .finish_non_exhaustive()
    }
}
