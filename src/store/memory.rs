// Copyright (c) 2025 - Cowboy AI, Inc.
//! In-memory search backend

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{IndexResponse, SearchBackend, UpdateResponse};
use crate::errors::StoreResult;
use crate::model::{PartialSystemEventDocument, SystemEventDocument};

type Partition = HashMap<String, SystemEventDocument>;

/// Partitioned document map with the same contract as the real store
///
/// Updates against an unknown partition or id are refused (`is_valid ==
/// false`), like a `document_missing_exception`.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    partitions: RwLock<HashMap<String, Partition>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a document under a known id, e.g. to simulate an older partition
    pub async fn insert(&self, index: &str, id: &str, mut document: SystemEventDocument) {
        document.id = None;
        self.partitions
            .write()
            .await
            .entry(index.to_string())
            .or_default()
            .insert(id.to_string(), document);
    }

    /// Number of documents stored in a partition
    pub async fn count(&self, index: &str) -> usize {
        self.partitions
            .read()
            .await
            .get(index)
            .map_or(0, HashMap::len)
    }

    /// Names of partitions holding at least one document
    pub async fn index_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.partitions.read().await.keys().cloned().collect();
        names.sort();
        names
    }
}

#[async_trait]
impl SearchBackend for InMemoryBackend {
    async fn index(
        &self,
        index: &str,
        document: &SystemEventDocument,
    ) -> StoreResult<IndexResponse> {
        let id = Uuid::now_v7().to_string();
        self.insert(index, &id, document.clone()).await;
        Ok(IndexResponse::accepted(id, index))
    }

    async fn update(
        &self,
        index: &str,
        id: &str,
        partial: &PartialSystemEventDocument,
        _retry_on_conflict: u32,
    ) -> StoreResult<UpdateResponse> {
        let mut partitions = self.partitions.write().await;
        match partitions.get_mut(index).and_then(|p| p.get_mut(id)) {
            Some(document) => {
                document.apply(partial);
                Ok(UpdateResponse::accepted(id, index))
            }
            None => Ok(UpdateResponse::refused(
                id,
                index,
                format!("document_missing_exception: [{}] in [{}]", id, index),
            )),
        }
    }

    async fn get(&self, index: &str, id: &str) -> StoreResult<Option<SystemEventDocument>> {
        let partitions = self.partitions.read().await;
        Ok(partitions.get(index).and_then(|p| p.get(id)).map(|document| {
            let mut document = document.clone();
            document.id = Some(id.to_string());
            document
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EventRequest, Level};

    fn document() -> SystemEventDocument {
        SystemEventDocument::from_request(
            &EventRequest::new("deploy", "svc-a", Level::Information, "rollout", "alice"),
            "t0",
        )
    }

    #[tokio::test]
    async fn test_index_then_get() {
        let backend = InMemoryBackend::new();
        let response = backend.index("evt-2024.05.02", &document()).await.unwrap();
        assert!(response.is_valid);

        let stored = backend.get("evt-2024.05.02", &response.id).await.unwrap().unwrap();
        assert_eq!(stored.id.as_deref(), Some(response.id.as_str()));
        assert_eq!(stored.message, "rollout by alice");

        assert!(backend.get("evt-2024.05.01", &response.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_missing_document_is_refused() {
        let backend = InMemoryBackend::new();
        let partial = PartialSystemEventDocument {
            endtime: "t1".to_string(),
        };
        let response = backend.update("evt-2024.05.02", "nope", &partial, 3).await.unwrap();
        assert!(!response.is_valid);
        assert!(response
            .debug_information
            .unwrap()
            .contains("document_missing_exception"));
    }

    #[tokio::test]
    async fn test_insert_and_count() {
        let backend = InMemoryBackend::new();
        backend.insert("evt-2024.05.01", "old", document()).await;
        assert_eq!(backend.count("evt-2024.05.01").await, 1);
        assert_eq!(backend.count("evt-2024.05.02").await, 0);
        assert_eq!(backend.index_names().await, vec!["evt-2024.05.01"]);
    }
}
