// Copyright (c) 2025 - Cowboy AI, Inc.
//! Elasticsearch REST backend
//!
//! ```text
//! index   POST {node}/{index}/_doc
//! update  POST {node}/{index}/_update/{id}?retry_on_conflict=N   {"doc": {...}}
//! get     GET  {node}/{index}/_doc/{id}
//! ```
//!
//! Nodes are tried in configuration order; the next node is only used when
//! the previous one could not be reached at all.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{IndexResponse, SearchBackend, UpdateResponse};
use crate::errors::{StoreError, StoreResult};
use crate::model::{PartialSystemEventDocument, SystemEventDocument};

/// Connection settings for the Elasticsearch cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElasticsearchConfig {
    /// Node base URLs, e.g. `http://es-1:9200`
    pub urls: Vec<String>,

    /// Per-request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    5000
}

impl Default for ElasticsearchConfig {
    fn default() -> Self {
        Self {
            urls: vec!["http://localhost:9200".to_string()],
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl ElasticsearchConfig {
    /// Parse a comma separated node list, skipping blank entries
    pub fn urls_from_csv(csv: &str) -> Vec<String> {
        csv.split(',')
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(|u| u.trim_end_matches('/').to_string())
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct WriteAck {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_index")]
    index: String,
}

#[derive(Debug, Deserialize)]
struct GetHit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(default)]
    found: bool,
    #[serde(rename = "_source")]
    source: Option<SystemEventDocument>,
}

#[derive(Serialize)]
struct PartialUpdate<'a> {
    doc: &'a PartialSystemEventDocument,
}

/// [`SearchBackend`] speaking the Elasticsearch document API
#[derive(Debug, Clone)]
pub struct ElasticsearchBackend {
    nodes: Vec<String>,
    client: Client,
}

impl ElasticsearchBackend {
    pub fn new(config: &ElasticsearchConfig) -> StoreResult<Self> {
        let nodes: Vec<String> = config
            .urls
            .iter()
            .map(|u| u.trim().trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .collect();

        if nodes.is_empty() {
            return Err(StoreError::Configuration(
                "at least one Elasticsearch URL is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| StoreError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { nodes, client })
    }

    /// Send the request built for each node until one answers
    async fn send<F>(&self, build: F) -> StoreResult<Response>
    where
        F: Fn(&str) -> RequestBuilder,
    {
        let mut last_error = None;

        for node in &self.nodes {
            match build(node).send().await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    warn!("Elasticsearch node {} unreachable: {}", node, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .map(StoreError::from)
            .unwrap_or_else(|| StoreError::Transport("no Elasticsearch nodes".to_string())))
    }
}

fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

async fn refusal(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    format!("Elasticsearch returned {}: {}", status, body)
}

#[async_trait]
impl SearchBackend for ElasticsearchBackend {
    async fn index(
        &self,
        index: &str,
        document: &SystemEventDocument,
    ) -> StoreResult<IndexResponse> {
        let path = format!("{}/_doc", segment(index));
        let response = self
            .send(|node| self.client.post(format!("{}/{}", node, path)).json(document))
            .await?;

        if !response.status().is_success() {
            return Ok(IndexResponse::refused(index, refusal(response).await));
        }

        let ack: WriteAck = response.json().await?;
        debug!("Indexed document {} into {}", ack.id, ack.index);
        Ok(IndexResponse::accepted(ack.id, ack.index))
    }

    async fn update(
        &self,
        index: &str,
        id: &str,
        partial: &PartialSystemEventDocument,
        retry_on_conflict: u32,
    ) -> StoreResult<UpdateResponse> {
        let path = format!("{}/_update/{}", segment(index), segment(id));
        let body = PartialUpdate { doc: partial };
        let response = self
            .send(|node| {
                self.client
                    .post(format!("{}/{}", node, path))
                    .query(&[("retry_on_conflict", retry_on_conflict)])
                    .json(&body)
            })
            .await?;

        if !response.status().is_success() {
            return Ok(UpdateResponse::refused(id, index, refusal(response).await));
        }

        let ack: WriteAck = response.json().await?;
        Ok(UpdateResponse::accepted(ack.id, ack.index))
    }

    async fn get(&self, index: &str, id: &str) -> StoreResult<Option<SystemEventDocument>> {
        let path = format!("{}/_doc/{}", segment(index), segment(id));
        let response = self
            .send(|node| self.client.get(format!("{}/{}", node, path)))
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let hit: GetHit = response.json().await?;
                if !hit.found {
                    return Ok(None);
                }
                Ok(hit.source.map(|mut document| {
                    document.id = Some(hit.id);
                    document
                }))
            }
            status => Err(StoreError::UnexpectedStatus {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            }),
        }
    }
}
