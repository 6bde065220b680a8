// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for system-events
//!
//! Provides deterministic collaborators for the integration tests.
//! All clocks are pinned to 2024-05-02T08:30:00Z so partition names and
//! timestamps are reproducible.
//!
//! # Design Principles
//! - No wall clock: every resolver and provider uses [`fixed_clock`]
//! - No network: channels are recording doubles unless a test starts its own
//!   local listener
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use system_events::clock::{Clock, FixedClock};
use system_events::errors::{NotifyError, NotifyResult, StoreResult};
use system_events::index::{IndexNameResolver, IndexSettings};
use system_events::model::PartialSystemEventDocument;
use system_events::notification::{ChannelAdapter, Notification, NotificationRouter};
use system_events::store::{
    DocumentStoreClient, IndexResponse, InMemoryBackend, SearchBackend, UpdateResponse,
};
use system_events::timestamp::{TimestampFormat, TimestampProvider};
use system_events::{
    CategoryPolicy, ChannelType, EventRequest, Level, SystemEventDocument, SystemEventSender,
};

pub const NOW_EPOCH: &str = "1714638600";
pub const YESTERDAY_EPOCH: &str = "1714552200";

pub const TODAY_INDEX: &str = "evt-2024.05.02";
pub const YESTERDAY_INDEX: &str = "evt-2024.05.01";

pub const WEBHOOK_URL: &str = "https://hooks/x";
pub const TOPIC_ARN: &str = "arn:aws:sns:us-east-1:123456789012:deploys";

/// Policy of the reference deployment scenario
pub const DEPLOY_POLICY_YAML: &str = r#"
categories:
  - name: deploy
    description: Service deployments
  - name: outage
    level: critical
subscriptions:
  - type: slack
    category: deploy
    webhook_url: https://hooks/x
"#;

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 2, 8, 30, 0).unwrap()
}

pub fn fixed_clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock(fixed_now()))
}

pub fn daily_indices() -> IndexNameResolver {
    IndexNameResolver::new(
        &IndexSettings {
            default_index: None,
            pattern_prefix: Some("evt-".to_string()),
            pattern_suffix_format: Some("yyyy.MM.dd".to_string()),
        },
        fixed_clock(),
    )
    .unwrap()
}

pub fn deploy_policy() -> CategoryPolicy {
    CategoryPolicy::from_yaml_str(DEPLOY_POLICY_YAML).unwrap()
}

pub fn deploy_request() -> EventRequest {
    EventRequest::new("deploy", "svc-a", Level::Critical, "rollout", "alice")
}

/// Document as it would have been stored yesterday
pub fn yesterdays_document() -> SystemEventDocument {
    SystemEventDocument::from_request(&deploy_request(), YESTERDAY_EPOCH)
}

/// Sender over `backend` with every adapter registered
pub fn sender_with(
    backend: Arc<dyn SearchBackend>,
    policy: CategoryPolicy,
    adapters: Vec<Arc<dyn ChannelAdapter>>,
) -> SystemEventSender {
    let router = adapters
        .into_iter()
        .fold(NotificationRouter::new(policy.channel_map()), |router, adapter| {
            router.with_adapter(adapter)
        });

    SystemEventSender::new(
        DocumentStoreClient::new(backend, daily_indices()),
        TimestampProvider::new(TimestampFormat::EpochSecond, fixed_clock()),
        Arc::new(policy),
    )
    .with_notifier(router)
}

/// One delivery seen by a [`RecordingChannel`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub destination: String,
    pub message: String,
    pub category: String,
    pub document_id: Option<String>,
}

/// Channel double that records every delivery and optionally fails it
pub struct RecordingChannel {
    channel: ChannelType,
    fail: bool,
    deliveries: Mutex<Vec<Delivery>>,
}

impl RecordingChannel {
    pub fn new(channel: ChannelType) -> Arc<Self> {
        Arc::new(Self {
            channel,
            fail: false,
            deliveries: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(channel: ChannelType) -> Arc<Self> {
        Arc::new(Self {
            channel,
            fail: true,
            deliveries: Mutex::new(Vec::new()),
        })
    }

    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChannelAdapter for RecordingChannel {
    fn channel(&self) -> ChannelType {
        self.channel.clone()
    }

    async fn deliver(
        &self,
        destination: &str,
        notification: &Notification<'_>,
    ) -> NotifyResult<()> {
        self.deliveries.lock().unwrap().push(Delivery {
            destination: destination.to_string(),
            message: notification.message().to_string(),
            category: notification.document.category.clone(),
            document_id: notification.document.id.clone(),
        });
        if self.fail {
            return Err(NotifyError::Status {
                status: 500,
                body: "channel down".to_string(),
            });
        }
        Ok(())
    }
}

/// In-memory backend that also records which partition each call hit
#[derive(Default)]
pub struct PartitionRecorder {
    pub inner: InMemoryBackend,
    calls: Mutex<Vec<(&'static str, String)>>,
}

impl PartitionRecorder {
    pub fn calls(&self) -> Vec<(&'static str, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn updates(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|(op, _)| *op == "update")
            .map(|(_, index)| index)
            .collect()
    }

    fn record(&self, op: &'static str, index: &str) {
        self.calls.lock().unwrap().push((op, index.to_string()));
    }
}

#[async_trait]
impl SearchBackend for PartitionRecorder {
    async fn index(
        &self,
        index: &str,
        document: &SystemEventDocument,
    ) -> StoreResult<IndexResponse> {
        self.record("index", index);
        self.inner.index(index, document).await
    }

    async fn update(
        &self,
        index: &str,
        id: &str,
        partial: &PartialSystemEventDocument,
        retry_on_conflict: u32,
    ) -> StoreResult<UpdateResponse> {
        self.record("update", index);
        self.inner.update(index, id, partial, retry_on_conflict).await
    }

    async fn get(&self, index: &str, id: &str) -> StoreResult<Option<SystemEventDocument>> {
        self.record("get", index);
        self.inner.get(index, id).await
    }
}
