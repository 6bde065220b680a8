// Copyright (c) 2025 - Cowboy AI, Inc.
//! Notification Router
//!
//! Fans a persisted event out to every channel subscribed to its category.
//!
//! ```text
//! category ──> ChannelMap ──> [wildcard subs.., category subs..]
//!                                   │
//!                  for each ────────┤
//!                                   ▼
//!                   adapters[sub.channel].deliver(destination, notification)
//! ```
//!
//! Delivery is best-effort: a failing, unsupported or cancelled channel is
//! logged and counted in the [`DeliveryReport`], and the next subscription is
//! still attempted. Nothing is retried.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::errors::{NotifyError, NotifyResult};
use crate::model::SystemEventDocument;
use crate::policy::{CategorySubscription, ChannelMap, ChannelType};

pub mod sigv4;
pub mod slack;
pub mod sns;

pub use slack::{SlackChannel, SlackMessage, SlackWebhookClient};
pub use sns::{AwsCredentials, SnsChannel, SnsClient, SnsConfig, TopicPublisher};

/// Point in an event's life that triggered the notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleStage {
    Created,
    Started,
    Finished,
}

impl LifecycleStage {
    /// Title used by every channel
    pub fn message(&self) -> &'static str {
        match self {
            LifecycleStage::Created => "New System Event Created",
            LifecycleStage::Started => "New System Event Started",
            LifecycleStage::Finished => "System Event Finished",
        }
    }
}

impl fmt::Display for LifecycleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// What is being announced
#[derive(Debug, Clone, Copy)]
pub struct Notification<'a> {
    pub stage: LifecycleStage,
    pub document: &'a SystemEventDocument,
}

impl<'a> Notification<'a> {
    pub fn new(stage: LifecycleStage, document: &'a SystemEventDocument) -> Self {
        Self { stage, document }
    }

    pub fn message(&self) -> &'static str {
        self.stage.message()
    }
}

/// Delivers notifications over one channel type
#[async_trait]
pub trait ChannelAdapter: Send + Sync {
    /// Channel type this adapter serves
    fn channel(&self) -> ChannelType;

    /// Deliver to one destination (webhook URL, topic ARN, ...)
    async fn deliver(&self, destination: &str, notification: &Notification<'_>)
        -> NotifyResult<()>;
}

/// Per-notification delivery tally
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl DeliveryReport {
    pub fn attempted(&self) -> usize {
        self.delivered + self.failed
    }
}

/// Category-driven fan-out over registered channel adapters
///
/// Built once at startup; shared read-only across concurrent requests.
#[derive(Clone, Default)]
pub struct NotificationRouter {
    channels: ChannelMap,
    adapters: HashMap<ChannelType, Arc<dyn ChannelAdapter>>,
}

impl NotificationRouter {
    pub fn new(channels: ChannelMap) -> Self {
        Self {
            channels,
            adapters: HashMap::new(),
        }
    }

    /// Register the adapter for its channel type, replacing any previous one
    pub fn with_adapter(mut self, adapter: Arc<dyn ChannelAdapter>) -> Self {
        self.adapters.insert(adapter.channel(), adapter);
        self
    }

    pub fn channels(&self) -> &ChannelMap {
        &self.channels
    }

    pub async fn on_event_created(
        &self,
        category: &str,
        document: &SystemEventDocument,
        cancel: &CancellationToken,
    ) -> NotifyResult<DeliveryReport> {
        self.notify(LifecycleStage::Created, category, document, cancel)
            .await
    }

    pub async fn on_event_started(
        &self,
        category: &str,
        document: &SystemEventDocument,
        cancel: &CancellationToken,
    ) -> NotifyResult<DeliveryReport> {
        self.notify(LifecycleStage::Started, category, document, cancel)
            .await
    }

    pub async fn on_event_finished(
        &self,
        category: &str,
        document: &SystemEventDocument,
        cancel: &CancellationToken,
    ) -> NotifyResult<DeliveryReport> {
        self.notify(LifecycleStage::Finished, category, document, cancel)
            .await
    }

    /// Send `stage` for `document` to every subscription of `category`
    ///
    /// Only a blank category is an error; channel failures end up in the
    /// report.
    pub async fn notify(
        &self,
        stage: LifecycleStage,
        category: &str,
        document: &SystemEventDocument,
        cancel: &CancellationToken,
    ) -> NotifyResult<DeliveryReport> {
        let category = category.trim();
        if category.is_empty() {
            return Err(NotifyError::MissingCategory);
        }

        let subscriptions = self.channels.subscriptions_for(category);
        info!(
            "Sending `{}` notification for category {} to {} subscriptions",
            stage,
            category,
            subscriptions.len()
        );

        let notification = Notification::new(stage, document);
        let mut report = DeliveryReport::default();

        for subscription in subscriptions {
            match self.dispatch(subscription, &notification, cancel).await {
                Ok(()) => report.delivered += 1,
                Err(NotifyError::UnsupportedChannel(channel)) => {
                    info!("The notification channel {} is not supported", channel);
                    report.skipped += 1;
                }
                Err(e) => {
                    error!(
                        "Failed to deliver {} notification for category {}: {}",
                        subscription.channel, subscription.category, e
                    );
                    report.failed += 1;
                }
            }
        }

        debug!("Notification report for {}: {:?}", category, report);
        Ok(report)
    }

    async fn dispatch(
        &self,
        subscription: &CategorySubscription,
        notification: &Notification<'_>,
        cancel: &CancellationToken,
    ) -> NotifyResult<()> {
        let adapter = self
            .adapters
            .get(&subscription.channel)
            .ok_or_else(|| NotifyError::UnsupportedChannel(subscription.channel.to_string()))?;

        let destination = subscription
            .destination()
            .ok_or_else(|| NotifyError::MissingDestination(subscription.category.clone()))?;

        if cancel.is_cancelled() {
            warn!("Skipping {} delivery, request cancelled", subscription.channel);
            return Err(NotifyError::Cancelled);
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(NotifyError::Cancelled),
            result = adapter.deliver(destination, notification) => result,
        }
    }
}

impl fmt::Debug for NotificationRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut channels: Vec<&str> = self.adapters.keys().map(ChannelType::as_str).collect();
        channels.sort_unstable();
        f.debug_struct("NotificationRouter")
            .field("channels", &self.channels)
            .field("adapters", &channels)
            .finish()
    }
}
