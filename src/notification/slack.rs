// Copyright (c) 2025 - Cowboy AI, Inc.
//! Slack incoming-webhook channel

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ChannelAdapter, Notification};
use crate::errors::{NotifyError, NotifyResult};
use crate::model::SystemEventDocument;
use crate::monitoring::ClientMonitor;
use crate::policy::ChannelType;

pub const SYSTEM_NAME: &str = "SystemEvents";
pub const SYSTEM_ICON: &str = ":loudspeaker:";
pub const CRITICAL_COLOR: &str = "#eb4034";
pub const INFORMATION_COLOR: &str = "#349ceb";

/// Webhook calls give up after this long
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

const MONITOR: ClientMonitor = ClientMonitor::new("SlackWebhookClient");
const SEND_MESSAGE: &str = "SendMessageAsync";

/// Incoming-webhook message body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlackMessage {
    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_emoji: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<SlackAttachment>,
}

impl SlackMessage {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            username: None,
            icon_emoji: None,
            attachments: Vec::new(),
        }
    }

    pub fn with_user(mut self, username: impl Into<String>, icon_emoji: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.icon_emoji = Some(icon_emoji.into());
        self
    }

    pub fn with_attachment(mut self, attachment: SlackAttachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Standard rendering of a lifecycle notification
    pub fn for_event(notification: &Notification<'_>) -> Self {
        Self::new(notification.message())
            .with_user(SYSTEM_NAME, SYSTEM_ICON)
            .with_attachment(SlackAttachment::for_document(notification.document))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlackAttachment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(default)]
    pub fields: Vec<SlackField>,
}

impl SlackAttachment {
    pub fn field(mut self, title: &str, value: impl Into<String>, short: bool) -> Self {
        self.fields.push(SlackField {
            title: title.to_string(),
            value: value.into(),
            short,
        });
        self
    }

    pub fn color(mut self, color: &str) -> Self {
        self.color = Some(color.to_string());
        self
    }

    fn for_document(document: &SystemEventDocument) -> Self {
        let color = if document.is_critical() {
            CRITICAL_COLOR
        } else {
            INFORMATION_COLOR
        };

        Self::default()
            .field("Event Id", document.id.clone().unwrap_or_default(), true)
            .field("Message", document.message.as_str(), true)
            .field("Target", document.target_key.as_str(), true)
            .field("Sender", document.sender.as_str(), true)
            .field("Start Time", document.timestamp.as_str(), true)
            .field("End Time", document.endtime.as_str(), true)
            .field("Level", document.level.as_str(), true)
            .color(color)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlackField {
    pub title: String,
    pub value: String,
    pub short: bool,
}

/// Monitored HTTP client for Slack webhooks
#[derive(Debug, Clone)]
pub struct SlackWebhookClient {
    client: Client,
}

impl SlackWebhookClient {
    pub fn new(timeout: Duration) -> NotifyResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Post `message` to `webhook_url`, returning the response body
    pub async fn send(&self, message: &SlackMessage, webhook_url: &str) -> NotifyResult<String> {
        MONITOR
            .observe(SEND_MESSAGE, async {
                let response = self.client.post(webhook_url).json(message).send().await?;
                let status = response.status();
                let body = response.text().await?;

                if !status.is_success() {
                    return Err(NotifyError::Status {
                        status: status.as_u16(),
                        body,
                    });
                }
                Ok(body)
            })
            .await
    }
}

/// [`ChannelAdapter`] for `slack` subscriptions
#[derive(Debug, Clone)]
pub struct SlackChannel {
    client: SlackWebhookClient,
}

impl SlackChannel {
    pub fn new(client: SlackWebhookClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChannelAdapter for SlackChannel {
    fn channel(&self) -> ChannelType {
        ChannelType::Slack
    }

    async fn deliver(
        &self,
        destination: &str,
        notification: &Notification<'_>,
    ) -> NotifyResult<()> {
        let message = SlackMessage::for_event(notification);
        let body = self.client.send(&message, destination).await?;
        debug!("Slack webhook answered: {}", body);
        Ok(())
    }
}
