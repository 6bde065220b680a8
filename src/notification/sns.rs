// Copyright (c) 2025 - Cowboy AI, Inc.
//! Amazon SNS channel
//!
//! Publishes through the SNS query API (`Action=Publish`) with a SigV4-signed
//! form POST. The topic's region is taken from its ARN so one client can
//! serve topics in several regions.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::sigv4::{amz_date, CanonicalRequest, SigV4Signer};
use super::{ChannelAdapter, Notification};
use crate::clock::{Clock, SystemClock};
use crate::errors::{NotifyError, NotifyResult};
use crate::model::SystemEventDocument;
use crate::monitoring::{ClientMonitor, Outcome};
use crate::policy::ChannelType;

const MONITOR: ClientMonitor = ClientMonitor::new("AmazonSimpleNotificationService");
const PUBLISH: &str = "PublishAsync";

const SERVICE: &str = "sns";
const API_VERSION: &str = "2010-03-31";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=utf-8";

/// Static AWS credentials
#[derive(Clone, Serialize, Deserialize)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    #[serde(default)]
    pub session_token: Option<String>,
}

impl fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("session_token", &self.session_token.as_ref().map(|_| "***"))
            .finish_non_exhaustive()
    }
}

/// SNS client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnsConfig {
    /// Region used when a topic ARN does not name one
    pub region: String,

    /// Endpoint override (e.g. a local emulator); `{region}` is substituted
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    5
}

impl Default for SnsConfig {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            endpoint: None,
            timeout_secs: default_timeout(),
        }
    }
}

/// Result of a successful publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishResponse {
    pub message_id: Option<String>,
}

impl Outcome for PublishResponse {}

/// Publishes a message to a topic
#[async_trait]
pub trait TopicPublisher: Send + Sync {
    async fn publish(&self, topic_arn: &str, message: &str) -> NotifyResult<PublishResponse>;
}

/// A publish request ready to send
#[derive(Debug, Clone)]
pub struct SignedPublish {
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// SigV4-signing SNS client
pub struct SnsClient {
    config: SnsConfig,
    credentials: AwsCredentials,
    client: Client,
    clock: Arc<dyn Clock>,
}

impl SnsClient {
    pub fn new(config: SnsConfig, credentials: AwsCredentials) -> NotifyResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            config,
            credentials,
            client,
            clock: Arc::new(SystemClock),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn endpoint(&self, region: &str) -> NotifyResult<Url> {
        let raw = match &self.config.endpoint {
            Some(endpoint) => endpoint.replace("{region}", region),
            None => format!("https://sns.{}.amazonaws.com/", region),
        };
        Url::parse(&raw).map_err(|e| NotifyError::InvalidDestination(format!("{}: {}", raw, e)))
    }

    /// Build and sign the `Publish` call for `topic_arn` at instant `at`
    pub fn sign_publish(
        &self,
        topic_arn: &str,
        message: &str,
        at: DateTime<Utc>,
    ) -> NotifyResult<SignedPublish> {
        let topic_arn = topic_arn.trim();
        if topic_arn.is_empty() {
            return Err(NotifyError::InvalidDestination(
                "topic ARN can not be null or whitespace".to_string(),
            ));
        }

        let region = region_from_arn(topic_arn).unwrap_or(self.config.region.as_str());
        let url = self.endpoint(region)?;
        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => {
                return Err(NotifyError::InvalidDestination(format!(
                    "endpoint {} has no host",
                    url
                )))
            }
        };

        let body = form_body(&[
            ("Action", "Publish"),
            ("Message", message),
            ("TopicArn", topic_arn),
            ("Version", API_VERSION),
        ]);

        let mut headers = vec![
            ("content-type".to_string(), FORM_CONTENT_TYPE.to_string()),
            ("host".to_string(), host),
            ("x-amz-date".to_string(), amz_date(at)),
        ];
        if let Some(token) = &self.credentials.session_token {
            headers.push(("x-amz-security-token".to_string(), token.clone()));
        }

        let signer = SigV4Signer::new(
            self.credentials.access_key_id.as_str(),
            self.credentials.secret_access_key.as_str(),
            region,
            SERVICE,
        );
        let authorization = signer.authorization(
            &CanonicalRequest {
                method: "POST",
                path: url.path(),
                query: "",
                headers: headers.clone(),
                payload: body.as_bytes(),
            },
            at,
        )?;
        headers.push(("authorization".to_string(), authorization));

        Ok(SignedPublish { url, headers, body })
    }
}

#[async_trait]
impl TopicPublisher for SnsClient {
    async fn publish(&self, topic_arn: &str, message: &str) -> NotifyResult<PublishResponse> {
        MONITOR
            .observe(PUBLISH, async {
                let signed = self.sign_publish(topic_arn, message, self.clock.now())?;
                let mut request = self.client.post(signed.url);
                for (name, value) in &signed.headers {
                    // reqwest derives host from the URL
                    if name != "host" {
                        request = request.header(name.as_str(), value.as_str());
                    }
                }

                let response = request.body(signed.body).send().await?;
                let status = response.status();
                let body = response.text().await?;
                if !status.is_success() {
                    return Err(NotifyError::Status {
                        status: status.as_u16(),
                        body,
                    });
                }

                Ok(PublishResponse {
                    message_id: extract_tag(&body, "MessageId"),
                })
            })
            .await
    }
}

impl fmt::Debug for SnsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnsClient")
            .field("config", &self.config)
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

/// JSON published to the topic
#[derive(Debug, Serialize)]
pub struct SnsEnvelope<'a> {
    pub event: &'a SystemEventDocument,
    #[serde(rename = "notificationMessage")]
    pub notification_message: &'a str,
}

/// [`ChannelAdapter`] for `sns` subscriptions
#[derive(Clone)]
pub struct SnsChannel {
    publisher: Arc<dyn TopicPublisher>,
}

impl SnsChannel {
    pub fn new(publisher: Arc<dyn TopicPublisher>) -> Self {
        Self { publisher }
    }
}

#[async_trait]
impl ChannelAdapter for SnsChannel {
    fn channel(&self) -> ChannelType {
        ChannelType::Sns
    }

    async fn deliver(
        &self,
        destination: &str,
        notification: &Notification<'_>,
    ) -> NotifyResult<()> {
        let message = serde_json::to_string(&SnsEnvelope {
            event: notification.document,
            notification_message: notification.message(),
        })?;

        let response = self.publisher.publish(destination, &message).await?;
        debug!("Published to {} as {:?}", destination, response.message_id);
        Ok(())
    }
}

/// `arn:aws:sns:<region>:<account>:<topic>` -> `<region>`
pub fn region_from_arn(arn: &str) -> Option<&str> {
    let mut parts = arn.split(':');
    if parts.next() != Some("arn") {
        return None;
    }
    parts.nth(2).filter(|region| !region.is_empty())
}

fn form_body(params: &[(&str, &str)]) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{}={}", urlencoding::encode(key), urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

fn extract_tag(xml: &str, tag: &str) -> Option<String> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);
    let start = xml.find(&open)? + open.len();
    let end = xml[start..].find(&close)? + start;
    Some(xml[start..end].trim().to_string())
}
