// Copyright (c) 2025 - Cowboy AI, Inc.
//! Category Policy
//!
//! Optional YAML document restricting which categories may be reported and
//! who gets notified about them:
//!
//! ```yaml
//! categories:
//!   - name: deploy
//!     description: Service deployments
//!   - name: outage
//!     level: critical
//! subscriptions:
//!   - type: slack
//!     category: deploy
//!     webhook_url: https://hooks.slack.com/services/T000/B000/XXXX
//!   - type: sns
//!     category: "*"
//!     topic_arn: arn:aws:sns:us-east-1:123456789012:system-events
//! ```
//!
//! Validation depends only on the `categories` section: absent means any
//! category is accepted; present means only listed ones are, unless one of
//! them is the wildcard `*`. A fixed `level` is enforced whenever the
//! category is listed. Subscriptions never influence validation.
//!
//! The policy is loaded once at startup and never mutated afterwards.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use tracing::{debug, info};

use crate::model::Level;
use crate::validation::{ValidationError, ValidationResult};

/// Category name matching every category
pub const WILDCARD: &str = "*";

/// Replacement shown for webhook URLs in subscription listings
pub const REDACTED_WEBHOOK_URL: &str = "https://hooks.slack.com/services/##############";

/// Errors loading the policy document
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("File {0} does not exist")]
    NotFound(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid category policy: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// An allowed category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// When set, events of this category must carry exactly this level
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<Level>,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            level: None,
        }
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = Some(level);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_wildcard(&self) -> bool {
        self.name == WILDCARD
    }
}

/// Notification channel kind
///
/// Unknown names are kept so they can be reported and skipped at delivery
/// time instead of failing the whole policy.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChannelType {
    Slack,
    Sns,
    Other(String),
}

impl ChannelType {
    pub fn as_str(&self) -> &str {
        match self {
            ChannelType::Slack => "slack",
            ChannelType::Sns => "sns",
            ChannelType::Other(name) => name,
        }
    }
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChannelType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "slack" => ChannelType::Slack,
            "sns" => ChannelType::Sns,
            _ => ChannelType::Other(s.trim().to_string()),
        })
    }
}

impl Serialize for ChannelType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ChannelType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        match name.parse() {
            Ok(channel) => Ok(channel),
            Err(never) => match never {},
        }
    }
}

/// Binding of one category (or the wildcard) to one channel destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySubscription {
    #[serde(rename = "type")]
    pub channel: ChannelType,

    pub category: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_arn: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
}

impl CategorySubscription {
    pub fn slack(category: impl Into<String>, webhook_url: impl Into<String>) -> Self {
        Self {
            channel: ChannelType::Slack,
            category: category.into(),
            topic_arn: None,
            webhook_url: Some(webhook_url.into()),
        }
    }

    pub fn sns(category: impl Into<String>, topic_arn: impl Into<String>) -> Self {
        Self {
            channel: ChannelType::Sns,
            category: category.into(),
            topic_arn: Some(topic_arn.into()),
            webhook_url: None,
        }
    }

    /// Webhook URL or topic ARN, whichever the channel type uses
    pub fn destination(&self) -> Option<&str> {
        let destination = match self.channel {
            ChannelType::Slack => self.webhook_url.as_deref(),
            ChannelType::Sns => self.topic_arn.as_deref(),
            ChannelType::Other(_) => None,
        };
        destination.map(str::trim).filter(|d| !d.is_empty())
    }
}

/// Category allow-list and subscriptions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPolicy {
    #[serde(default)]
    pub categories: Option<Vec<Category>>,

    #[serde(default)]
    pub subscriptions: Option<Vec<CategorySubscription>>,
}

impl CategoryPolicy {
    /// Policy admitting everything and notifying no one
    pub fn unrestricted() -> Self {
        Self::default()
    }

    /// Load the policy from a YAML file
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, PolicyError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PolicyError::NotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path).map_err(|source| PolicyError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let policy = Self::from_yaml_str(&content)?;
        info!(
            "Loaded category policy from {}: {} categories, {} subscriptions",
            path.display(),
            policy.categories().len(),
            policy.subscriptions().len()
        );
        Ok(policy)
    }

    /// Parse a YAML policy document; an empty document is unrestricted
    pub fn from_yaml_str(content: &str) -> Result<Self, PolicyError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Configured categories, wildcard included
    pub fn categories(&self) -> &[Category] {
        self.categories.as_deref().unwrap_or_default()
    }

    pub fn subscriptions(&self) -> &[CategorySubscription] {
        self.subscriptions.as_deref().unwrap_or_default()
    }

    /// Whether any category is accepted without being listed
    pub fn allows_any_category(&self) -> bool {
        match &self.categories {
            None => true,
            Some(categories) => categories.iter().any(Category::is_wildcard),
        }
    }

    pub fn find_category(&self, name: &str) -> Option<&Category> {
        self.categories().iter().find(|c| c.name == name)
    }

    /// Check a trimmed category and level against the policy
    pub fn check(&self, category: &str, level: Level) -> ValidationResult {
        let configured = self.find_category(category);

        if configured.is_none() && !self.allows_any_category() {
            debug!("Rejected category `{}`", category);
            return Err(ValidationError::CategoryNotAllowed(category.to_string()));
        }

        if let Some(required) = configured.and_then(|c| c.level) {
            if required != level {
                return Err(ValidationError::LevelMismatch {
                    category: category.to_string(),
                    required,
                });
            }
        }

        Ok(())
    }

    /// Subscriptions with webhook URLs masked, for listing to callers
    pub fn redacted_subscriptions(&self) -> Vec<CategorySubscription> {
        self.subscriptions()
            .iter()
            .cloned()
            .map(|mut subscription| {
                if subscription.webhook_url.is_some() {
                    subscription.webhook_url = Some(REDACTED_WEBHOOK_URL.to_string());
                }
                subscription
            })
            .collect()
    }

    /// Derive the category → subscriptions map used for notification fan-out
    pub fn channel_map(&self) -> ChannelMap {
        ChannelMap::from_subscriptions(self.subscriptions())
    }
}

/// Subscriptions grouped by category
///
/// Built once; only read access is exposed afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelMap {
    by_category: HashMap<String, Vec<CategorySubscription>>,
}

impl ChannelMap {
    pub fn from_subscriptions(subscriptions: &[CategorySubscription]) -> Self {
        let mut by_category: HashMap<String, Vec<CategorySubscription>> = HashMap::new();
        for subscription in subscriptions {
            by_category
                .entry(subscription.category.clone())
                .or_default()
                .push(subscription.clone());
        }
        Self { by_category }
    }

    /// Wildcard subscriptions followed by those bound to `category`
    pub fn subscriptions_for(&self, category: &str) -> Vec<&CategorySubscription> {
        let wildcard = self.by_category.get(WILDCARD).into_iter().flatten();
        let specific = if category == WILDCARD {
            None
        } else {
            self.by_category.get(category)
        };
        wildcard.chain(specific.into_iter().flatten()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.by_category.is_empty()
    }

    /// Number of distinct category keys
    pub fn len(&self) -> usize {
        self.by_category.len()
    }
}
