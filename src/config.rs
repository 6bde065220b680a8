// Copyright (c) 2025 - Cowboy AI, Inc.
//! Runtime configuration
//!
//! Everything is read from environment variables so the same binary runs
//! unchanged across deployments. See [`AppConfig::from_env`] for the names.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::index::IndexSettings;
use crate::notification::{AwsCredentials, SnsConfig};
use crate::store::elasticsearch::ElasticsearchConfig;
use crate::timestamp::TimestampFormat;

pub const ELASTICSEARCH_URL_CSV: &str = "ELASTICSEARCH_URL_CSV";
pub const ELASTICSEARCH_INDEX: &str = "ELASTICSEARCH_INDEX";
pub const ELASTICSEARCH_INDEX_PATTERN_PREFIX: &str = "ELASTICSEARCH_INDEX_PATTERN_PREFIX";
pub const ELASTICSEARCH_INDEX_PATTERN_SUFFIX_FORMAT: &str =
    "ELASTICSEARCH_INDEX_PATTERN_SUFFIX_FORMAT";
pub const ELASTICSEARCH_TIMEOUT_MS: &str = "ELASTICSEARCH_TIMEOUT_MS";
pub const ELASTICSEARCH_DATETIME_FORMAT: &str = "ELASTICSEARCH_DATETIME_FORMAT";
pub const ADVANCE_CONFIGURATION_PATH: &str = "AdvanceConfigurationPath";
pub const AWS_REGION: &str = "AWS_REGION";
pub const AWS_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
pub const AWS_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
pub const AWS_SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";
pub const SNS_ENDPOINT: &str = "SNS_ENDPOINT";
pub const SLACK_SIGNING_SECRET: &str = "SLACK_SIGNING_SECRET";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} not set")]
    Missing(&'static str),

    #[error("{name} has an invalid value `{value}`")]
    Invalid { name: &'static str, value: String },
}

/// SNS client settings plus the credentials to sign with
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnsSettings {
    #[serde(flatten)]
    pub client: SnsConfig,
    pub credentials: AwsCredentials,
}

/// Complete service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub elasticsearch: ElasticsearchConfig,

    #[serde(default)]
    pub indices: IndexSettings,

    #[serde(default)]
    pub timestamp_format: TimestampFormat,

    /// YAML category policy; no file means every category is allowed
    #[serde(default)]
    pub policy_path: Option<PathBuf>,

    /// `None` disables the SNS channel
    #[serde(default)]
    pub sns: Option<SnsSettings>,

    #[serde(default)]
    pub slack_signing_secret: Option<String>,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Category policy location alone, for callers that never touch the store
    pub fn policy_path_from_env() -> Option<PathBuf> {
        Self::policy_path_from_lookup(|name| std::env::var(name).ok())
    }

    pub fn policy_path_from_lookup<F>(lookup: F) -> Option<PathBuf>
    where
        F: Fn(&str) -> Option<String>,
    {
        lookup(ADVANCE_CONFIGURATION_PATH)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let csv = var(ELASTICSEARCH_URL_CSV).ok_or(ConfigError::Missing(ELASTICSEARCH_URL_CSV))?;
        let urls = ElasticsearchConfig::urls_from_csv(&csv);
        if urls.is_empty() {
            return Err(ConfigError::Invalid {
                name: ELASTICSEARCH_URL_CSV,
                value: csv,
            });
        }

        let mut elasticsearch = ElasticsearchConfig {
            urls,
            ..Default::default()
        };
        if let Some(raw) = var(ELASTICSEARCH_TIMEOUT_MS) {
            elasticsearch.timeout_ms = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                name: ELASTICSEARCH_TIMEOUT_MS,
                value: raw.clone(),
            })?;
        }

        let indices = IndexSettings {
            default_index: var(ELASTICSEARCH_INDEX),
            pattern_prefix: var(ELASTICSEARCH_INDEX_PATTERN_PREFIX),
            pattern_suffix_format: var(ELASTICSEARCH_INDEX_PATTERN_SUFFIX_FORMAT),
        };
        if indices.default_index.is_none() && indices.pattern_prefix.is_none() {
            return Err(ConfigError::Missing(ELASTICSEARCH_INDEX));
        }

        let timestamp_format = var(ELASTICSEARCH_DATETIME_FORMAT)
            .map(|raw| TimestampFormat::parse(&raw))
            .unwrap_or_default();

        let sns = match (var(AWS_ACCESS_KEY_ID), var(AWS_SECRET_ACCESS_KEY)) {
            (Some(access_key_id), Some(secret_access_key)) => Some(SnsSettings {
                client: SnsConfig {
                    region: var(AWS_REGION).unwrap_or_else(|| SnsConfig::default().region),
                    endpoint: var(SNS_ENDPOINT),
                    ..Default::default()
                },
                credentials: AwsCredentials {
                    access_key_id,
                    secret_access_key,
                    session_token: var(AWS_SESSION_TOKEN),
                },
            }),
            _ => None,
        };

        Ok(Self {
            elasticsearch,
            indices,
            timestamp_format,
            policy_path: Self::policy_path_from_lookup(&lookup),
            sns,
            slack_signing_secret: var(SLACK_SIGNING_SECRET),
        })
    }
}
