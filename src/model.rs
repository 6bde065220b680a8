// Copyright (c) 2025 - Cowboy AI, Inc.
//! System event data model
//!
//! - [`EventRequest`] - transient operator input
//! - [`SystemEventDocument`] - the persisted search-index document
//! - [`PartialSystemEventDocument`] - the only mutation ever applied (end time)

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Event severity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Critical,
    #[default]
    Information,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Critical => "critical",
            Level::Information => "information",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown level `{0}`, expected `critical` or `information`")]
pub struct ParseLevelError(String);

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "critical" => Ok(Level::Critical),
            "information" | "info" => Ok(Level::Information),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}

/// Operator-reported event as received from the HTTP layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRequest {
    /// Classification, e.g. "deploy" or "maintenance"
    pub category: String,

    /// Filter key, usually the service or application name
    pub target_key: String,

    pub level: Level,

    /// Free text; the sender is appended when stored
    pub message: String,

    /// User or application reporting the event
    pub sender: String,

    #[serde(default)]
    pub tags: BTreeSet<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_ip_address: Option<String>,
}

impl EventRequest {
    pub fn new(
        category: impl Into<String>,
        target_key: impl Into<String>,
        level: Level,
        message: impl Into<String>,
        sender: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            target_key: target_key.into(),
            level,
            message: message.into(),
            sender: sender.into(),
            tags: BTreeSet::new(),
            remote_ip_address: None,
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_remote_ip_address(mut self, address: impl Into<String>) -> Self {
        self.remote_ip_address = Some(address.into());
        self
    }

    /// Caller tags plus level, category and target key
    ///
    /// The extra tags let free-text tag filters in the index also match on
    /// those fields.
    pub fn document_tags(&self) -> BTreeSet<String> {
        self.tags
            .iter()
            .map(|tag| tag.trim())
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .chain([
                self.level.to_string(),
                self.category.clone(),
                self.target_key.clone(),
            ])
            .collect()
    }
}

/// Persisted system event
///
/// `id` is assigned by the store and never written into the document source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemEventDocument {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub category: String,

    pub level: String,

    pub target_key: String,

    /// `"{message} by {sender}"`
    pub message: String,

    #[serde(default)]
    pub tags: BTreeSet<String>,

    pub sender: String,

    #[serde(
        rename = "remoteIpAddress",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub remote_ip_address: Option<String>,

    /// Start time
    pub timestamp: String,

    /// End time; equals `timestamp` until the event is ended
    pub endtime: String,
}

impl SystemEventDocument {
    /// Build the document stored for a validated request
    pub fn from_request(request: &EventRequest, timestamp: impl Into<String>) -> Self {
        let timestamp = timestamp.into();
        Self {
            id: None,
            category: request.category.clone(),
            level: request.level.to_string(),
            target_key: request.target_key.clone(),
            message: format!("{} by {}", request.message, request.sender),
            tags: request.document_tags(),
            sender: request.sender.clone(),
            remote_ip_address: request.remote_ip_address.clone(),
            endtime: timestamp.clone(),
            timestamp,
        }
    }

    pub fn is_critical(&self) -> bool {
        self.level == Level::Critical.as_str()
    }

    /// Apply a partial update in place
    pub fn apply(&mut self, partial: &PartialSystemEventDocument) {
        self.endtime = partial.endtime.clone();
    }
}

/// Partial update applied when an event ends
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialSystemEventDocument {
    pub endtime: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn request() -> EventRequest {
        EventRequest::new("deploy", "svc-a", Level::Critical, "rollout", "alice")
    }

    #[test]
    fn test_level_round_trip_strings() {
        assert_eq!(Level::Critical.to_string(), "critical");
        assert_eq!("Information".parse::<Level>().unwrap(), Level::Information);
        assert_eq!("info".parse::<Level>().unwrap(), Level::Information);
        assert!("warning".parse::<Level>().is_err());
        assert_eq!(serde_json::to_string(&Level::Critical).unwrap(), "\"critical\"");
    }

    #[test]
    fn test_document_from_request() {
        let doc = SystemEventDocument::from_request(
            &request().with_tags(["release", "deploy"]),
            "1714638600",
        );

        assert_eq!(doc.message, "rollout by alice");
        assert_eq!(doc.level, "critical");
        assert_eq!(doc.timestamp, doc.endtime);
        assert_eq!(
            doc.tags.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["critical", "deploy", "release", "svc-a"]
        );
        assert!(doc.is_critical());
        assert!(doc.id.is_none());
    }

    #[test]
    fn test_blank_caller_tags_are_dropped() {
        let tags = request().with_tags(["  ", " hotfix "]).document_tags();
        assert!(tags.contains("hotfix"));
        assert!(!tags.iter().any(|t| t.trim().is_empty()));
    }

    #[test]
    fn test_document_source_omits_id() {
        let doc = SystemEventDocument::from_request(&request(), "t0");
        let json = serde_json::to_value(&doc).unwrap();
        assert!(json.get("_id").is_none());
        assert_eq!(json["target_key"], "svc-a");
        assert!(json.get("remoteIpAddress").is_none());
    }

    #[test]
    fn test_request_json_is_camel_case() {
        let request: EventRequest = serde_json::from_value(serde_json::json!({
            "category": "deploy",
            "targetKey": "svc-a",
            "level": "information",
            "message": "rollout",
            "sender": "alice"
        }))
        .unwrap();
        assert_eq!(request.target_key, "svc-a");
        assert!(request.tags.is_empty());
    }

    #[test]
    fn test_apply_partial_only_changes_endtime() {
        let mut doc = SystemEventDocument::from_request(&request(), "t0");
        let before = doc.clone();
        doc.apply(&PartialSystemEventDocument {
            endtime: "t1".to_string(),
        });
        assert_eq!(doc.endtime, "t1");
        assert_eq!(doc.timestamp, before.timestamp);
        assert_eq!(doc.message, before.message);
        assert_eq!(doc.tags, before.tags);
    }
}
