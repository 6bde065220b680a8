// Copyright (c) 2025 - Cowboy AI, Inc.
//! Document timestamp rendering
//!
//! Stored documents carry their start and end instants as strings whose
//! shape must match the `date` mapping of the target index. Three shapes are
//! supported:
//!
//! - `epoch_second` - seconds since the Unix epoch
//! - `epoch_millis` - milliseconds since the Unix epoch
//! - any chrono strftime pattern, e.g. `%Y-%m-%dT%H:%M:%S%.3fZ`
//!
//! A pattern chrono cannot render falls back to epoch seconds.

use std::fmt::{self, Write};
use std::sync::Arc;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::warn;

use crate::clock::{Clock, SystemClock};

/// Pattern used when no datetime format is configured
pub const DEFAULT_PATTERN: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Configured rendering for document timestamps
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimestampFormat {
    EpochSecond,
    EpochMillis,
    Pattern(String),
}

impl TimestampFormat {
    /// Interpret a configuration value
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "epoch_second" => TimestampFormat::EpochSecond,
            "epoch_millis" => TimestampFormat::EpochMillis,
            pattern => TimestampFormat::Pattern(pattern.to_string()),
        }
    }
}

impl Default for TimestampFormat {
    fn default() -> Self {
        TimestampFormat::Pattern(DEFAULT_PATTERN.to_string())
    }
}

impl fmt::Display for TimestampFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimestampFormat::EpochSecond => f.write_str("epoch_second"),
            TimestampFormat::EpochMillis => f.write_str("epoch_millis"),
            TimestampFormat::Pattern(pattern) => f.write_str(pattern),
        }
    }
}

impl Serialize for TimestampFormat {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimestampFormat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(TimestampFormat::parse(&value))
    }
}

/// Produces document-level timestamps
#[derive(Clone)]
pub struct TimestampProvider {
    format: TimestampFormat,
    clock: Arc<dyn Clock>,
}

impl TimestampProvider {
    pub fn new(format: TimestampFormat, clock: Arc<dyn Clock>) -> Self {
        Self { format, clock }
    }

    /// Provider backed by the wall clock
    pub fn system(format: TimestampFormat) -> Self {
        Self::new(format, Arc::new(SystemClock))
    }

    pub fn format(&self) -> &TimestampFormat {
        &self.format
    }

    /// Render the current instant
    pub fn timestamp(&self) -> String {
        let now = self.clock.now();
        match &self.format {
            TimestampFormat::EpochSecond => now.timestamp().to_string(),
            TimestampFormat::EpochMillis => now.timestamp_millis().to_string(),
            TimestampFormat::Pattern(pattern) => render_pattern(now, pattern).unwrap_or_else(|| {
                warn!("Unusable timestamp pattern `{}`, using epoch seconds", pattern);
                now.timestamp().to_string()
            }),
        }
    }
}

impl fmt::Debug for TimestampProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimestampProvider")
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

fn render_pattern(instant: DateTime<Utc>, pattern: &str) -> Option<String> {
    if pattern.is_empty() {
        return None;
    }

    let items = StrftimeItems::new(pattern);
    if items.clone().any(|item| matches!(item, Item::Error)) {
        return None;
    }

    let mut rendered = String::new();
    write!(rendered, "{}", instant.format_with_items(items)).ok()?;
    Some(rendered)
}
