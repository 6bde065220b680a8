// Copyright (c) 2025 - Cowboy AI, Inc.
//! Index Name Resolution
//!
//! Events are written to a time-partitioned index. Two schemes exist:
//!
//! ```text
//! fixed:  default_index                  -> "system-events"
//! daily:  pattern_prefix + yyyy.MM.dd    -> "evt-2024.05.02"
//! ```
//!
//! The scheme is decided once when the resolver is built; a prefix with an
//! unrecognized suffix format, or no prefix and no default index, is rejected
//! at that point.
//!
//! # Known limitation
//!
//! [`IndexNameResolver::previous_index_name`] is "today minus one day". An
//! event that stays open across more than one rollover lives in a partition
//! neither name points at.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clock::{Clock, SystemClock};

/// The only suffix format with a date rendering
pub const DAILY_SUFFIX_FORMAT: &str = "yyyy.MM.dd";

const DAILY_SUFFIX_PATTERN: &str = "%Y.%m.%d";

/// Index configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexNameError {
    #[error("Default index can not be null or whitespace")]
    MissingDefaultIndex,

    #[error(
        "Found index pattern prefix `{prefix}` but no suffix could be calculated from the suffix format `{format}`"
    )]
    UnrecognizedSuffixFormat { prefix: String, format: String },
}

/// Raw index settings as read from configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSettings {
    /// Fixed index used when no pattern prefix is set
    pub default_index: Option<String>,

    /// Prefix of rolling index names
    pub pattern_prefix: Option<String>,

    /// Suffix format of rolling index names
    pub pattern_suffix_format: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum IndexScheme {
    Fixed(String),
    Daily { prefix: String },
}

/// Resolves the partition for "now" and for "the previous period"
#[derive(Clone)]
pub struct IndexNameResolver {
    scheme: IndexScheme,
    clock: Arc<dyn Clock>,
}

impl IndexNameResolver {
    /// Build a resolver, validating the settings
    pub fn new(settings: &IndexSettings, clock: Arc<dyn Clock>) -> Result<Self, IndexNameError> {
        let prefix = non_blank(settings.pattern_prefix.as_deref());

        let scheme = match prefix {
            Some(prefix) => {
                let format = non_blank(settings.pattern_suffix_format.as_deref()).unwrap_or("");
                if !format.eq_ignore_ascii_case(DAILY_SUFFIX_FORMAT) {
                    return Err(IndexNameError::UnrecognizedSuffixFormat {
                        prefix: prefix.to_string(),
                        format: format.to_string(),
                    });
                }
                IndexScheme::Daily {
                    prefix: prefix.to_string(),
                }
            }
            None => {
                let index = non_blank(settings.default_index.as_deref())
                    .ok_or(IndexNameError::MissingDefaultIndex)?;
                IndexScheme::Fixed(index.to_string())
            }
        };

        Ok(Self { scheme, clock })
    }

    /// Resolver backed by the wall clock
    pub fn system(settings: &IndexSettings) -> Result<Self, IndexNameError> {
        Self::new(settings, Arc::new(SystemClock))
    }

    /// Partition for the current UTC date
    pub fn current_index_name(&self) -> String {
        self.index_name_on(self.clock.now().date_naive())
    }

    /// Partition for the current UTC date minus one day
    pub fn previous_index_name(&self) -> String {
        let today = self.clock.now().date_naive();
        self.index_name_on(today.pred_opt().unwrap_or(today))
    }

    /// Partition for an arbitrary UTC date
    pub fn index_name_on(&self, date: NaiveDate) -> String {
        match &self.scheme {
            IndexScheme::Fixed(index) => index.clone(),
            IndexScheme::Daily { prefix } => {
                format!("{}{}", prefix, date.format(DAILY_SUFFIX_PATTERN))
            }
        }
    }
}

impl std::fmt::Debug for IndexNameResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexNameResolver")
            .field("scheme", &self.scheme)
            .finish_non_exhaustive()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
