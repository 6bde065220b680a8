// Copyright (c) 2025 - Cowboy AI, Inc.
//! Request validation
//!
//! Pure checks run before anything touches the store:
//!
//! 1. category, target key, message and sender are non-blank
//! 2. the request is trimmed in place
//! 3. the category policy admits the category, and its fixed level if any
//!
//! Error `Display` strings are the user-facing rejection reasons.

use thiserror::Error;

use crate::model::{EventRequest, Level};
use crate::policy::CategoryPolicy;

/// Where rejected callers are pointed for the list of categories
pub const CATEGORY_LISTING_HINT: &str =
    "Check /category/all for a list of allowed categories or contact your system administrator.";

/// Reasons a request is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} can not be null or whitespace")]
    EmptyField(&'static str),

    #[error("The provided category `{0}` is not allowed. {hint}", hint = CATEGORY_LISTING_HINT)]
    CategoryNotAllowed(String),

    #[error(
        "Only events of level `{required}` are allowed for category `{category}`. {hint}",
        hint = CATEGORY_LISTING_HINT
    )]
    LevelMismatch { category: String, required: Level },

    #[error("The event id can not be null or whitespace")]
    EmptyEventId,
}

pub type ValidationResult = Result<(), ValidationError>;

/// Validate and normalize a request against an optional policy
pub fn validate_request(request: &mut EventRequest, policy: &CategoryPolicy) -> ValidationResult {
    require_non_blank("Category", &request.category)?;
    require_non_blank("TargetKey", &request.target_key)?;
    require_non_blank("Message", &request.message)?;
    require_non_blank("Sender", &request.sender)?;

    trim_in_place(&mut request.category);
    trim_in_place(&mut request.target_key);
    trim_in_place(&mut request.message);
    trim_in_place(&mut request.sender);

    policy.check(&request.category, request.level)
}

fn require_non_blank(field: &'static str, value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(())
}

fn trim_in_place(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
}
