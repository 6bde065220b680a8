// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for request validation and document tagging

use proptest::prelude::*;

use system_events::policy::{Category, CategoryPolicy};
use system_events::validation::{validate_request, ValidationError};
use system_events::{EventRequest, Level, SystemEventDocument};

// ============================================================================
// Strategies
// ============================================================================

fn word() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,11}"
}

fn padding() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["", " ", "  ", "\t", " \n"]).prop_map(str::to_string)
}

fn padded(value: impl Strategy<Value = String>) -> impl Strategy<Value = String> {
    (padding(), value, padding()).prop_map(|(left, v, right)| format!("{}{}{}", left, v, right))
}

fn level() -> impl Strategy<Value = Level> {
    prop_oneof![Just(Level::Information), Just(Level::Critical)]
}

fn request() -> impl Strategy<Value = EventRequest> {
    (
        padded(word()),
        padded(word()),
        level(),
        padded(word()),
        padded(word()),
        prop::collection::vec(word(), 0..4),
    )
        .prop_map(|(category, target, level, message, sender, tags)| {
            EventRequest::new(category, target, level, message, sender).with_tags(tags)
        })
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// Non-blank requests pass an unrestricted policy and come out trimmed
    #[test]
    fn prop_valid_requests_are_trimmed_and_accepted(mut request in request()) {
        let original = request.clone();
        prop_assert!(validate_request(&mut request, &CategoryPolicy::unrestricted()).is_ok());

        prop_assert_eq!(&request.category, original.category.trim());
        prop_assert_eq!(&request.target_key, original.target_key.trim());
        prop_assert_eq!(&request.message, original.message.trim());
        prop_assert_eq!(&request.sender, original.sender.trim());
    }

    /// A category listed in the policy is accepted
    #[test]
    fn prop_listed_category_is_accepted(mut request in request()) {
        let policy = CategoryPolicy {
            categories: Some(vec![Category::new(request.category.trim())]),
            subscriptions: None,
        };
        prop_assert!(validate_request(&mut request, &policy).is_ok());
    }

    /// A wildcard entry accepts any category
    #[test]
    fn prop_wildcard_accepts_any_category(mut request in request(), other in word()) {
        let policy = CategoryPolicy {
            categories: Some(vec![Category::new("*"), Category::new(format!("{}-x", other))]),
            subscriptions: None,
        };
        prop_assert!(validate_request(&mut request, &policy).is_ok());
    }

    /// Fixed-level categories reject every other level
    #[test]
    fn prop_fixed_level_mismatch_is_rejected(mut request in request(), fixed in level()) {
        let policy = CategoryPolicy {
            categories: Some(vec![Category::new(request.category.trim()).with_level(fixed)]),
            subscriptions: None,
        };
        let result = validate_request(&mut request, &policy);

        if request.level == fixed {
            prop_assert!(result.is_ok());
        } else {
            let is_mismatch = matches!(result, Err(ValidationError::LevelMismatch { .. }));
            prop_assert!(is_mismatch);
        }
    }

    /// Blank required fields are always rejected
    #[test]
    fn prop_blank_field_is_rejected(mut request in request(), field in 0usize..4, blank in padding()) {
        match field {
            0 => request.category = blank,
            1 => request.target_key = blank,
            2 => request.message = blank,
            _ => request.sender = blank,
        }
        let is_empty_field = matches!(
            validate_request(&mut request, &CategoryPolicy::unrestricted()),
            Err(ValidationError::EmptyField(_))
        );
        prop_assert!(is_empty_field);
    }

    /// Stored tags always carry level, category and target, without duplicates
    #[test]
    fn prop_document_tags_include_derived_tags(mut request in request()) {
        validate_request(&mut request, &CategoryPolicy::unrestricted()).unwrap();
        let document = SystemEventDocument::from_request(&request, "t0");

        prop_assert!(document.tags.contains(request.level.as_str()));
        prop_assert!(document.tags.contains(&request.category));
        prop_assert!(document.tags.contains(&request.target_key));
        for tag in &request.tags {
            prop_assert!(document.tags.contains(tag.trim()));
        }
        prop_assert_eq!(document.message, format!("{} by {}", request.message, request.sender));
    }
}
