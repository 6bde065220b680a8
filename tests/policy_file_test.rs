// Copyright (c) 2025 - Cowboy AI, Inc.
//! Category policy loaded from a YAML file on disk

use std::path::PathBuf;

use pretty_assertions::assert_eq;
use test_case::test_case;

use system_events::policy::{CategoryPolicy, REDACTED_WEBHOOK_URL};
use system_events::{ChannelType, Level};

fn policy() -> CategoryPolicy {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/policy.yaml");
    CategoryPolicy::load_from_path(path).unwrap()
}

#[test]
fn test_categories_are_listed_in_file_order() {
    let policy = policy();
    let names: Vec<&str> = policy
        .categories()
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(names, vec!["deploy", "outage", "*"]);
}

#[test_case("deploy", Level::Information, true ; "listed category")]
#[test_case("anything", Level::Critical, true ; "wildcard allows unknown category")]
#[test_case("outage", Level::Critical, true ; "fixed level matches")]
#[test_case("outage", Level::Information, false ; "fixed level mismatch")]
fn test_policy_check(category: &str, level: Level, allowed: bool) {
    assert_eq!(policy().check(category, level).is_ok(), allowed);
}

#[test]
fn test_listed_subscriptions_hide_webhooks() {
    let redacted = policy().redacted_subscriptions();

    assert_eq!(redacted.len(), 3);
    assert_eq!(redacted[0].webhook_url.as_deref(), Some(REDACTED_WEBHOOK_URL));
    assert_eq!(redacted[2].webhook_url.as_deref(), Some(REDACTED_WEBHOOK_URL));
    assert_eq!(
        redacted[1].topic_arn.as_deref(),
        Some("arn:aws:sns:eu-west-1:123456789012:outages")
    );
}

#[test]
fn test_channel_map_routes_outage_to_wildcard_then_sns() {
    let map = policy().channel_map();
    let channels: Vec<ChannelType> = map
        .subscriptions_for("outage")
        .into_iter()
        .map(|s| s.channel.clone())
        .collect();
    assert_eq!(channels, vec![ChannelType::Slack, ChannelType::Sns]);
}
