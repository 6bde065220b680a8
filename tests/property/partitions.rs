// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for daily partition naming

use std::sync::Arc;

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use proptest::prelude::*;

use system_events::clock::FixedClock;
use system_events::index::{IndexNameResolver, IndexSettings};

fn settings() -> IndexSettings {
    IndexSettings {
        default_index: None,
        pattern_prefix: Some("evt-".to_string()),
        pattern_suffix_format: Some("YYYY.mm.DD".to_string()),
    }
}

proptest! {
    /// The previous partition is always the one for the prior UTC day
    #[test]
    fn prop_previous_is_prior_day(days in 0i64..20_000, seconds in 0u32..86_400) {
        let date = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap() + Duration::days(days);
        let instant = Utc.from_utc_datetime(
            &date.and_hms_opt(seconds / 3600, (seconds / 60) % 60, seconds % 60).unwrap(),
        );
        let resolver = IndexNameResolver::new(&settings(), Arc::new(FixedClock(instant))).unwrap();

        let yesterday = date.pred_opt().unwrap();
        prop_assert_eq!(
            resolver.current_index_name(),
            format!("evt-{}", date.format("%Y.%m.%d"))
        );
        prop_assert_eq!(
            resolver.previous_index_name(),
            format!("evt-{}", yesterday.format("%Y.%m.%d"))
        );
    }
}
