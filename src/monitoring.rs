// Copyright (c) 2025 - Cowboy AI, Inc.
//! Client call instrumentation
//!
//! Every call to an external collaborator (document store, Slack webhook, SNS)
//! goes through [`ClientMonitor::observe`], which records:
//!
//! | metric                    | kind      | labels           |
//! |---------------------------|-----------|------------------|
//! | `client_attempt_total`    | counter   | `client`,`method`|
//! | `client_success_total`    | counter   | `client`,`method`|
//! | `client_fail_total`       | counter   | `client`,`method`|
//! | `client_duration_seconds` | histogram | `client`,`method`|
//!
//! Metrics go through the `metrics` facade; installing an exporter is left to
//! the hosting process.

use std::fmt;
use std::future::Future;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use tracing::{error, trace, warn};

pub const ATTEMPT_TOTAL: &str = "client_attempt_total";
pub const SUCCESS_TOTAL: &str = "client_success_total";
pub const FAIL_TOTAL: &str = "client_fail_total";
pub const DURATION_SECONDS: &str = "client_duration_seconds";

/// Register metric descriptions with the installed recorder
pub fn describe_client_metrics() {
    describe_counter!(
        ATTEMPT_TOTAL,
        "Total number of attempts to execute a client operation"
    );
    describe_counter!(
        SUCCESS_TOTAL,
        "Total number of successes to execute a client operation"
    );
    describe_counter!(
        FAIL_TOTAL,
        "Total number of failures to execute a client operation"
    );
    describe_histogram!(
        DURATION_SECONDS,
        Unit::Seconds,
        "Duration of client operation"
    );
}

/// Whether a completed call should count as a success
///
/// Responses that arrived but were refused by the remote side override this.
pub trait Outcome {
    fn succeeded(&self) -> bool {
        true
    }
}

impl Outcome for () {}

impl Outcome for String {}

impl<T> Outcome for Option<T> {}

/// Instrumentation decorator bound to one client name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientMonitor {
    client: &'static str,
}

impl ClientMonitor {
    pub const fn new(client: &'static str) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &'static str {
        self.client
    }

    /// Run `call`, recording attempt, outcome and latency under `method`
    pub async fn observe<T, E, F>(&self, method: &'static str, call: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        T: Outcome,
        E: fmt::Display,
    {
        let client = self.client;
        trace!("\"{}.{}\" called", client, method);
        counter!(ATTEMPT_TOTAL, "client" => client, "method" => method).increment(1);
        let started = Instant::now();

        let result = call.await;

        match &result {
            Ok(value) if value.succeeded() => {
                let elapsed = started.elapsed();
                counter!(SUCCESS_TOTAL, "client" => client, "method" => method).increment(1);
                histogram!(DURATION_SECONDS, "client" => client, "method" => method)
                    .record(elapsed.as_secs_f64());
                trace!(
                    "\"{}.{}\" completed in {} ms",
                    client,
                    method,
                    elapsed.as_millis()
                );
            }
            Ok(_) => {
                counter!(FAIL_TOTAL, "client" => client, "method" => method).increment(1);
                warn!("\"{}.{}\" was rejected by the remote side", client, method);
            }
            Err(e) => {
                counter!(FAIL_TOTAL, "client" => client, "method" => method).increment(1);
                error!("\"{}.{}\" failed: {}", client, method, e);
            }
        }

        result
    }
}
