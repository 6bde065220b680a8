// Copyright (c) 2025 - Cowboy AI, Inc.
//! Inbound Slack request verification
//!
//! Slack signs every request it sends with the app's signing secret:
//!
//! ```text
//! X-Slack-Signature = "v0=" + hex(hmac_sha256(secret, "v0:{X-Slack-Request-Timestamp}:{body}"))
//! ```
//!
//! [`SlackRequestVerifier`] recomputes the MAC and compares it in constant
//! time. An optional maximum age rejects replayed requests.

use std::sync::Arc;
use std::time::Duration;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

use crate::clock::{Clock, SystemClock};

type HmacSha256 = Hmac<Sha256>;

pub const TIMESTAMP_HEADER: &str = "X-Slack-Request-Timestamp";
pub const SIGNATURE_HEADER: &str = "X-Slack-Signature";
const VERSION: &str = "v0";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("Missing header {0}")]
    MissingHeader(&'static str),

    #[error("Malformed signature")]
    MalformedSignature,

    #[error("Invalid request timestamp `{0}`")]
    InvalidTimestamp(String),

    #[error("Request is {age_secs}s old")]
    Stale { age_secs: u64 },

    #[error("Invalid signature/token")]
    Mismatch,

    #[error("Signing secret is unusable")]
    InvalidKey,
}

/// Verifies `X-Slack-Signature` against a signing secret
#[derive(Clone)]
pub struct SlackRequestVerifier {
    secret: String,
    max_age: Option<Duration>,
    clock: Arc<dyn Clock>,
}

impl SlackRequestVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            max_age: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Reject requests whose timestamp is further than `max_age` from now
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn mac(&self, timestamp: &str, body: &[u8]) -> Result<HmacSha256, SignatureError> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|_| SignatureError::InvalidKey)?;
        mac.update(VERSION.as_bytes());
        mac.update(b":");
        mac.update(timestamp.as_bytes());
        mac.update(b":");
        mac.update(body);
        Ok(mac)
    }

    /// Signature Slack would send for this timestamp and body
    pub fn sign(&self, timestamp: &str, body: &[u8]) -> Result<String, SignatureError> {
        let digest = self.mac(timestamp, body)?.finalize().into_bytes();
        Ok(format!("{}={}", VERSION, hex::encode(digest)))
    }

    /// Check a request given its two signing headers and raw body
    pub fn verify(
        &self,
        timestamp: Option<&str>,
        signature: Option<&str>,
        body: &[u8],
    ) -> Result<(), SignatureError> {
        let timestamp = timestamp
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(SignatureError::MissingHeader(TIMESTAMP_HEADER))?;
        let signature = signature
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(SignatureError::MissingHeader(SIGNATURE_HEADER))?;

        if let Some(max_age) = self.max_age {
            let sent: i64 = timestamp
                .parse()
                .map_err(|_| SignatureError::InvalidTimestamp(timestamp.to_string()))?;
            let age_secs = self.clock.now().timestamp().abs_diff(sent);
            if age_secs > max_age.as_secs() {
                return Err(SignatureError::Stale { age_secs });
            }
        }

        let expected = signature
            .strip_prefix("v0=")
            .and_then(|digest| hex::decode(digest).ok())
            .ok_or(SignatureError::MalformedSignature)?;

        self.mac(timestamp, body)?
            .verify_slice(&expected)
            .map_err(|_| SignatureError::Mismatch)
    }
}

impl std::fmt::Debug for SlackRequestVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackRequestVerifier")
            .field("max_age", &self.max_age)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::{TimeZone, Utc};

    const SECRET: &str = "8f742231b10e8888abcd99yyyzzz85a5";
    const BODY: &[u8] = b"token=xyz&team_id=T1&command=%2Fsysevent&text=create+deploy";

    fn verifier() -> SlackRequestVerifier {
        SlackRequestVerifier::new(SECRET)
    }

    #[test]
    fn test_signed_request_verifies() {
        let signature = verifier().sign("1714638600", BODY).unwrap();
        assert!(signature.starts_with("v0="));
        assert_eq!(signature.len(), 3 + 64);
        assert_eq!(
            verifier().verify(Some("1714638600"), Some(&signature), BODY),
            Ok(())
        );
    }

    #[test]
    fn test_tampered_body_is_rejected() {
        let signature = verifier().sign("1714638600", BODY).unwrap();
        assert_eq!(
            verifier().verify(Some("1714638600"), Some(&signature), b"token=xyz"),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_other_secret_is_rejected() {
        let signature = SlackRequestVerifier::new("other").sign("1", BODY).unwrap();
        assert_eq!(
            verifier().verify(Some("1"), Some(&signature), BODY),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_missing_and_malformed_headers() {
        assert_eq!(
            verifier().verify(None, Some("v0=00"), BODY),
            Err(SignatureError::MissingHeader(TIMESTAMP_HEADER))
        );
        assert_eq!(
            verifier().verify(Some("1"), Some(" "), BODY),
            Err(SignatureError::MissingHeader(SIGNATURE_HEADER))
        );
        assert_eq!(
            verifier().verify(Some("1"), Some("v1=abcd"), BODY),
            Err(SignatureError::MalformedSignature)
        );
        assert_eq!(
            verifier().verify(Some("1"), Some("v0=not-hex"), BODY),
            Err(SignatureError::MalformedSignature)
        );
    }

    #[test]
    fn test_max_age() {
        let now = Utc.with_ymd_and_hms(2024, 5, 2, 8, 30, 0).unwrap();
        let verifier = verifier()
            .with_max_age(Duration::from_secs(300))
            .with_clock(Arc::new(FixedClock(now)));

        let fresh = (now.timestamp() - 60).to_string();
        let signature = verifier.sign(&fresh, BODY).unwrap();
        assert_eq!(verifier.verify(Some(&fresh), Some(&signature), BODY), Ok(()));

        let stale = (now.timestamp() - 600).to_string();
        let signature = verifier.sign(&stale, BODY).unwrap();
        assert_eq!(
            verifier.verify(Some(&stale), Some(&signature), BODY),
            Err(SignatureError::Stale { age_secs: 600 })
        );

        assert!(matches!(
            verifier.verify(Some("yesterday"), Some(&signature), BODY),
            Err(SignatureError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn test_extreme_timestamps_are_stale() {
        let now = Utc.with_ymd_and_hms(2024, 5, 2, 8, 30, 0).unwrap();
        let verifier = verifier()
            .with_max_age(Duration::from_secs(300))
            .with_clock(Arc::new(FixedClock(now)));

        for sent in [i64::MIN, i64::MAX] {
            let sent = sent.to_string();
            assert!(matches!(
                verifier.verify(Some(&sent), Some("v0=00"), BODY),
                Err(SignatureError::Stale { .. })
            ));
        }
    }
}
