// Copyright (c) 2025 - Cowboy AI, Inc.
//! AWS Signature Version 4 request signing
//!
//! Only what the SNS query API needs: a single request with a fully known
//! body, signed in the `Authorization` header.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::errors::{NotifyError, NotifyResult};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Request pieces covered by the signature
#[derive(Debug, Clone)]
pub struct CanonicalRequest<'a> {
    pub method: &'a str,
    pub path: &'a str,
    pub query: &'a str,
    /// Lower-cased names; `host` and `x-amz-date` must be present
    pub headers: Vec<(String, String)>,
    pub payload: &'a [u8],
}

impl CanonicalRequest<'_> {
    fn sorted_headers(&self) -> Vec<(String, String)> {
        let mut headers: Vec<(String, String)> = self
            .headers
            .iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value.trim().to_string()))
            .collect();
        headers.sort_by(|a, b| a.0.cmp(&b.0));
        headers
    }

    pub fn signed_headers(&self) -> String {
        self.sorted_headers()
            .into_iter()
            .map(|(name, _)| name)
            .collect::<Vec<_>>()
            .join(";")
    }

    pub fn render(&self) -> String {
        let headers = self.sorted_headers();
        let mut canonical_headers = String::new();
        for (name, value) in &headers {
            canonical_headers.push_str(name);
            canonical_headers.push(':');
            canonical_headers.push_str(value);
            canonical_headers.push('\n');
        }

        format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            self.method,
            self.path,
            self.query,
            canonical_headers,
            self.signed_headers(),
            sha256_hex(self.payload)
        )
    }
}

/// Signs requests for one service in one region
#[derive(Clone)]
pub struct SigV4Signer {
    access_key_id: String,
    secret_access_key: String,
    region: String,
    service: String,
}

impl SigV4Signer {
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
        service: impl Into<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            region: region.into(),
            service: service.into(),
        }
    }

    pub fn credential_scope(&self, at: DateTime<Utc>) -> String {
        format!(
            "{}/{}/{}/aws4_request",
            at.format("%Y%m%d"),
            self.region,
            self.service
        )
    }

    /// Value for the `Authorization` header
    pub fn authorization(
        &self,
        request: &CanonicalRequest<'_>,
        at: DateTime<Utc>,
    ) -> NotifyResult<String> {
        let scope = self.credential_scope(at);
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM,
            amz_date(at),
            scope,
            sha256_hex(request.render().as_bytes())
        );

        let key = self.signing_key(at)?;
        let signature = hex::encode(hmac(&key, string_to_sign.as_bytes())?);

        Ok(format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            ALGORITHM,
            self.access_key_id,
            scope,
            request.signed_headers(),
            signature
        ))
    }

    fn signing_key(&self, at: DateTime<Utc>) -> NotifyResult<Vec<u8>> {
        let secret = format!("AWS4{}", self.secret_access_key);
        let date = hmac(secret.as_bytes(), at.format("%Y%m%d").to_string().as_bytes())?;
        let region = hmac(&date, self.region.as_bytes())?;
        let service = hmac(&region, self.service.as_bytes())?;
        hmac(&service, b"aws4_request")
    }
}

impl std::fmt::Debug for SigV4Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigV4Signer")
            .field("access_key_id", &self.access_key_id)
            .field("region", &self.region)
            .field("service", &self.service)
            .finish_non_exhaustive()
    }
}

/// `x-amz-date` header value
pub fn amz_date(at: DateTime<Utc>) -> String {
    at.format("%Y%m%dT%H%M%SZ").to_string()
}

pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn hmac(key: &[u8], data: &[u8]) -> NotifyResult<Vec<u8>> {
    let mut mac =
        HmacSha256::new_from_slice(key).map_err(|e| NotifyError::Signing(e.to_string()))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}
