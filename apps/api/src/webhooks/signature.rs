//! Svix signature verification for Clerk webhooks.
//!
//! The signed payload is `"{svix-id}.{svix-timestamp}.{body}"`, HMAC-SHA256 keyed by the
//! base64 part of the `whsec_...` secret. `svix-signature` holds space-separated
//! `v1,<base64>` entries; any one matching is enough.

use axum::http::HeaderMap;
use base64::{engine::general_purpose, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Maximum distance between `svix-timestamp` and the current time.
pub const TIMESTAMP_TOLERANCE_SECS: i64 = 5 * 60;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("missing {0} header")]
    MissingHeader(&'static str),

    #[error("webhook secret is not valid base64")]
    InvalidSecret,

    #[error("svix-timestamp is not a unix timestamp")]
    InvalidTimestamp,

    #[error("svix-timestamp is outside the allowed window")]
    TimestampOutOfRange,

    #[error("no matching signature")]
    NoMatch,
}

/// The three delivery headers Svix attaches to every webhook.
#[derive(Debug, Clone)]
pub struct SvixHeaders {
    pub id: String,
    pub timestamp: String,
    pub signature: String,
}

impl SvixHeaders {
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, SignatureError> {
        fn read(headers: &HeaderMap, name: &'static str) -> Result<String, SignatureError> {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .ok_or(SignatureError::MissingHeader(name))
        }

        Ok(Self {
            id: read(headers, "svix-id")?,
            timestamp: read(headers, "svix-timestamp")?,
            signature: read(headers, "svix-signature")?,
        })
    }
}

pub struct WebhookVerifier {
    key: Vec<u8>,
}

impl WebhookVerifier {
    pub fn new(secret: &str) -> Result<Self, SignatureError> {
        let secret = secret.trim();
        let encoded = secret.strip_prefix("whsec_").unwrap_or(secret);
        let key = general_purpose::STANDARD
            .decode(encoded)
            .map_err(|_| SignatureError::InvalidSecret)?;
        Ok(Self { key })
    }

    fn mac(&self, id: &str, timestamp: &str, body: &[u8]) -> Result<HmacSha256, SignatureError> {
        let mut mac =
            HmacSha256::new_from_slice(&self.key).map_err(|_| SignatureError::InvalidSecret)?;
        mac.update(id.as_bytes());
        mac.update(b".");
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(body);
        Ok(mac)
    }

    /// `now` is the current unix time in seconds.
    pub fn verify(
        &self,
        headers: &SvixHeaders,
        body: &[u8],
        now: i64,
    ) -> Result<(), SignatureError> {
        let timestamp: i64 = headers
            .timestamp
            .parse()
            .map_err(|_| SignatureError::InvalidTimestamp)?;
        if now.abs_diff(timestamp) > TIMESTAMP_TOLERANCE_SECS.unsigned_abs() {
            return Err(SignatureError::TimestampOutOfRange);
        }

        let mac = self.mac(&headers.id, &headers.timestamp, body)?;
        let matched = headers
            .signature
            .split_whitespace()
            .filter_map(|entry| entry.split_once(','))
            .filter(|(version, _)| *version == "v1")
            .filter_map(|(_, sig)| general_purpose::STANDARD.decode(sig).ok())
            .any(|sig| mac.clone().verify_slice(&sig).is_ok());

        if matched {
            Ok(())
        } else {
            Err(SignatureError::NoMatch)
        }
    }

    /// Produces a `v1,<base64>` entry the way Svix does.
    #[cfg(test)]
    pub fn sign(&self, id: &str, timestamp: &str, body: &[u8]) -> String {
        let mac = self.mac(id, timestamp, body).unwrap();
        format!(
            "v1,{}",
            general_purpose::STANDARD.encode(mac.finalize().into_bytes())
        )
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    const SECRET: &str = "whsec_dGVzdC13ZWJob29rLXNlY3JldA==";
    const BODY: &[u8] = br#"{"a":1}"#;
    const TS: i64 = 1_700_000_000;

    fn headers(signature: &str) -> SvixHeaders {
        SvixHeaders {
            id: "msg_1".to_string(),
            timestamp: TS.to_string(),
            signature: signature.to_string(),
        }
    }

    #[test]
    fn test_known_signature_verifies() {
        let verifier = WebhookVerifier::new(SECRET).unwrap();
        let sig = "v1,qJY6p6TEsYa0Ac5dwvspE1O7y3gDg4cjLqvK1Cvtn8E=";

        assert_eq!(verifier.sign("msg_1", &TS.to_string(), BODY), sig);
        assert_eq!(verifier.verify(&headers(sig), BODY, TS), Ok(()));
    }

    #[test]
    fn test_any_matching_entry_is_accepted() {
        let verifier = WebhookVerifier::new(SECRET).unwrap();
        let sig = "v1,bm9wZQ== v2,ignored v1,qJY6p6TEsYa0Ac5dwvspE1O7y3gDg4cjLqvK1Cvtn8E=";

        assert_eq!(verifier.verify(&headers(sig), BODY, TS + 10), Ok(()));
    }

    #[test]
    fn test_tampered_body_fails() {
        let verifier = WebhookVerifier::new(SECRET).unwrap();
        let sig = verifier.sign("msg_1", &TS.to_string(), BODY);

        assert_eq!(
            verifier.verify(&headers(&sig), br#"{"a":2}"#, TS),
            Err(SignatureError::NoMatch)
        );
    }

    #[test]
    fn test_stale_timestamp_is_rejected() {
        let verifier = WebhookVerifier::new(SECRET).unwrap();
        let sig = verifier.sign("msg_1", &TS.to_string(), BODY);

        assert_eq!(
            verifier.verify(&headers(&sig), BODY, TS + TIMESTAMP_TOLERANCE_SECS + 1),
            Err(SignatureError::TimestampOutOfRange)
        );
        assert_eq!(
            verifier.verify(&headers(&sig), BODY, TS - TIMESTAMP_TOLERANCE_SECS - 1),
            Err(SignatureError::TimestampOutOfRange)
        );

        let mut bad = headers(&sig);
        bad.timestamp = "yesterday".to_string();
        assert_eq!(
            verifier.verify(&bad, BODY, TS),
            Err(SignatureError::InvalidTimestamp)
        );
    }

    #[test]
    fn test_extreme_timestamps_are_out_of_range() {
        let verifier = WebhookVerifier::new(SECRET).unwrap();

        for timestamp in [i64::MIN, i64::MAX] {
            let mut extreme = headers("v1,bm9wZQ==");
            extreme.timestamp = timestamp.to_string();
            assert_eq!(
                verifier.verify(&extreme, BODY, TS),
                Err(SignatureError::TimestampOutOfRange)
            );
        }

        let mut at_min = headers("v1,bm9wZQ==");
        at_min.timestamp = TS.to_string();
        assert_eq!(
            verifier.verify(&at_min, BODY, i64::MIN),
            Err(SignatureError::TimestampOutOfRange)
        );
    }

    #[test]
    fn test_secret_without_prefix_and_invalid_secret() {
        assert!(WebhookVerifier::new("dGVzdC13ZWJob29rLXNlY3JldA==").is_ok());
        assert!(matches!(
            WebhookVerifier::new("whsec_***"),
            Err(SignatureError::InvalidSecret)
        ));
    }

    #[test]
    fn test_missing_headers_are_named() {
        let mut map = HeaderMap::new();
        map.insert("svix-id", HeaderValue::from_static("msg_1"));
        map.insert("svix-timestamp", HeaderValue::from_static("1700000000"));

        assert!(matches!(
            SvixHeaders::from_headers(&map),
            Err(SignatureError::MissingHeader("svix-signature"))
        ));

        map.insert("svix-signature", HeaderValue::from_static("v1,abc"));
        let parsed = SvixHeaders::from_headers(&map).unwrap();
        assert_eq!(parsed.id, "msg_1");
    }
}
