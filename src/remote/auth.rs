//! EdgeGrid `EG1-HMAC-SHA256` request signing.
//!
//! ```text
//! signing_key = base64(HMAC(client_secret, timestamp))
//! signature   = base64(HMAC(signing_key, METHOD \t scheme \t host \t path?query \t "" \t content_hash \t auth_prefix))
//! ```
//!
//! Only `POST` bodies are hashed, truncated to `max_body` bytes. No headers
//! take part in the signature.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::Url;
use sha2::{Digest, Sha256};

use super::edgerc::EdgercSection;

/// Signature algorithm tag.
pub const ALGORITHM: &str = "EG1-HMAC-SHA256";

/// `chrono` format of the request timestamp.
const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H:%M:%S+0000";

/// Signs requests with one set of client credentials.
#[derive(Clone)]
pub struct EdgeGridSigner {
    client_token: String,
    client_secret: String,
    access_token: String,
    max_body: usize,
}

impl EdgeGridSigner {
    /// Create a signer from a credentials section.
    pub fn new(section: &EdgercSection) -> Self {
        Self {
            client_token: section.client_token.clone(),
            client_secret: section.client_secret.clone(),
            access_token: section.access_token.clone(),
            max_body: section.max_body,
        }
    }

    /// `Authorization` header for a request sent now.
    pub fn sign(&self, method: &str, url: &Url, body: &[u8]) -> String {
        let timestamp = format_timestamp(Utc::now());
        let nonce = uuid::Uuid::new_v4().to_string();
        self.sign_with(method, url, body, &timestamp, &nonce)
    }

    /// `Authorization` header for a fixed timestamp and nonce.
    pub fn sign_with(&self, method: &str, url: &Url, body: &[u8], timestamp: &str, nonce: &str) -> String {
        let prefix = format!(
            "{} client_token={};access_token={};timestamp={};nonce={};",
            ALGORITHM, self.client_token, self.access_token, timestamp, nonce
        );

        let mut relative = url.path().to_string();
        if let Some(query) = url.query() {
            relative.push('?');
            relative.push_str(query);
        }
        let host = url.host_str().unwrap_or_default().to_lowercase();
        let method = method.to_uppercase();
        let content_hash = self.content_hash(&method, body);

        let data = [
            method.as_str(),
            url.scheme(),
            host.as_str(),
            relative.as_str(),
            "",
            content_hash.as_str(),
            prefix.as_str(),
        ]
        .join("\t");

        let signing_key = base64_hmac(self.client_secret.as_bytes(), timestamp.as_bytes());
        let signature = base64_hmac(signing_key.as_bytes(), data.as_bytes());
        format!("{}signature={}", prefix, signature)
    }

    fn content_hash(&self, method: &str, body: &[u8]) -> String {
        if method != "POST" || body.is_empty() {
            return String::new();
        }
        let covered = &body[..body.len().min(self.max_body)];
        STANDARD.encode(Sha256::digest(covered))
    }
}

impl std::fmt::Debug for EdgeGridSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EdgeGridSigner")
            .field("max_body", &self.max_body)
            .finish_non_exhaustive()
    }
}

/// Timestamp in the form the signature expects.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

fn base64_hmac(key: &[u8], message: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(key)
        .expect("HMAC accepts any key size");
    mac.update(message);
    STANDARD.encode(mac.finalize().into_bytes())
}
