//! Property API access (feature `remote`).
//!
//! ## Architecture
//!
//! ```text
//! RemoteConfig → Edgerc section → EdgeGridSigner
//!                                      ↓
//!                     PapiClient (blocking HTTP) → SchemaIndex / RuleTree / hostnames
//! ```
//!
//! Every request is signed individually; nothing is retried.

pub mod auth;
pub mod client;
pub mod config;
pub mod edgerc;

pub use auth::EdgeGridSigner;
pub use client::{PapiClient, Product, PropertyVersion, VersionSelector};
pub use config::RemoteConfig;
pub use edgerc::{Edgerc, EdgercError, EdgercSection};

/// Error type for remote operations.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// The service answered with a non-success status.
    #[error("Endpoint {endpoint} said: {status} {reason}\n{body}")]
    RemoteService {
        /// Request path.
        endpoint: String,
        /// HTTP status code.
        status: u16,
        /// Status reason phrase.
        reason: String,
        /// Response body.
        body: String,
    },
    /// No version of the property exists.
    #[error("Property not found: {property}")]
    NotFound {
        /// Property name searched for.
        property: String,
    },
    /// Transport failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// Credentials could not be loaded.
    #[error("Credentials error: {0}")]
    Edgerc(#[from] EdgercError),
    /// A response body did not have the expected shape.
    #[error("Unexpected response from {endpoint}: {source}")]
    Decode {
        /// Request path.
        endpoint: String,
        /// Cause.
        #[source]
        source: serde_json::Error,
    },
    /// A request URL could not be built.
    #[error("Invalid request URL {url}: {reason}")]
    InvalidUrl {
        /// Offending URL.
        url: String,
        /// Parser message.
        reason: String,
    },
}
