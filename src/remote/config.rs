//! Remote access configuration.
//!
//! Environment variables:
//! - `AKAMAI_EDGERC`: credential file (default: `~/.edgerc`)
//! - `AKAMAI_EDGERC_SECTION`: section to use (default: `default`)
//! - `AKAMAI_ACCOUNT_KEY`: account switch key, overriding the section's `account_key`
//! - `PAPI_TIMEOUT_SECS`: request timeout (default: 30)

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default credentials section.
pub const DEFAULT_SECTION: &str = "default";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for [`super::PapiClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    /// Credential file.
    pub edgerc: PathBuf,
    /// Section of the credential file.
    pub section: String,
    /// Account switch key; takes precedence over the section's own key.
    pub account_key: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            edgerc: default_edgerc_path(),
            section: DEFAULT_SECTION.to_string(),
            account_key: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl RemoteConfig {
    /// Create configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            edgerc: std::env::var("AKAMAI_EDGERC")
                .ok()
                .filter(|v| !v.is_empty())
                .map(|v| expand_home(Path::new(&v)))
                .unwrap_or(defaults.edgerc),
            section: std::env::var("AKAMAI_EDGERC_SECTION")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.section),
            account_key: std::env::var("AKAMAI_ACCOUNT_KEY").ok().filter(|v| !v.is_empty()),
            timeout: std::env::var("PAPI_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }

    /// Override the credential file.
    pub fn with_edgerc(mut self, path: impl AsRef<Path>) -> Self {
        self.edgerc = expand_home(path.as_ref());
        self
    }

    /// Override the section.
    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = section.into();
        self
    }

    /// Override the account switch key.
    pub fn with_account_key(mut self, key: impl Into<String>) -> Self {
        self.account_key = Some(key.into());
        self
    }
}

/// `~/.edgerc`, or `.edgerc` when there is no home directory.
pub fn default_edgerc_path() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".edgerc"))
        .unwrap_or_else(|| PathBuf::from(".edgerc"))
}

/// Expand a leading `~/`.
pub fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}
