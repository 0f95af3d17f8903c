//! `.edgerc` credential files.
//!
//! INI layout: `[section]` headers followed by `key = value` lines. Keys are
//! case-insensitive; `#` and `;` start comment lines.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Body bytes covered by the content hash when the file does not say.
pub const DEFAULT_MAX_BODY: usize = 131_072;

/// Error type for credential loading.
#[derive(Debug, thiserror::Error)]
pub enum EdgercError {
    /// File could not be read.
    #[error("Failed to read {path}: {source}")]
    Read {
        /// File path.
        path: PathBuf,
        /// Cause.
        #[source]
        source: std::io::Error,
    },
    /// Line is neither a header, a comment nor a key/value pair.
    #[error("Malformed line {line}: {text:?}")]
    Malformed {
        /// 1-based line number.
        line: usize,
        /// Line text.
        text: String,
    },
    /// Section is absent.
    #[error("Section [{0}] not found")]
    MissingSection(String),
    /// Required key is absent from the section.
    #[error("Section [{section}] has no {key}")]
    MissingKey {
        /// Section name.
        section: String,
        /// Key name.
        key: String,
    },
    /// A numeric key holds something else.
    #[error("Section [{section}] has invalid {key}: {value:?}")]
    InvalidValue {
        /// Section name.
        section: String,
        /// Key name.
        key: String,
        /// Raw value.
        value: String,
    },
}

/// Credentials of one section.
#[derive(Clone, PartialEq, Eq)]
pub struct EdgercSection {
    /// API host (without scheme).
    pub host: String,
    /// Client token.
    pub client_token: String,
    /// Client secret.
    pub client_secret: String,
    /// Access token.
    pub access_token: String,
    /// Request body bytes covered by the content hash.
    pub max_body: usize,
    /// Account switch key bound to these credentials.
    pub account_key: Option<String>,
}

impl std::fmt::Debug for EdgercSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EdgercSection")
            .field("host", &self.host)
            .field("client_token", &"<redacted>")
            .field("client_secret", &"<redacted>")
            .field("access_token", &"<redacted>")
            .field("max_body", &self.max_body)
            .field("account_key", &self.account_key)
            .finish()
    }
}

/// A parsed credential file.
#[derive(Clone, Default)]
pub struct Edgerc {
    sections: HashMap<String, HashMap<String, String>>,
}

impl Edgerc {
    /// Read and parse a file.
    pub fn load(path: &Path) -> Result<Self, EdgercError> {
        let text = std::fs::read_to_string(path).map_err(|source| EdgercError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Parse file contents.
    pub fn parse(text: &str) -> Result<Self, EdgercError> {
        let mut sections: HashMap<String, HashMap<String, String>> = HashMap::new();
        let mut current: Option<String> = None;

        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            let malformed = || EdgercError::Malformed {
                line: index + 1,
                text: raw.to_string(),
            };

            if let Some(header) = line.strip_prefix('[') {
                let name = header.strip_suffix(']').ok_or_else(malformed)?.trim();
                sections.entry(name.to_string()).or_default();
                current = Some(name.to_string());
                continue;
            }

            let split = line.find(|c: char| c == '=' || c == ':').ok_or_else(malformed)?;
            let section = current.as_ref().ok_or_else(malformed)?;
            let key = line[..split].trim().to_lowercase();
            let value = line[split + 1..].trim().to_string();
            sections.entry(section.clone()).or_default().insert(key, value);
        }

        Ok(Self { sections })
    }

    /// Names of all sections.
    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    /// Extract the credentials of `name`.
    pub fn section(&self, name: &str) -> Result<EdgercSection, EdgercError> {
        let entries = self
            .sections
            .get(name)
            .ok_or_else(|| EdgercError::MissingSection(name.to_string()))?;

        let required = |key: &str| {
            entries
                .get(key)
                .filter(|v| !v.is_empty())
                .cloned()
                .ok_or_else(|| EdgercError::MissingKey {
                    section: name.to_string(),
                    key: key.to_string(),
                })
        };

        let max_body = match entries.get("max_body").or_else(|| entries.get("max-body")) {
            Some(raw) => raw.parse().map_err(|_| EdgercError::InvalidValue {
                section: name.to_string(),
                key: "max_body".to_string(),
                value: raw.clone(),
            })?,
            None => DEFAULT_MAX_BODY,
        };

        let host = required("host")?;
        let host = host
            .trim_start_matches("https://")
            .trim_end_matches('/')
            .to_string();

        Ok(EdgercSection {
            host,
            client_token: required("client_token")?,
            client_secret: required("client_secret")?,
            access_token: required("access_token")?,
            max_body,
            account_key: entries.get("account_key").filter(|v| !v.is_empty()).cloned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
; credentials
[default]
client_secret = c2VjcmV0
host = akab-xxxx.luna.akamaiapis.net/
access_token = akab-access
client_token = akab-client

[other]
HOST: https://akab-yyyy.luna.akamaiapis.net
client_secret=s
access_token=a
client_token=c
max-body = 2048
account_key = 1-ABCDE
";

    #[test]
    fn test_parse_default_section() {
        let rc = Edgerc::parse(SAMPLE).unwrap();
        let section = rc.section("default").unwrap();
        assert_eq!(section.host, "akab-xxxx.luna.akamaiapis.net");
        assert_eq!(section.client_secret, "c2VjcmV0");
        assert_eq!(section.max_body, DEFAULT_MAX_BODY);
        assert_eq!(section.account_key, None);
    }

    #[test]
    fn test_keys_are_case_insensitive_and_scheme_is_stripped() {
        let rc = Edgerc::parse(SAMPLE).unwrap();
        let section = rc.section("other").unwrap();
        assert_eq!(section.host, "akab-yyyy.luna.akamaiapis.net");
        assert_eq!(section.max_body, 2048);
        assert_eq!(section.account_key.as_deref(), Some("1-ABCDE"));
    }

    #[test]
    fn test_missing_section_and_key() {
        let rc = Edgerc::parse("[a]\nhost = h\n").unwrap();
        assert!(matches!(rc.section("b"), Err(EdgercError::MissingSection(_))));
        assert!(matches!(rc.section("a"), Err(EdgercError::MissingKey { .. })));
    }

    #[test]
    fn test_malformed_lines() {
        assert!(matches!(Edgerc::parse("host = h\n"), Err(EdgercError::Malformed { line: 1, .. })));
        assert!(matches!(Edgerc::parse("[a\n"), Err(EdgercError::Malformed { .. })));
        assert!(matches!(Edgerc::parse("[a]\njunk\n"), Err(EdgercError::Malformed { line: 2, .. })));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let rc = Edgerc::parse(SAMPLE).unwrap();
        let debug = format!("{:?}", rc.section("default").unwrap());
        assert!(!debug.contains("c2VjcmV0"));
    }
}
