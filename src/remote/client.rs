//! Blocking property API client.

use std::str::FromStr;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::schema::SchemaIndex;
use crate::types::{Mapping, RuleTree};
use super::auth::EdgeGridSigner;
use super::config::RemoteConfig;
use super::edgerc::{Edgerc, EdgercSection};
use super::RemoteError;

/// Rule format accepted by the service as "newest".
pub const LATEST: &str = "latest";

/// A product available on a contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Product identifier, e.g. `prd_Fresca`.
    pub product_id: String,
    /// Display name.
    pub product_name: String,
}

/// One search hit of a property version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyVersion {
    /// Property identifier.
    pub property_id: String,
    /// Version number.
    pub property_version: u64,
    /// Property name.
    #[serde(default)]
    pub property_name: Option<String>,
    /// Owning contract.
    #[serde(default)]
    pub contract_id: Option<String>,
    /// Owning group.
    #[serde(default)]
    pub group_id: Option<String>,
}

/// Which version of a property to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VersionSelector {
    /// Highest existing version.
    #[default]
    Latest,
    /// A specific version.
    Number(u64),
}

impl FromStr for VersionSelector {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == LATEST {
            Ok(Self::Latest)
        } else {
            s.parse().map(Self::Number)
        }
    }
}

impl VersionSelector {
    /// Pick a version from the search hits. `None` when there are no hits.
    ///
    /// The search only reports active and latest versions, so a requested
    /// number that is not among the hits is taken at face value against the
    /// property of the first hit.
    pub fn select(&self, versions: &[PropertyVersion]) -> Option<PropertyVersion> {
        match self {
            Self::Latest => versions.iter().max_by_key(|v| v.property_version).cloned(),
            Self::Number(n) => versions
                .iter()
                .find(|v| v.property_version == *n)
                .or_else(|| versions.first())
                .map(|hit| PropertyVersion {
                    property_version: *n,
                    ..hit.clone()
                }),
        }
    }
}

/// Signed, blocking client for `/papi/v1`.
#[derive(Debug, Clone)]
pub struct PapiClient {
    http: Client,
    base: Url,
    signer: EdgeGridSigner,
    account_key: Option<String>,
}

impl PapiClient {
    /// Create a client for one credentials section.
    pub fn new(
        section: &EdgercSection,
        account_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, RemoteError> {
        let base_url = format!("https://{}/", section.host);
        let base = Url::parse(&base_url).map_err(|e| RemoteError::InvalidUrl {
            url: base_url.clone(),
            reason: e.to_string(),
        })?;
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base,
            signer: EdgeGridSigner::new(section),
            account_key: account_key.or_else(|| section.account_key.clone()),
        })
    }

    /// Create a client from [`RemoteConfig`].
    pub fn from_config(config: &RemoteConfig) -> Result<Self, RemoteError> {
        let section = Edgerc::load(&config.edgerc)?.section(&config.section)?;
        info!(host = %section.host, section = %config.section, "loaded credentials");
        Self::new(&section, config.account_key.clone(), config.timeout)
    }

    /// Absolute URL of an endpoint, with the account switch key appended.
    pub fn url(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, RemoteError> {
        let mut url = self.base.join(path).map_err(|e| RemoteError::InvalidUrl {
            url: path.to_string(),
            reason: e.to_string(),
        })?;
        let switch_key = self.account_key.as_deref().map(|key| ("accountSwitchKey", key));
        let pairs: Vec<(&str, &str)> = params.iter().copied().chain(switch_key).collect();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        Ok(url)
    }

    fn send(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, &str)],
        body: Option<&Value>,
        accept: Option<&str>,
    ) -> Result<Value, RemoteError> {
        let url = self.url(path, params)?;
        let payload = match body {
            Some(value) => serde_json::to_vec(value).map_err(|source| RemoteError::Decode {
                endpoint: path.to_string(),
                source,
            })?,
            None => Vec::new(),
        };

        let authorization = self.signer.sign(method.as_str(), &url, &payload);
        let mut request = self
            .http
            .request(method.clone(), url)
            .header(AUTHORIZATION, authorization)
            .header(ACCEPT, accept.unwrap_or("application/json"));
        if body.is_some() {
            request = request.header(CONTENT_TYPE, "application/json").body(payload);
        }

        debug!(method = %method, endpoint = path, "sending request");
        let response = request.send()?;
        let status = response.status();
        let text = check_status(path, status, response.text()?)?;

        serde_json::from_str(&text).map_err(|source| RemoteError::Decode {
            endpoint: path.to_string(),
            source,
        })
    }

    /// Products available on a contract.
    pub fn products(&self, contract_id: &str) -> Result<Vec<Product>, RemoteError> {
        let path = "/papi/v1/products";
        let response = self.send(Method::GET, path, &[("contractId", contract_id)], None, None)?;
        extract(path, &response, "/products/items")
    }

    /// Rule format catalog of a product.
    pub fn rule_format(&self, product_id: &str, rule_format: &str) -> Result<SchemaIndex, RemoteError> {
        let path = format!("/papi/v1/schemas/products/{}/{}", product_id, rule_format);
        let document = self.send(Method::GET, &path, &[], None, None)?;
        Ok(SchemaIndex::new(document, product_id, rule_format))
    }

    /// Every version of the named property.
    pub fn find_property(&self, name: &str) -> Result<Vec<PropertyVersion>, RemoteError> {
        let path = "/papi/v1/search/find-by-value";
        info!(property = name, "searching for property");
        let body = json!({ "propertyName": name });
        let response = self.send(Method::POST, path, &[], Some(&body), None)?;
        extract(path, &response, "/versions/items")
    }

    /// Resolve a property name and version selector to a concrete version.
    pub fn resolve_version(
        &self,
        name: &str,
        selector: VersionSelector,
    ) -> Result<PropertyVersion, RemoteError> {
        let versions = self.find_property(name)?;
        let version = pick_version(name, selector, &versions)?;
        info!(property = name, version = version.property_version, "resolved property version");
        Ok(version)
    }

    /// Rule tree of a property version, frozen to `rule_format` when given.
    pub fn rule_tree(
        &self,
        version: &PropertyVersion,
        rule_format: Option<&str>,
    ) -> Result<RuleTree, RemoteError> {
        let path = format!(
            "/papi/v1/properties/{}/versions/{}/rules",
            version.property_id, version.property_version
        );
        let accept = rule_format.map(|rf| format!("application/vnd.akamai.papirules.{}+json", rf));
        let params = [("validateRules", "false"), ("validateMode", "fast")];
        let response = self.send(Method::GET, &path, &params, None, accept.as_deref())?;
        serde_json::from_value(response).map_err(|source| RemoteError::Decode { endpoint: path, source })
    }

    /// Hostnames of a property version.
    pub fn hostnames(&self, version: &PropertyVersion) -> Result<Vec<Mapping>, RemoteError> {
        let path = format!(
            "/papi/v1/properties/{}/versions/{}/hostnames",
            version.property_id, version.property_version
        );
        let response = self.send(Method::GET, &path, &[], None, None)?;
        extract(&path, &response, "/hostnames/items")
    }
}

/// Body of a successful response, or the service error it carries.
fn check_status(endpoint: &str, status: StatusCode, body: String) -> Result<String, RemoteError> {
    if status.is_success() {
        return Ok(body);
    }
    Err(RemoteError::RemoteService {
        endpoint: endpoint.to_string(),
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or_default().to_string(),
        body,
    })
}

fn pick_version(
    name: &str,
    selector: VersionSelector,
    versions: &[PropertyVersion],
) -> Result<PropertyVersion, RemoteError> {
    selector.select(versions).ok_or_else(|| RemoteError::NotFound {
        property: name.to_string(),
    })
}

/// Deserialize the value at `pointer` of a response.
fn extract<T: DeserializeOwned>(endpoint: &str, response: &Value, pointer: &str) -> Result<T, RemoteError> {
    let decode = |source| RemoteError::Decode {
        endpoint: endpoint.to_string(),
        source,
    };
    let value = response.pointer(pointer).ok_or_else(|| {
        decode(<serde_json::Error as serde::de::Error>::custom(format!("missing {}", pointer)))
    })?;
    T::deserialize(value).map_err(decode)
}
