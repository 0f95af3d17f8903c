//! Rule tree model as returned by the property API.
//!
//! Option bags stay open `serde_json::Map`s. Only the atom options get an
//! allow-list filter (against the catalog), everything else passes through
//! untouched. With the `preserve_order` feature of `serde_json` the maps keep
//! the source key order, which is what the emitted text follows.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A flat key/value mapping (rule options, variables, hostnames, overrides).
pub type Mapping = Map<String, Value>;

/// Name the tree root must carry.
pub const DEFAULT_RULE_NAME: &str = "default";

/// How the criteria of a rule combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CriteriaMustSatisfy {
    /// Every criterion must match.
    All,
    /// At least one criterion must match.
    Any,
}

impl CriteriaMustSatisfy {
    /// Wire value of this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Any => "any",
        }
    }

    /// True for the implicit mode that is never emitted.
    pub fn is_default(&self) -> bool {
        *self == Self::All
    }
}

impl Default for CriteriaMustSatisfy {
    fn default() -> Self {
        Self::All
    }
}

impl std::fmt::Display for CriteriaMustSatisfy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One behavior or criterion occurrence on a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomRef {
    /// Catalog name of the atom.
    pub name: String,
    /// Option values as returned by the service (may contain undeclared keys).
    #[serde(default)]
    pub options: Mapping,
    /// Stable identifier of this occurrence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

impl AtomRef {
    /// Create an atom reference without options.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: Mapping::new(),
            uuid: None,
        }
    }

    /// Add an option value.
    pub fn with_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    /// Set the occurrence uuid.
    pub fn with_uuid(mut self, uuid: impl Into<String>) -> Self {
        self.uuid = Some(uuid.into());
        self
    }
}

/// A node of the rule tree.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleNode {
    /// Rule name. Siblings may collide; see [`crate::naming::disambiguate`].
    #[serde(default)]
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub comments: String,
    /// Rule-level options, emitted verbatim.
    #[serde(default)]
    pub options: Mapping,
    /// User variables. `None` when the field is absent from the source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<Vec<Mapping>>,
    /// Match criteria.
    #[serde(default)]
    pub criteria: Vec<AtomRef>,
    /// How `criteria` combine.
    #[serde(default)]
    pub criteria_must_satisfy: CriteriaMustSatisfy,
    /// Behaviors applied when the rule matches.
    #[serde(default)]
    pub behaviors: Vec<AtomRef>,
    /// Nested rules, in evaluation order.
    #[serde(default)]
    pub children: Vec<RuleNode>,
    /// Reference to a custom override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_override: Option<Mapping>,
    /// Raw advanced metadata, written to its own file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advanced_override: Option<String>,
    /// Stable identifier of the rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

impl RuleNode {
    /// Create an empty rule with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Create an empty default rule.
    pub fn default_rule() -> Self {
        Self::new(DEFAULT_RULE_NAME)
    }

    /// Append a child rule.
    pub fn with_child(mut self, child: RuleNode) -> Self {
        self.children.push(child);
        self
    }

    /// Append a behavior.
    pub fn with_behavior(mut self, behavior: AtomRef) -> Self {
        self.behaviors.push(behavior);
        self
    }

    /// Append a criterion.
    pub fn with_criterion(mut self, criterion: AtomRef) -> Self {
        self.criteria.push(criterion);
        self
    }

    /// Whether this node carries the reserved root name.
    pub fn is_default(&self) -> bool {
        self.name == DEFAULT_RULE_NAME
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(RuleNode::subtree_len).sum::<usize>()
    }
}

/// A complete rule tree document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleTree {
    /// Contract the property belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_id: Option<String>,
    /// Group the property belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    /// Property identifier, when fetched from the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_id: Option<String>,
    /// Property version, when fetched from the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_version: Option<u64>,
    /// Rule format the tree was frozen to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_format: Option<String>,
    /// The default rule.
    pub rules: RuleNode,
}

impl RuleTree {
    /// Wrap a default rule without tree metadata.
    pub fn new(rules: RuleNode) -> Self {
        Self {
            contract_id: None,
            group_id: None,
            property_id: None,
            property_version: None,
            rule_format: None,
            rules,
        }
    }

    /// Parse a rule tree document.
    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}
