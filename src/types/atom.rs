//! Catalog-side atom definitions.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The two atom namespaces of the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AtomKind {
    /// Actions applied by a rule.
    Behaviors,
    /// Match conditions of a rule.
    Criteria,
}

impl AtomKind {
    /// Both kinds, in library emission order.
    pub const ALL: [AtomKind; 2] = [AtomKind::Behaviors, AtomKind::Criteria];

    /// Catalog key (and rule field name) of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Behaviors => "behaviors",
            Self::Criteria => "criteria",
        }
    }
}

impl std::fmt::Display for AtomKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One declared option of an atom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionDefinition {
    /// Option key.
    pub name: String,
    /// Default declared by the schema, after `$ref` resolution.
    pub declared_default: Option<Value>,
}

/// An atom as declared by the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomDefinition {
    /// Atom name.
    pub name: String,
    /// Declared options, in schema order.
    pub options: Vec<OptionDefinition>,
}

impl AtomDefinition {
    /// Whether `key` is a declared option.
    pub fn declares(&self, key: &str) -> bool {
        self.options.iter().any(|option| option.name == key)
    }

    /// Declared option names, in schema order.
    pub fn option_names(&self) -> impl Iterator<Item = &str> {
        self.options.iter().map(|option| option.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declares() {
        let def = AtomDefinition {
            name: "caching".to_string(),
            options: vec![
                OptionDefinition { name: "behavior".to_string(), declared_default: None },
                OptionDefinition { name: "ttl".to_string(), declared_default: None },
            ],
        };
        assert!(def.declares("ttl"));
        assert!(!def.declares("mustRevalidate"));
        assert_eq!(def.option_names().collect::<Vec<_>>(), vec!["behavior", "ttl"]);
    }
}
