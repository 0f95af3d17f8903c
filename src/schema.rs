//! Path-addressed access to the rule format catalog.
//!
//! The catalog is a JSON schema document. Entries are located with JSON
//! pointers and option schemas may indirect through `$ref` pointers into the
//! same document. Lookups are pure: the document is never modified.

use serde_json::{Map, Value};

use crate::types::{AtomDefinition, AtomKind, OptionDefinition};

/// Longest `$ref` chain followed before giving up.
pub const MAX_REF_DEPTH: usize = 16;

/// Error type for catalog lookups. Always fatal for the enclosing conversion.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaLookupError {
    /// Nothing exists at the pointer.
    #[error("Schema path not found: {0}")]
    PathNotFound(String),
    /// Something exists at the pointer but it is not an object.
    #[error("Schema entry is not an object: {0}")]
    NotAnObject(String),
    /// A `$ref` value is not a string.
    #[error("Invalid $ref at {0}")]
    InvalidReference(String),
    /// `$ref` chain exceeded [`MAX_REF_DEPTH`].
    #[error("$ref chain too deep at {0}")]
    ReferenceDepth(String),
}

/// Read-only index over one rule format document.
#[derive(Debug, Clone)]
pub struct SchemaIndex {
    document: Value,
    product: String,
    rule_format: String,
}

impl SchemaIndex {
    /// Wrap a parsed rule format document.
    pub fn new(document: Value, product: impl Into<String>, rule_format: impl Into<String>) -> Self {
        Self {
            document,
            product: product.into(),
            rule_format: rule_format.into(),
        }
    }

    /// Parse a rule format document.
    pub fn from_json_str(
        s: &str,
        product: impl Into<String>,
        rule_format: impl Into<String>,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::from_str(s)?, product, rule_format))
    }

    /// Product identifier the document was fetched for.
    pub fn product(&self) -> &str {
        &self.product
    }

    /// Rule format version the document was fetched for.
    pub fn rule_format(&self) -> &str {
        &self.rule_format
    }

    /// Import path of the generated catalog library, relative to a library root.
    pub fn library_import_path(&self) -> String {
        format!("papi/{}/{}.libsonnet", self.product, self.rule_format)
    }

    /// The raw document.
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Resolve a JSON pointer. A leading `#` (as in `$ref` values) is ignored.
    pub fn resolve_pointer(&self, pointer: &str) -> Result<&Value, SchemaLookupError> {
        let pointer = pointer.trim_start_matches('#');
        self.document
            .pointer(pointer)
            .ok_or_else(|| SchemaLookupError::PathNotFound(pointer.to_string()))
    }

    /// Resolve a pointer that must address an object.
    fn resolve_object(&self, pointer: &str) -> Result<&Map<String, Value>, SchemaLookupError> {
        self.resolve_pointer(pointer)?
            .as_object()
            .ok_or_else(|| SchemaLookupError::NotAnObject(pointer.to_string()))
    }

    /// Look up the declared options of one catalog atom.
    pub fn resolve_catalog_entry(
        &self,
        kind: AtomKind,
        name: &str,
    ) -> Result<AtomDefinition, SchemaLookupError> {
        let pointer = options_pointer(kind, name);
        let declared = self.resolve_object(&pointer)?;

        let mut options = Vec::with_capacity(declared.len());
        for (option_name, raw) in declared {
            let at = format!("{}/{}", pointer, escape_segment(option_name));
            let resolved = self.resolve_option(raw, &at)?;
            options.push(OptionDefinition {
                name: option_name.clone(),
                declared_default: resolved.get("default").cloned(),
            });
        }

        Ok(AtomDefinition {
            name: name.to_string(),
            options,
        })
    }

    /// Names of every catalog atom of a kind, in document order.
    pub fn catalog_names(&self, kind: AtomKind) -> Result<Vec<String>, SchemaLookupError> {
        let pointer = format!("/definitions/catalog/{}", kind.as_str());
        Ok(self.resolve_object(&pointer)?.keys().cloned().collect())
    }

    /// Every catalog atom of a kind with its declared options.
    pub fn catalog_entries(&self, kind: AtomKind) -> Result<Vec<AtomDefinition>, SchemaLookupError> {
        self.catalog_names(kind)?
            .iter()
            .map(|name| self.resolve_catalog_entry(kind, name))
            .collect()
    }

    /// Follow `$ref` indirections of an option schema, merging each target
    /// over the referring object.
    fn resolve_option(&self, raw: &Value, at: &str) -> Result<Map<String, Value>, SchemaLookupError> {
        let mut merged = raw
            .as_object()
            .cloned()
            .ok_or_else(|| SchemaLookupError::NotAnObject(at.to_string()))?;

        let mut depth = 0;
        while let Some(reference) = merged.remove("$ref") {
            depth += 1;
            if depth > MAX_REF_DEPTH {
                return Err(SchemaLookupError::ReferenceDepth(at.to_string()));
            }
            let reference = reference
                .as_str()
                .ok_or_else(|| SchemaLookupError::InvalidReference(at.to_string()))?;
            for (key, value) in self.resolve_object(reference)? {
                merged.insert(key.clone(), value.clone());
            }
        }

        Ok(merged)
    }
}

/// Pointer to the option schemas of a catalog atom.
fn options_pointer(kind: AtomKind, name: &str) -> String {
    format!(
        "/definitions/catalog/{}/{}/properties/options/properties",
        kind.as_str(),
        escape_segment(name)
    )
}

/// Escape one JSON pointer reference token.
fn escape_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}
