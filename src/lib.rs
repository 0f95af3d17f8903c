//! # akamai-jsonnet
//!
//! Deterministic conversion of Akamai property rule trees into decomposed
//! Jsonnet templates.
//!
//! A rule tree (as returned by the property API) becomes one file per rule,
//! linked by `import` statements, plus a library module generated from the
//! rule format catalog that every rule file imports.
//!
//! ## Architecture
//!
//! ```text
//! RuleTree JSON → RuleTreeConverter → RuleConverter (post-order) → UnitStore
//!                                         ↓
//!                         AtomEncoder / leaf converters → SchemaIndex
//!
//! Rule format JSON → CatalogLibraryConverter → library text
//! ```
//!
//! ## Determinism Guarantees
//!
//! - Same catalog + same rule tree → byte-identical units and paths
//! - Children are stored before their parent; siblings in source order
//! - Every run returns a [`ConversionReport`] whose fingerprint pins both
//!
//! ## Example
//!
//! ```rust
//! use akamai_jsonnet::{convert_rule_tree, InMemoryUnitStore, NoopFormatter, RuleNode, RuleTree, SchemaIndex};
//! use serde_json::json;
//!
//! let schema = SchemaIndex::new(json!({}), "prd_Web", "latest");
//! let tree = RuleTree::new(RuleNode::default_rule().with_child(RuleNode::new("Static Content")));
//!
//! let mut store = InMemoryUnitStore::new();
//! let report = convert_rule_tree(&schema, &tree, &mut store, &NoopFormatter).unwrap();
//!
//! assert_eq!(report.paths().collect::<Vec<_>>(), vec!["rules/Static_Content.jsonnet", "rules.jsonnet"]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod schema;
pub mod emitter;
pub mod format;
pub mod naming;
pub mod store;
pub mod canonical;
pub mod converter;

#[cfg(feature = "remote")]
pub mod remote;

// Re-exports
pub use types::{AtomDefinition, AtomKind, AtomRef, CriteriaMustSatisfy, Mapping, OptionDefinition, RuleNode, RuleTree};
pub use schema::{SchemaIndex, SchemaLookupError};
pub use emitter::{Emitter, COMMENT_WRAP_WIDTH};
pub use format::{Formatter, JsonnetFmt, NoopFormatter};
pub use naming::{disambiguate, normalize_name};
pub use store::{FsStoreError, FsUnitStore, InMemoryUnitStore, UnitStore};
pub use canonical::{ConversionReport, WrittenUnit};
pub use converter::{
    convert_rule_tree, render_catalog_library, AtomEncoder, CatalogLibraryConverter, ConvertContext,
    ConvertError, ConvertOptions, HostnamesConverter, RuleConverter, RuleTreeConverter, UnitConverter,
    VariablesConverter,
};
