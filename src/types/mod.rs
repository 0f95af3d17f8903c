//! Core types for the converter.

pub mod rule;
pub mod atom;

pub use rule::{RuleTree, RuleNode, AtomRef, CriteriaMustSatisfy, Mapping, DEFAULT_RULE_NAME};
pub use atom::{AtomKind, AtomDefinition, OptionDefinition};
