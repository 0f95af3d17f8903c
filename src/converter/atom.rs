//! Behavior and criterion encoding.
//!
//! An atom becomes `<alias>.<kind>.<name>`, followed by an options object
//! when any option survives the catalog filter:
//!
//! ```text
//! papi.behaviors.caching {
//!   "ttl": 300,
//!   "uuid": "b0c1"
//! },
//! ```
//!
//! The service returns option keys the catalog does not declare; rendering
//! those back would fail validation, so only declared keys are kept.

use serde_json::Value;

use crate::emitter::{member_access, Emitter};
use crate::schema::SchemaIndex;
use crate::types::{AtomDefinition, AtomKind, AtomRef, Mapping};
use super::ConvertError;

/// Encodes atoms against the catalog.
pub struct AtomEncoder<'a> {
    schema: &'a SchemaIndex,
    alias: &'a str,
}

impl<'a> AtomEncoder<'a> {
    /// Create an encoder referring to the library as `alias`.
    pub fn new(schema: &'a SchemaIndex, alias: &'a str) -> Self {
        Self { schema, alias }
    }

    /// Options of `atom` that `definition` declares, in the atom's own order,
    /// with the occurrence uuid appended under `uuid`.
    pub fn filter_options(atom: &AtomRef, definition: &AtomDefinition) -> Mapping {
        let mut options: Mapping = atom
            .options
            .iter()
            .filter(|(key, _)| definition.declares(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        if let Some(uuid) = &atom.uuid {
            options.insert("uuid".to_string(), Value::String(uuid.clone()));
        }
        options
    }

    /// Encode one atom as an expression (no trailing comma).
    ///
    /// Fails if the catalog has no entry for the atom.
    pub fn encode(&self, kind: AtomKind, atom: &AtomRef) -> Result<String, ConvertError> {
        let definition = self.schema.resolve_catalog_entry(kind, &atom.name)?;
        let options = Self::filter_options(atom, &definition);

        let namespace = format!("{}.{}", self.alias, kind.as_str());
        let mut expr = member_access(&namespace, &atom.name);
        if !options.is_empty() {
            expr.push(' ');
            expr.push_str(&serde_json::to_string_pretty(&options)?);
        }
        Ok(expr)
    }

    /// Write `<kind>: [ ... ],` when `atoms` is non-empty.
    ///
    /// All atoms are encoded before anything is written.
    pub fn write_list(
        &self,
        emitter: &mut Emitter,
        kind: AtomKind,
        atoms: &[AtomRef],
    ) -> Result<(), ConvertError> {
        if atoms.is_empty() {
            return Ok(());
        }
        let encoded = atoms
            .iter()
            .map(|atom| self.encode(kind, atom))
            .collect::<Result<Vec<_>, _>>()?;

        emitter.writeln(&format!("{}: [", kind.as_str()));
        for expr in &encoded {
            emitter.writeln(&format!("{},", expr));
        }
        emitter.writeln("],");
        Ok(())
    }
}
