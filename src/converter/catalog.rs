//! Catalog library generation.
//!
//! The library exposes every catalog atom as an object template. Each
//! declared option is a hidden binding to `unset`, and the visible `options`
//! object only carries the bindings a call site has overridden:
//!
//! ```text
//! papi.behaviors.caching { ttl: "1d" }
//! // manifests as {"name": "caching", "options": {"ttl": "1d"}}
//! ```
//!
//! The schema's own defaults are never bound. Defaults of different atoms are
//! not guaranteed to be consistent with each other, so they only appear as
//! comments.

use crate::emitter::{field_name, json_text, string_literal, value_text, Emitter};
use crate::schema::SchemaIndex;
use crate::types::{AtomDefinition, AtomKind, DEFAULT_RULE_NAME};
use super::{ConvertError, UnitConverter};

/// Description the `root` template carries until a tree overrides it.
const DEFAULT_RULE_COMMENT: &str = "The behaviors in the Default Rule apply to all requests for the \
property hostname(s) unless another rule overrides the Default Rule settings.";

/// Sentinel bound to every option. Manifesting it is an error.
const UNSET_LOCAL: &str =
    "local unset = { assert false : 'option value is unset', __unset__:: true };";

/// `isUnset` only inspects the field set, so the sentinel's assertion never fires.
const IS_UNSET_LOCAL: &str =
    "local isUnset(value) = std.isObject(value) && std.objectHasAll(value, '__unset__');";

/// Renders the catalog library of one rule format.
pub struct CatalogLibraryConverter<'a> {
    schema: &'a SchemaIndex,
}

impl<'a> CatalogLibraryConverter<'a> {
    /// Create a converter over `schema`.
    pub fn new(schema: &'a SchemaIndex) -> Self {
        Self { schema }
    }

    fn write_preamble(&self, emitter: &mut Emitter) {
        emitter.writeln(UNSET_LOCAL);
        emitter.writeln(IS_UNSET_LOCAL);
        emitter.blank_line();
        emitter.writeln("{");
        emitter.writeln(&format!("productId:: {},", string_literal(self.schema.product())));
        emitter.writeln(&format!("ruleFormat:: {},", string_literal(self.schema.rule_format())));
        emitter.writeln("unset:: unset,");
        emitter.blank_line();
    }

    fn write_rule_templates(&self, emitter: &mut Emitter) {
        emitter.writeln("rule: {");
        emitter.writeln("name: error '<name> is required',");
        emitter.writeln("comments: \"\",");
        emitter.writeln("behaviors: [],");
        emitter.writeln("children: [],");
        emitter.writeln("criteria: [],");
        emitter.writeln("criteriaMustSatisfy: \"all\",");
        emitter.writeln("options: {},");
        emitter.writeln("},");
        emitter.blank_line();

        emitter.writeln("root: {");
        emitter.writeln(&format!("name: {},", string_literal(DEFAULT_RULE_NAME)));
        emitter.writeln(&format!(
            "assert self.name == {0} : 'the default rule must be named ' + {0},",
            string_literal(DEFAULT_RULE_NAME)
        ));
        emitter.write("comments: ");
        emitter.write_multiline_string(DEFAULT_RULE_COMMENT);
        emitter.writeln(",");
        emitter.writeln("behaviors: [],");
        emitter.writeln("children: [],");
        emitter.writeln("options: {},");
        emitter.writeln("variables: [],");
        emitter.writeln("},");
        emitter.blank_line();
    }

    fn write_atom(emitter: &mut Emitter, atom: &AtomDefinition) -> Result<(), ConvertError> {
        emitter.writeln(&format!("{}: {{", field_name(&atom.name)));
        emitter.writeln("local _ = self,");
        emitter.writeln(&format!("name: {},", string_literal(&atom.name)));

        for option in &atom.options {
            let binding = format!("{}:: unset,", field_name(&option.name));
            match &option.declared_default {
                Some(default) => emitter.writeln(&format!("{}  // schema default: {}", binding, value_text(default))),
                None => emitter.writeln(&binding),
            }
        }

        let names: Vec<&str> = atom.option_names().collect();
        emitter.writeln("options: {");
        emitter.writeln("[name]: _[name]");
        emitter.writeln(&format!("for name in {}", json_text(&names)?));
        emitter.writeln("if std.objectHasAll(_, name) && !isUnset(_[name])");
        emitter.writeln("},");
        emitter.writeln("},");
        Ok(())
    }

    fn write_kind(&self, emitter: &mut Emitter, kind: AtomKind) -> Result<(), ConvertError> {
        let entries = self.schema.catalog_entries(kind)?;
        emitter.writeln(&format!("{}: {{", kind.as_str()));
        for atom in &entries {
            Self::write_atom(emitter, atom)?;
        }
        emitter.writeln("},");
        tracing::debug!(kind = %kind, atoms = entries.len(), "rendered catalog kind");
        Ok(())
    }
}

impl UnitConverter for CatalogLibraryConverter<'_> {
    fn convert(&self, emitter: &mut Emitter) -> Result<(), ConvertError> {
        self.write_preamble(emitter);
        self.write_rule_templates(emitter);
        for kind in AtomKind::ALL {
            self.write_kind(emitter, kind)?;
        }
        emitter.writeln("}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaLookupError;
    use serde_json::json;

    fn make_schema() -> SchemaIndex {
        SchemaIndex::new(
            json!({"definitions": {
                "catalog": {
                    "behaviors": {
                        "caching": {"properties": {"options": {"properties": {
                            "behavior": {"type": "string", "default": "MAX_AGE"},
                            "ttl": {"$ref": "#/definitions/ttl"}
                        }}}},
                        "allow-post": {"properties": {"options": {"properties": {}}}}
                    },
                    "criteria": {
                        "path": {"properties": {"options": {"properties": {
                            "values": {"type": "array"}
                        }}}}
                    }
                },
                "ttl": {"type": "string", "default": "1d"}
            }}),
            "prd_Web",
            "latest",
        )
    }

    fn render(schema: &SchemaIndex) -> String {
        let mut e = Emitter::new();
        CatalogLibraryConverter::new(schema).convert(&mut e).unwrap();
        e.into_text()
    }

    #[test]
    fn test_atom_block() {
        let text = render(&make_schema());
        let expected = "caching: {\n\
                        local _ = self,\n\
                        name: \"caching\",\n\
                        behavior:: unset,  // schema default: \"MAX_AGE\"\n\
                        ttl:: unset,  // schema default: \"1d\"\n\
                        options: {\n\
                        [name]: _[name]\n\
                        for name in [\"behavior\", \"ttl\"]\n\
                        if std.objectHasAll(_, name) && !isUnset(_[name])\n\
                        },\n\
                        },\n";
        assert!(text.contains(expected), "{}", text);
    }

    #[test]
    fn test_structured_default_comment_is_spaced() {
        let schema = SchemaIndex::new(
            json!({"definitions": {"catalog": {
                "behaviors": {"cors": {"properties": {"options": {"properties": {
                    "methods": {"type": "array", "default": ["GET", "HEAD"]},
                    "limits": {"type": "object", "default": {"age": 10}}
                }}}}},
                "criteria": {}
            }}}),
            "prd_Web",
            "latest",
        );
        let text = render(&schema);
        assert!(text.contains("methods:: unset,  // schema default: [\"GET\", \"HEAD\"]\n"), "{}", text);
        assert!(text.contains("limits:: unset,  // schema default: {\"age\": 10}\n"), "{}", text);
    }

    #[test]
    fn test_non_identifier_atom_is_quoted() {
        let text = render(&make_schema());
        assert!(text.contains("\"allow-post\": {\n"));
        assert!(text.contains("for name in []\n"));
    }

    #[test]
    fn test_preamble_and_kinds_order() {
        let text = render(&make_schema());
        assert!(text.starts_with(UNSET_LOCAL));
        assert!(text.contains("productId:: \"prd_Web\",\nruleFormat:: \"latest\",\n"));
        let behaviors = text.find("behaviors: {\n").unwrap();
        let criteria = text.find("criteria: {\n").unwrap();
        assert!(text.find("root: {\n").unwrap() < behaviors);
        assert!(behaviors < criteria);
        assert!(text.ends_with("},\n}\n"));
    }

    #[test]
    fn test_root_template_comment_is_text_block() {
        let text = render(&make_schema());
        assert!(text.contains("comments: |||\n    The behaviors in the Default Rule"));
    }

    #[test]
    fn test_missing_catalog_fails() {
        let schema = SchemaIndex::new(json!({"definitions": {}}), "prd_Web", "latest");
        let mut e = Emitter::new();
        let err = CatalogLibraryConverter::new(&schema).convert(&mut e).unwrap_err();
        assert!(matches!(err, ConvertError::SchemaLookup(SchemaLookupError::PathNotFound(_))));
    }
}
