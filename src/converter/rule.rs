//! Recursive rule node conversion.
//!
//! Every node becomes one unit. A node's children are converted first, each
//! into its own file under a directory named after the node, and only then
//! is the node's own unit handed to the store (post-order).
//!
//! ```text
//! rules.jsonnet                  (tree root, rendered inline by RuleTreeConverter)
//! rules/Images.jsonnet
//! rules/Images/Thumbnails.jsonnet
//! rules/Images/advancedOverride.xml
//! ```

use serde_json::Value;

use crate::emitter::{member_access, Emitter};
use crate::naming::{child_names, join_path, named_children, unit_file_name, NamedChild, ROOT_UNIT_NAME};
use crate::store::UnitStore;
use crate::types::{AtomKind, RuleNode, DEFAULT_RULE_NAME};
use super::atom::AtomEncoder;
use super::leaf::VariablesConverter;
use super::{ConvertContext, ConvertError, UnitConverter};

/// File name of a node's variables unit.
pub const VARIABLES_FILE: &str = "variables.jsonnet";

/// File name of a node's raw advanced override.
pub const ADVANCED_OVERRIDE_FILE: &str = "advancedOverride.xml";

/// Template member applied to the default rule.
const ROOT_TEMPLATE: &str = "root";

/// Template member applied to every other rule.
const RULE_TEMPLATE: &str = "rule";

/// Where a node sits in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// The tree root, rendered inside the tree unit.
    Root,
    /// Any descendant, rendered to its own file.
    Nested,
}

/// Converts one rule node and, recursively, its subtree.
#[derive(Debug, Clone)]
pub struct RuleConverter<'n> {
    node: &'n RuleNode,
    name: &'n str,
    normalized: String,
    dir: String,
    position: Position,
}

impl<'n> RuleConverter<'n> {
    /// Converter for the tree root. Its units live at the output root under
    /// the name [`ROOT_UNIT_NAME`].
    pub fn root(node: &'n RuleNode) -> Self {
        Self {
            node,
            name: &node.name,
            normalized: ROOT_UNIT_NAME.to_string(),
            dir: String::new(),
            position: Position::Root,
        }
    }

    /// Converter for a child rule whose file goes into `dir`.
    pub fn nested(child: NamedChild<'n>, dir: impl Into<String>) -> Self {
        Self {
            node: child.node,
            name: child.name,
            normalized: crate::naming::normalize_name(child.name),
            dir: dir.into(),
            position: Position::Nested,
        }
    }

    /// Name the node is emitted under.
    pub fn name(&self) -> &str {
        self.name
    }

    /// File and directory name component of this node.
    pub fn normalized_name(&self) -> &str {
        &self.normalized
    }

    /// Path of this node's own unit.
    pub fn path(&self) -> String {
        join_path(&self.dir, &unit_file_name(&self.normalized))
    }

    /// Directory holding this node's children.
    pub fn children_dir(&self) -> String {
        join_path(&self.dir, &self.normalized)
    }

    /// Whether the root template (and its name assertion) applies.
    pub fn uses_root_template(&self) -> bool {
        self.position == Position::Root || self.name == DEFAULT_RULE_NAME
    }

    /// Convert a nested node into its own unit. Returns the unit path.
    pub fn convert<S: UnitStore>(&self, ctx: &mut ConvertContext<'_, S>) -> Result<String, ConvertError> {
        let mut emitter = Emitter::new();
        emitter.writeln(&ctx.library_import_statement());
        self.write_body(ctx, &mut emitter)?;
        emitter.blank_line();

        let path = self.path();
        ctx.materialize(&path, emitter)?;
        Ok(path)
    }

    /// Write `<template> { ... }` (no trailing newline), materializing every
    /// side file and child unit on the way.
    pub fn write_body<S: UnitStore>(
        &self,
        ctx: &mut ConvertContext<'_, S>,
        emitter: &mut Emitter,
    ) -> Result<(), ConvertError> {
        let node = self.node;
        let alias = ctx.options().library_alias.clone();
        let template = if self.uses_root_template() { ROOT_TEMPLATE } else { RULE_TEMPLATE };

        emitter.writeln(&format!("{} {{", member_access(&alias, template)));
        if self.uses_root_template() {
            emitter.writeln(&format!(
                "assert self.name == \"{0}\" : \"the default rule must be named {0}\",",
                DEFAULT_RULE_NAME
            ));
        }
        emitter.write_field("name", &Value::String(self.name.to_string()));

        if !node.comments.is_empty() {
            emitter.write("comments: ");
            emitter.write_multiline_string(&node.comments);
            emitter.writeln(",");
        }

        if let Some(uuid) = &node.uuid {
            emitter.write_field("uuid", &Value::String(uuid.clone()));
        }

        if !node.options.is_empty() {
            emitter.write_object_field("options", &node.options);
        }

        if let Some(variables) = &node.variables {
            let mut unit = Emitter::new();
            VariablesConverter::new(variables).convert(&mut unit)?;
            ctx.materialize(&join_path(&self.dir, VARIABLES_FILE), unit)?;
            emitter.writeln(&format!("variables: import '{}',", VARIABLES_FILE));
        }

        let encoder = AtomEncoder::new(ctx.schema(), &alias);
        encoder.write_list(emitter, AtomKind::Criteria, &node.criteria)?;
        if !node.criteria_must_satisfy.is_default() {
            emitter.write_field(
                "criteriaMustSatisfy",
                &Value::String(node.criteria_must_satisfy.as_str().to_string()),
            );
        }
        encoder.write_list(emitter, AtomKind::Behaviors, &node.behaviors)?;

        if let Some(custom) = node.custom_override.as_ref().filter(|c| !c.is_empty()) {
            emitter.write_object_field("customOverride", custom);
        }

        self.write_children(ctx, emitter)?;

        if let Some(xml) = &node.advanced_override {
            ctx.materialize_raw(&join_path(&self.dir, ADVANCED_OVERRIDE_FILE), xml)?;
            emitter.writeln(&format!("advancedOverride: importstr '{}',", ADVANCED_OVERRIDE_FILE));
        }

        emitter.write("}");
        Ok(())
    }

    fn write_children<S: UnitStore>(
        &self,
        ctx: &mut ConvertContext<'_, S>,
        emitter: &mut Emitter,
    ) -> Result<(), ConvertError> {
        if self.node.children.is_empty() {
            return Ok(());
        }

        // Renamed copies; the source tree stays untouched.
        let names = child_names(self.node);
        let children_dir = self.children_dir();

        emitter.writeln("children: [");
        for child in named_children(self.node, &names) {
            let converter = RuleConverter::nested(child, children_dir.as_str());
            converter.convert(ctx)?;
            let import = join_path(&self.normalized, &unit_file_name(converter.normalized_name()));
            emitter.writeln(&format!("import '{}',", import));
        }
        emitter.writeln("],");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::NoopFormatter;
    use crate::schema::SchemaIndex;
    use crate::store::InMemoryUnitStore;
    use crate::types::{AtomRef, CriteriaMustSatisfy, Mapping};
    use serde_json::json;

    fn make_schema() -> SchemaIndex {
        SchemaIndex::new(
            json!({"definitions": {"catalog": {
                "behaviors": {"caching": {"properties": {"options": {"properties": {
                    "ttl": {"type": "string"}
                }}}}},
                "criteria": {"path": {"properties": {"options": {"properties": {
                    "values": {"type": "array"}
                }}}}}
            }}}),
            "prd_Web",
            "latest",
        )
    }

    #[test]
    fn test_nested_unit_text() {
        let schema = make_schema();
        let mut store = InMemoryUnitStore::new();
        let mut ctx = ConvertContext::new(&schema, &mut store, &NoopFormatter);

        let mut node = RuleNode::new("Images")
            .with_criterion(AtomRef::new("path").with_option("values", json!(["*.png"])))
            .with_behavior(AtomRef::new("caching").with_option("ttl", json!("1d")));
        node.criteria_must_satisfy = CriteriaMustSatisfy::Any;
        node.uuid = Some("r-1".to_string());

        let parent = RuleNode::default_rule().with_child(node);
        let names = child_names(&parent);
        let child = named_children(&parent, &names)[0];
        let path = RuleConverter::nested(child, "rules").convert(&mut ctx).unwrap();

        assert_eq!(path, "rules/Images.jsonnet");
        assert_eq!(
            store.get("rules/Images.jsonnet").unwrap(),
            "local papi = import 'papi/prd_Web/latest.libsonnet';\n\
             papi.rule {\n\
             name: \"Images\",\n\
             uuid: \"r-1\",\n\
             criteria: [\n\
             papi.criteria.path {\n  \"values\": [\n    \"*.png\"\n  ]\n},\n\
             ],\n\
             criteriaMustSatisfy: \"any\",\n\
             behaviors: [\n\
             papi.behaviors.caching {\n  \"ttl\": \"1d\"\n},\n\
             ],\n\
             }\n"
        );
    }

    #[test]
    fn test_children_are_written_before_parent() {
        let schema = make_schema();
        let mut store = InMemoryUnitStore::new();
        let mut ctx = ConvertContext::new(&schema, &mut store, &NoopFormatter);

        let grand = RuleNode::new("Thumbs");
        let child = RuleNode::new("Images").with_child(grand);
        let parent = RuleNode::default_rule().with_child(child);
        let names = child_names(&parent);
        let child = named_children(&parent, &names)[0];
        RuleConverter::nested(child, "rules").convert(&mut ctx).unwrap();

        assert_eq!(store.write_order(), ["rules/Images/Thumbs.jsonnet", "rules/Images.jsonnet"]);
        assert!(store
            .get("rules/Images.jsonnet")
            .unwrap()
            .contains("children: [\nimport 'Images/Thumbs.jsonnet',\n],\n"));
    }

    #[test]
    fn test_side_files_live_next_to_unit() {
        let schema = make_schema();
        let mut store = InMemoryUnitStore::new();
        let mut ctx = ConvertContext::new(&schema, &mut store, &NoopFormatter);

        let mut variable = Mapping::new();
        variable.insert("name".to_string(), json!("PMUSER_X"));
        let mut node = RuleNode::default_rule();
        node.variables = Some(vec![variable]);
        node.advanced_override = Some("<match:x/>".to_string());

        let mut root = Emitter::new();
        RuleConverter::root(&node).write_body(&mut ctx, &mut root).unwrap();

        assert_eq!(store.get(VARIABLES_FILE), Some("[\n{\nname: \"PMUSER_X\",\n},\n]\n"));
        assert_eq!(store.get(ADVANCED_OVERRIDE_FILE), Some("<match:x/>"));
        let text = root.into_text();
        assert!(text.contains("variables: import 'variables.jsonnet',\n"));
        assert!(text.ends_with("advancedOverride: importstr 'advancedOverride.xml',\n}"));
    }

    #[test]
    fn test_root_template_and_assertion() {
        let schema = make_schema();
        let mut ctx = ConvertContext::new(&schema, InMemoryUnitStore::new(), &NoopFormatter);
        let node = RuleNode::new("renamed");

        let mut e = Emitter::new();
        RuleConverter::root(&node).write_body(&mut ctx, &mut e).unwrap();
        assert_eq!(
            e.as_str(),
            "papi.root {\nassert self.name == \"default\" : \"the default rule must be named default\",\nname: \"renamed\",\n}"
        );
    }

    #[test]
    fn test_empty_custom_override_is_skipped() {
        let schema = make_schema();
        let mut ctx = ConvertContext::new(&schema, InMemoryUnitStore::new(), &NoopFormatter);
        let mut node = RuleNode::new("x");
        node.custom_override = Some(Mapping::new());

        let mut e = Emitter::new();
        RuleConverter::root(&node).write_body(&mut ctx, &mut e).unwrap();
        assert!(!e.as_str().contains("customOverride"));
    }

    #[test]
    fn test_failing_child_leaves_no_parent_unit() {
        let schema = make_schema();
        let mut store = InMemoryUnitStore::new();
        let mut ctx = ConvertContext::new(&schema, &mut store, &NoopFormatter);

        let ok = RuleNode::new("Ok");
        let bad = RuleNode::new("Bad").with_behavior(AtomRef::new("missing"));
        let child = RuleNode::new("Parent").with_child(ok).with_child(bad);
        let parent = RuleNode::default_rule().with_child(child);
        let names = child_names(&parent);
        let child = named_children(&parent, &names)[0];

        let err = RuleConverter::nested(child, "rules").convert(&mut ctx).unwrap_err();
        assert!(matches!(err, ConvertError::SchemaLookup(_)));
        assert_eq!(store.write_order(), ["rules/Parent/Ok.jsonnet"]);
    }
}
