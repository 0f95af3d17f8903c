//! Filesystem layout of a converted rule tree.

use std::fs;

use akamai_jsonnet::{
    convert_rule_tree, AtomRef, FsUnitStore, Mapping, NoopFormatter, RuleNode, RuleTree, SchemaIndex,
};
use serde_json::json;

// ─────────────────────────────────────────────────────────────────────────────
// Test Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn make_schema() -> SchemaIndex {
    SchemaIndex::new(
        json!({"definitions": {"catalog": {
            "behaviors": {"caching": {"properties": {"options": {"properties": {
                "ttl": {"type": "string"}
            }}}}},
            "criteria": {}
        }}}),
        "prd_Web",
        "latest",
    )
}

fn make_tree() -> RuleTree {
    let mut variable = Mapping::new();
    variable.insert("name".to_string(), json!("PMUSER_ORIGIN"));
    variable.insert("value".to_string(), json!("origin.example.com"));

    let mut root = RuleNode::default_rule().with_child(
        RuleNode::new("Static")
            .with_behavior(AtomRef::new("caching").with_option("ttl", json!("7d")))
            .with_child(RuleNode::new("Fonts")),
    );
    root.variables = Some(vec![variable]);
    root.advanced_override = Some("<comment:info>x</comment:info>".to_string());
    RuleTree::new(root)
}

// ─────────────────────────────────────────────────────────────────────────────
// Layout
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_files_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");

    let report = convert_rule_tree(&make_schema(), &make_tree(), FsUnitStore::new(&out), &NoopFormatter).unwrap();

    assert!(out.join("rules.jsonnet").is_file());
    assert!(out.join("rules/Static.jsonnet").is_file());
    assert!(out.join("rules/Static/Fonts.jsonnet").is_file());
    assert!(out.join("variables.jsonnet").is_file());
    assert!(out.join("advancedOverride.xml").is_file());

    assert_eq!(
        fs::read_to_string(out.join("advancedOverride.xml")).unwrap(),
        "<comment:info>x</comment:info>"
    );
    assert_eq!(
        fs::read_to_string(out.join("variables.jsonnet")).unwrap(),
        "[\n{\nname: \"PMUSER_ORIGIN\",\nvalue: \"origin.example.com\",\n},\n]\n"
    );
    assert_eq!(report.len(), 5);
}

#[test]
fn test_report_matches_disk() {
    let dir = tempfile::tempdir().unwrap();
    let report = convert_rule_tree(&make_schema(), &make_tree(), FsUnitStore::new(dir.path()), &NoopFormatter).unwrap();

    for unit in &report.units {
        let contents = fs::read_to_string(dir.path().join(&unit.path)).unwrap();
        assert_eq!(contents.len(), unit.bytes, "size of {}", unit.path);
    }
}

#[test]
fn test_children_are_stored_before_ancestors() {
    let dir = tempfile::tempdir().unwrap();
    let report = convert_rule_tree(&make_schema(), &make_tree(), FsUnitStore::new(dir.path()), &NoopFormatter).unwrap();

    let order: Vec<&str> = report.paths().collect();
    let at = |p: &str| order.iter().position(|x| *x == p).unwrap();

    assert!(at("rules/Static/Fonts.jsonnet") < at("rules/Static.jsonnet"));
    assert!(at("rules/Static.jsonnet") < at("rules.jsonnet"));
    assert!(at("variables.jsonnet") < at("rules.jsonnet"));
    assert_eq!(order.last(), Some(&"rules.jsonnet"));
}

#[test]
fn test_rerun_overwrites_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let schema = make_schema();
    let tree = make_tree();

    let first = convert_rule_tree(&schema, &tree, FsUnitStore::new(dir.path()), &NoopFormatter).unwrap();
    let second = convert_rule_tree(&schema, &tree, FsUnitStore::new(dir.path()), &NoopFormatter).unwrap();

    assert_eq!(first.fingerprint(), second.fingerprint());
}
