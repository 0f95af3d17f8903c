//! Conversion benchmarks.
//!
//! Run with: `cargo bench --bench conversion`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::json;

use akamai_jsonnet::{
    convert_rule_tree, render_catalog_library, AtomRef, InMemoryUnitStore, NoopFormatter, RuleNode,
    RuleTree, SchemaIndex,
};

fn make_schema(atoms: usize) -> SchemaIndex {
    let mut behaviors = serde_json::Map::new();
    for i in 0..atoms {
        behaviors.insert(
            format!("behavior{}", i),
            json!({"properties": {"options": {"properties": {
                "enabled": {"type": "boolean", "default": false},
                "ttl": {"$ref": "#/definitions/ttl"}
            }}}}),
        );
    }
    SchemaIndex::new(
        json!({"definitions": {
            "catalog": {"behaviors": behaviors, "criteria": {}},
            "ttl": {"type": "string", "default": "1d"}
        }}),
        "prd_Bench",
        "latest",
    )
}

fn make_rule(name: &str) -> RuleNode {
    RuleNode::new(name).with_behavior(
        AtomRef::new("behavior0")
            .with_option("enabled", json!(true))
            .with_option("ttl", json!("7d"))
            .with_option("undeclared", json!(1)),
    )
}

/// Root with `width` children that all share one name.
fn wide_tree(width: usize) -> RuleTree {
    let root = (0..width).fold(RuleNode::default_rule(), |root, _| root.with_child(make_rule("Rule")));
    RuleTree::new(root)
}

/// Chain of `depth` nested rules.
fn deep_tree(depth: usize) -> RuleTree {
    let leaf = (0..depth).fold(make_rule("Leaf"), |child, i| {
        make_rule(&format!("Level {}", i)).with_child(child)
    });
    RuleTree::new(RuleNode::default_rule().with_child(leaf))
}

fn bench_tree(c: &mut Criterion, group_name: &str, make: fn(usize) -> RuleTree) {
    let schema = make_schema(1);
    let mut group = c.benchmark_group(group_name);

    for size in [10, 100, 500] {
        let tree = make(size);
        group.throughput(Throughput::Elements(tree.rules.subtree_len() as u64));
        group.bench_with_input(BenchmarkId::new("rules", size), &tree, |b, tree| {
            b.iter(|| {
                let mut store = InMemoryUnitStore::new();
                convert_rule_tree(&schema, black_box(tree), &mut store, &NoopFormatter).unwrap()
            })
        });
    }

    group.finish();
}

fn bench_wide_tree(c: &mut Criterion) {
    bench_tree(c, "wide_tree", wide_tree);
}

fn bench_deep_tree(c: &mut Criterion) {
    bench_tree(c, "deep_tree", deep_tree);
}

fn bench_catalog_library(c: &mut Criterion) {
    let mut group = c.benchmark_group("catalog_library");

    for atoms in [10, 100, 1000] {
        let schema = make_schema(atoms);
        group.throughput(Throughput::Elements(atoms as u64));
        group.bench_with_input(BenchmarkId::new("atoms", atoms), &schema, |b, schema| {
            b.iter(|| render_catalog_library(black_box(schema), &NoopFormatter).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_wide_tree, bench_deep_tree, bench_catalog_library);
criterion_main!(benches);
