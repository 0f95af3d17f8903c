//! Tree-level unit.

use serde_json::Value;

use crate::emitter::Emitter;
use crate::naming::{unit_file_name, ROOT_UNIT_NAME};
use crate::store::UnitStore;
use crate::types::RuleTree;
use super::rule::RuleConverter;
use super::{ConvertContext, ConvertError};

/// Renders the outermost unit: tree metadata plus the default rule.
pub struct RuleTreeConverter<'t> {
    tree: &'t RuleTree,
}

impl<'t> RuleTreeConverter<'t> {
    /// Create a converter for `tree`.
    pub fn new(tree: &'t RuleTree) -> Self {
        Self { tree }
    }

    /// Path of the tree unit.
    pub fn path() -> String {
        unit_file_name(ROOT_UNIT_NAME)
    }

    /// Convert the whole tree. The tree unit is stored after every other unit.
    pub fn convert<S: UnitStore>(&self, ctx: &mut ConvertContext<'_, S>) -> Result<(), ConvertError> {
        let schema = ctx.schema();
        let mut emitter = Emitter::new();

        emitter.writeln(&ctx.library_import_statement());
        emitter.writeln("{");
        emitter.write_field("productId", &Value::String(schema.product().to_string()));
        emitter.write_field("ruleFormat", &Value::String(schema.rule_format().to_string()));
        if let Some(contract_id) = &self.tree.contract_id {
            emitter.write_field("contractId", &Value::String(contract_id.clone()));
        }
        if let Some(group_id) = &self.tree.group_id {
            emitter.write_field("groupId", &Value::String(group_id.clone()));
        }

        emitter.write("rules: ");
        RuleConverter::root(&self.tree.rules).write_body(ctx, &mut emitter)?;
        emitter.writeln(",");
        emitter.writeln("}");

        ctx.materialize(&Self::path(), emitter)?;

        let report = ctx.report();
        tracing::info!(
            rules = self.tree.rules.subtree_len(),
            units = report.len(),
            fingerprint = %report.fingerprint(),
            "converted rule tree"
        );
        Ok(())
    }
}
