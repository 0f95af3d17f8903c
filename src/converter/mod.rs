//! Rule tree and catalog converters.
//!
//! ## Architecture
//!
//! ```text
//! RuleTreeConverter → RuleConverter (recursive, post-order) → AtomEncoder / leaf converters
//!                            ↓
//!                     ConvertContext → Formatter → UnitStore
//!
//! CatalogLibraryConverter → SchemaIndex   (independent entry point)
//! ```
//!
//! Units are rendered into an [`Emitter`] first and only handed to the
//! store once complete, so a failing lookup never leaves a partial file for
//! the node being rendered.

pub mod atom;
pub mod leaf;
pub mod rule;
pub mod ruletree;
pub mod catalog;

use crate::canonical::ConversionReport;
use crate::emitter::Emitter;
use crate::format::Formatter;
use crate::schema::{SchemaIndex, SchemaLookupError};
use crate::store::UnitStore;
use crate::types::RuleTree;

pub use atom::AtomEncoder;
pub use leaf::{HostnamesConverter, VariablesConverter, HOSTNAME_KEYS, VARIABLE_KEYS};
pub use rule::RuleConverter;
pub use ruletree::RuleTreeConverter;
pub use catalog::CatalogLibraryConverter;

/// Default local name bound to the imported catalog library.
pub const DEFAULT_LIBRARY_ALIAS: &str = "papi";

/// Error type for converter operations.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// Catalog lookup failed.
    #[error("Schema lookup failed: {0}")]
    SchemaLookup(#[from] SchemaLookupError),
    /// Store error.
    #[error("Store error: {0}")]
    Store(String),
    /// A value could not be encoded.
    #[error("Encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ConvertError {
    /// Create a store error from any error type.
    pub fn from_store<E: std::error::Error>(e: E) -> Self {
        Self::Store(e.to_string())
    }
}

/// Converters that render one self-contained unit.
pub trait UnitConverter {
    /// Write the unit text.
    fn convert(&self, emitter: &mut Emitter) -> Result<(), ConvertError>;
}

/// Converter settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Local name the catalog library is imported under.
    pub library_alias: String,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            library_alias: DEFAULT_LIBRARY_ALIAS.to_string(),
        }
    }
}

/// State of one conversion run: inputs, output sink and write log.
pub struct ConvertContext<'a, S: UnitStore> {
    schema: &'a SchemaIndex,
    store: S,
    formatter: &'a dyn Formatter,
    options: ConvertOptions,
    report: ConversionReport,
}

impl<'a, S: UnitStore> ConvertContext<'a, S> {
    /// Create a context with default options.
    pub fn new(schema: &'a SchemaIndex, store: S, formatter: &'a dyn Formatter) -> Self {
        Self {
            schema,
            store,
            formatter,
            options: ConvertOptions::default(),
            report: ConversionReport::new(),
        }
    }

    /// Replace the options.
    pub fn with_options(mut self, options: ConvertOptions) -> Self {
        self.options = options;
        self
    }

    /// The catalog.
    pub fn schema(&self) -> &'a SchemaIndex {
        self.schema
    }

    /// The options.
    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// `local <alias> = import '<library>';`
    pub fn library_import_statement(&self) -> String {
        format!(
            "local {} = import '{}';",
            self.options.library_alias,
            self.schema.library_import_path()
        )
    }

    /// Format a finished unit and store it. Returns once the store has it.
    pub fn materialize(&mut self, path: &str, emitter: Emitter) -> Result<(), ConvertError> {
        let text = emitter.finish(self.formatter);
        self.put(path, &text)
    }

    /// Store text verbatim, without the formatting pass.
    pub fn materialize_raw(&mut self, path: &str, text: &str) -> Result<(), ConvertError> {
        self.put(path, text)
    }

    fn put(&mut self, path: &str, text: &str) -> Result<(), ConvertError> {
        self.store.put(path, text).map_err(ConvertError::from_store)?;
        self.report.record(path, text);
        tracing::debug!(path = path, bytes = text.len(), "materialized unit");
        Ok(())
    }

    /// Files written so far.
    pub fn report(&self) -> &ConversionReport {
        &self.report
    }

    /// Finish the run, returning the store and the write report.
    pub fn into_parts(self) -> (S, ConversionReport) {
        (self.store, self.report)
    }
}

/// Convert a whole rule tree into `store`.
///
/// Descendant units are stored before their ancestors; `rules.jsonnet` is
/// stored last.
pub fn convert_rule_tree<S: UnitStore>(
    schema: &SchemaIndex,
    tree: &RuleTree,
    store: S,
    formatter: &dyn Formatter,
) -> Result<ConversionReport, ConvertError> {
    let mut ctx = ConvertContext::new(schema, store, formatter);
    RuleTreeConverter::new(tree).convert(&mut ctx)?;
    let (_, report) = ctx.into_parts();
    Ok(report)
}

/// Render the catalog library for `schema`.
pub fn render_catalog_library(
    schema: &SchemaIndex,
    formatter: &dyn Formatter,
) -> Result<String, ConvertError> {
    let mut emitter = Emitter::new();
    CatalogLibraryConverter::new(schema).convert(&mut emitter)?;
    Ok(emitter.finish(formatter))
}
