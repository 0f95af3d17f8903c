//! akamai-jsonnet command line
//!
//! ## Configuration
//!
//! Environment variables:
//! - `AKAMAI_EDGERC`: credential file (default: `~/.edgerc`)
//! - `AKAMAI_EDGERC_SECTION`: credential section (default: `default`)
//! - `AKAMAI_ACCOUNT_KEY`: account switch key
//! - `PAPI_TIMEOUT_SECS`: request timeout (default: 30)
//! - `JSONNETFMT`: formatter binary, or `off` (default: `jsonnetfmt` on `PATH`)
//! - `RUST_LOG`: log level filter (default: `akamai_jsonnet=info`)
//! - `LOG_FORMAT`: "json" for structured logs, "pretty" for terminals (default: pretty)
//!
//! Logs go to stderr; generated text goes to stdout.
//!
//! ## Usage
//!
//! ```bash
//! akamai-jsonnet papi ruleformat --product-id prd_Fresca > lib/papi/prd_Fresca/latest.libsonnet
//! akamai-jsonnet papi ruletree --product-id prd_Fresca --property-name www.example.com --out template
//! akamai-jsonnet papi ruletree --product-id prd_Fresca --property-name www --file rules.json --schema schema.json
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use akamai_jsonnet::emitter::Emitter;
use akamai_jsonnet::remote::client::LATEST;
use akamai_jsonnet::remote::{PapiClient, RemoteConfig, RemoteError, VersionSelector};
use akamai_jsonnet::{
    convert_rule_tree, render_catalog_library, ConvertError, FsUnitStore, HostnamesConverter,
    JsonnetFmt, RuleTree, SchemaIndex, UnitConverter,
};

/// Errors surfaced by the commands.
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Convert(#[from] ConvertError),
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Parser)]
#[command(name = "akamai-jsonnet", version, about = "Akamai Jsonnet utilities.")]
struct Cli {
    /// Path to the edgerc file.
    #[arg(long, global = true)]
    edgerc: Option<PathBuf>,

    /// Edgerc section.
    #[arg(long, global = true)]
    section: Option<String>,

    /// Account switch key.
    #[arg(long, global = true)]
    accountkey: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Property Manager (PAPI) utilities.
    #[command(subcommand)]
    Papi(PapiCommand),
}

#[derive(Debug, Subcommand)]
enum PapiCommand {
    /// List available products.
    Products {
        #[arg(long, alias = "contractId")]
        contract_id: String,
    },
    /// Print the library for a product and rule format.
    Ruleformat {
        #[arg(long, alias = "productId")]
        product_id: String,
        #[arg(long, alias = "ruleFormat", default_value = LATEST)]
        rule_format: String,
        /// Read the rule format from a file instead of the API.
        #[arg(long)]
        schema: Option<PathBuf>,
    },
    /// Convert a property rule tree into Jsonnet units.
    Ruletree {
        #[arg(long, alias = "productId")]
        product_id: String,
        #[arg(long, alias = "propertyName")]
        property_name: String,
        #[arg(long, alias = "propertyVersion", default_value = LATEST)]
        property_version: VersionSelector,
        #[arg(long, alias = "ruleFormat", default_value = LATEST)]
        rule_format: String,
        /// Read the rule tree from a file instead of the API.
        #[arg(long)]
        file: Option<PathBuf>,
        /// Read the rule format from a file instead of the API.
        #[arg(long)]
        schema: Option<PathBuf>,
        /// Output directory (default: the property name).
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print the hostnames of a property.
    Hostnames {
        #[arg(long, alias = "propertyName")]
        property_name: String,
        #[arg(long, alias = "propertyVersion", default_value = LATEST)]
        property_version: VersionSelector,
    },
}

/// Initialize the tracing subscriber with pretty or JSON format
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "akamai_jsonnet=info".into());

    if log_format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .flatten_event(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}

fn remote_config(cli: &Cli) -> RemoteConfig {
    let mut config = RemoteConfig::from_env();
    if let Some(edgerc) = &cli.edgerc {
        config = config.with_edgerc(edgerc);
    }
    if let Some(section) = &cli.section {
        config = config.with_section(section.clone());
    }
    if let Some(key) = &cli.accountkey {
        config = config.with_account_key(key.clone());
    }
    config
}

/// Creates the API client on first use, so offline runs never need credentials.
struct LazyClient {
    config: RemoteConfig,
    client: Option<PapiClient>,
}

impl LazyClient {
    fn get(&mut self) -> Result<&PapiClient, RemoteError> {
        let client = match self.client.take() {
            Some(client) => client,
            None => PapiClient::from_config(&self.config)?,
        };
        Ok(self.client.insert(client))
    }
}

fn read_file(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn load_schema(
    client: &mut LazyClient,
    product_id: &str,
    rule_format: &str,
    schema: Option<&Path>,
) -> Result<SchemaIndex, CliError> {
    match schema {
        Some(path) => SchemaIndex::from_json_str(&read_file(path)?, product_id, rule_format)
            .map_err(|source| CliError::Json { path: path.to_path_buf(), source }),
        None => Ok(client.get()?.rule_format(product_id, rule_format)?),
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let mut client = LazyClient {
        config: remote_config(&cli),
        client: None,
    };
    let formatter = JsonnetFmt::from_env();

    let Command::Papi(command) = cli.command;
    match command {
        PapiCommand::Products { contract_id } => {
            for product in client.get()?.products(&contract_id)? {
                println!("{}: {}", product.product_name, product.product_id);
            }
        }
        PapiCommand::Ruleformat { product_id, rule_format, schema } => {
            let schema = load_schema(&mut client, &product_id, &rule_format, schema.as_deref())?;
            print!("{}", render_catalog_library(&schema, &formatter)?);
        }
        PapiCommand::Ruletree {
            product_id,
            property_name,
            property_version,
            rule_format,
            file,
            schema,
            out,
        } => {
            let schema = load_schema(&mut client, &product_id, &rule_format, schema.as_deref())?;
            let tree = match file {
                Some(path) => RuleTree::from_json_str(&read_file(&path)?)
                    .map_err(|source| CliError::Json { path: path.clone(), source })?,
                None => {
                    let api = client.get()?;
                    let version = api.resolve_version(&property_name, property_version)?;
                    api.rule_tree(&version, Some(schema.rule_format()))?
                }
            };

            let out = out.unwrap_or_else(|| PathBuf::from(&property_name));
            let report = convert_rule_tree(&schema, &tree, FsUnitStore::new(&out), &formatter)?;
            info!(
                out = %out.display(),
                units = report.len(),
                fingerprint = %report.fingerprint(),
                "wrote rule tree"
            );
        }
        PapiCommand::Hostnames { property_name, property_version } => {
            let api = client.get()?;
            let version = api.resolve_version(&property_name, property_version)?;
            let hostnames = api.hostnames(&version)?;

            let mut emitter = Emitter::new();
            HostnamesConverter::new(&hostnames).convert(&mut emitter)?;
            print!("{}", emitter.finish(&formatter));
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "command failed");
            ExitCode::FAILURE
        }
    }
}
