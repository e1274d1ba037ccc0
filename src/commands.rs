//! Command line front end.

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::authz::loader;
use crate::authz::table;
use crate::authz::validation;
use crate::authz::{
    AcceptableClaim, AuthzBuilder, AuthzOptions, Method, PermissionsDocument, SchemeType,
};
use crate::errors::AppError;
use crate::settings::Settings;

#[derive(Parser, Debug)]
#[command(
    name = "scopewise",
    version,
    about = "Permission catalog validation and least privilege lookup"
)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "scopewise.toml", global = true)]
    pub config: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone, Default)]
pub struct CatalogArgs {
    /// Permissions catalog file
    #[arg(short, long, conflicts_with = "folder")]
    pub file: Option<PathBuf>,

    /// Directory of permissions catalog files
    #[arg(long)]
    pub folder: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check a catalog for structural errors.
    Validate {
        #[command(flatten)]
        catalog: CatalogArgs,

        /// Canonicalize path placeholders before comparing paths
        #[arg(long)]
        lenient: bool,
    },

    /// Show the claims accepted for a URL.
    Query {
        #[command(flatten)]
        catalog: CatalogArgs,

        /// Request URL, e.g. /me/events/123
        #[arg(short, long)]
        url: String,

        /// HTTP method
        #[arg(short, long)]
        method: Option<Method>,

        /// Permission scheme, e.g. DelegatedWork
        #[arg(short, long)]
        scheme: Option<SchemeType>,

        /// Also print the least privileged permissions
        #[arg(long)]
        least: bool,

        /// Provisioning table attached to claims
        #[arg(long)]
        deployments: Option<PathBuf>,

        #[arg(long)]
        lenient: bool,
    },

    /// Print the Markdown permissions table for an operation.
    Document {
        #[command(flatten)]
        catalog: CatalogArgs,

        #[arg(short, long)]
        url: String,

        #[arg(short, long)]
        method: Method,

        /// Emit a "Not supported." table when the operation is unknown
        #[arg(long = "default")]
        generate_default: bool,
    },
}

/// Run a parsed command, writing its report to `out`. Returns the process
/// exit code.
pub fn run(cli: Cli, settings: &Settings, out: &mut dyn Write) -> Result<u8, AppError> {
    match cli.command {
        Command::Validate { catalog, lenient } => {
            let doc = load_catalog(&catalog, settings)?;
            let options = AuthzOptions {
                lenient_match: lenient || settings.matching.lenient,
            };
            let errors = validation::validate(&doc, options);
            if errors.is_empty() {
                writeln!(out, "No errors found")?;
                return Ok(0);
            }
            for error in &errors {
                writeln!(out, "{error}")?;
            }
            tracing::warn!(errors = errors.len(), "Permissions catalog has errors");
            Ok(1)
        }

        Command::Query {
            catalog,
            url,
            method,
            scheme,
            least,
            deployments,
            lenient,
        } => {
            let doc = load_catalog(&catalog, settings)?;
            let mut builder = AuthzBuilder::new(AuthzOptions {
                lenient_match: lenient || settings.matching.lenient,
            });
            match deployments.as_deref().or(settings.catalog.deployments.as_deref()) {
                Some(path) => builder.load_with_deployments(&doc, &loader::load_deployments(path)?),
                None => builder.load(&doc),
            }
            let state = builder.freeze();

            let Some(resource) = state.find_resource(&url) else {
                writeln!(out, "No resource found for `{url}`")?;
                return Ok(1);
            };

            // claims are listed least privileged first
            match (method, scheme) {
                (Some(method), Some(scheme)) => {
                    let claims = resource.sorted_claims(method, scheme);
                    serde_json::to_writer_pretty(&mut *out, &claims)?;
                }
                (Some(method), None) => match resource.sorted_schemes(method) {
                    Some(schemes) => serde_json::to_writer_pretty(&mut *out, &schemes)?,
                    None => {
                        writeln!(out, "Method {method} is not supported for `{url}`")?;
                        return Ok(1);
                    }
                },
                (None, scheme) => {
                    let methods = resource
                        .supported_methods()
                        .keys()
                        .filter_map(|method| {
                            let mut schemes = resource.sorted_schemes(*method)?;
                            if let Some(wanted) = scheme {
                                schemes.retain(|current, _| *current == wanted);
                            }
                            Some((*method, schemes))
                        })
                        .collect();
                    let view = ResourceView {
                        url: resource.url(),
                        methods,
                    };
                    serde_json::to_writer_pretty(&mut *out, &view)?;
                }
            }
            writeln!(out)?;

            if least {
                let map = resource.fetch_least_privilege(method, scheme)?;
                write!(out, "{}", table::format_least_privilege(&map))?;
            }
            Ok(0)
        }

        Command::Document {
            catalog,
            url,
            method,
            generate_default,
        } => {
            let doc = load_catalog(&catalog, settings)?;
            let mut builder = AuthzBuilder::new(AuthzOptions { lenient_match: true });
            builder.load(&doc);
            let state = builder.freeze();
            let markdown = table::generate_permissions_table(&state, &url, method, generate_default)?;
            writeln!(out, "{markdown}")?;
            Ok(0)
        }
    }
}

/// `query` output for a whole resource.
#[derive(Serialize)]
struct ResourceView<'a> {
    url: &'a str,
    methods: BTreeMap<Method, BTreeMap<SchemeType, Vec<&'a AcceptableClaim>>>,
}

/// Command line catalog arguments win over the configured ones.
fn load_catalog(args: &CatalogArgs, settings: &Settings) -> Result<PermissionsDocument, AppError> {
    let (file, folder): (Option<&Path>, Option<&Path>) = if args.file.is_some() || args.folder.is_some() {
        (args.file.as_deref(), args.folder.as_deref())
    } else {
        (
            settings.catalog.file.as_deref(),
            settings.catalog.folder.as_deref(),
        )
    };

    match (file, folder) {
        (Some(file), _) => Ok(loader::load_document(file)?),
        (None, Some(folder)) => Ok(loader::load_folder(folder)?),
        (None, None) => Err(AppError::BadRequest(
            "Please provide a source permissions file or folder".to_string(),
        )),
    }
}
