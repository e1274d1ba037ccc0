use miette::{IntoDiagnostic, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::authz::AuthzOptions;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub catalog: Catalog,
    pub matching: Matching,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Catalog {
    /// Single JSON permissions catalog
    pub file: Option<PathBuf>,
    /// Directory of `*.json` catalogs, merged in path order
    pub folder: Option<PathBuf>,
    /// Optional provisioning table attached to claims
    pub deployments: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Matching {
    /// Canonicalize `{param}` placeholders and OData `(key)` segments
    #[serde(default)]
    pub lenient: bool,
}

impl Settings {
    pub fn load(path: &str) -> Result<Self> {
        let mut builder = config::Config::builder()
            .set_default("matching.lenient", Matching::default().lenient)
            .into_diagnostic()?;

        // Optional file
        if Path::new(path).exists() {
            builder = builder.add_source(config::File::with_name(path));
        }

        // Environment overrides: SCOPEWISE__MATCHING__LENIENT=true, etc.
        builder = builder.add_source(config::Environment::with_prefix("SCOPEWISE").separator("__"));

        let cfg = builder.build().into_diagnostic()?;
        let mut s: Settings = cfg.try_deserialize().into_diagnostic()?;

        // Normalize catalog paths to be relative to current dir
        let cwd = std::env::current_dir().into_diagnostic()?;
        for p in [
            &mut s.catalog.file,
            &mut s.catalog.folder,
            &mut s.catalog.deployments,
        ]
        .into_iter()
        .flatten()
        {
            if p.is_relative() {
                *p = cwd.join(&*p);
            }
        }

        Ok(s)
    }

    pub fn authz_options(&self) -> AuthzOptions {
        AuthzOptions {
            lenient_match: self.matching.lenient,
        }
    }
}
