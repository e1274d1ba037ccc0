use std::path::Path;

use serde::de::DeserializeOwned;

use crate::authz::errors::AuthzError;
use crate::authz::types::{PermissionsDeployment, PermissionsDocument};

/// Load a single JSON permissions catalog.
pub fn load_document(path: &Path) -> Result<PermissionsDocument, AuthzError> {
    let doc: PermissionsDocument = read_json(path)?;
    tracing::info!(
        file = %path.display(),
        permissions = doc.permissions.len(),
        "Loaded permissions catalog"
    );
    Ok(doc)
}

/// Parse a catalog from a string. `label` names the source in errors.
pub fn parse_document(contents: &str, label: &str) -> Result<PermissionsDocument, AuthzError> {
    serde_json::from_str(contents).map_err(|source| AuthzError::CatalogParse {
        path: label.to_string(),
        source,
    })
}

/// Load all `.json` catalogs from the given directory and merge them into one
/// document. Files are read in path order; later files override earlier
/// permissions of the same name.
pub fn load_folder(dir: &Path) -> Result<PermissionsDocument, AuthzError> {
    if !dir.is_dir() {
        return Err(AuthzError::InvalidCatalog(format!(
            "catalog directory `{}` does not exist or is not a directory",
            dir.display()
        )));
    }

    let mut entries: Vec<_> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().map(|ext| ext == "json").unwrap_or(false))
        .collect();
    entries.sort();

    let mut merged = PermissionsDocument::new();
    for path in &entries {
        let doc: PermissionsDocument = read_json(path)?;
        if merged.schema.is_none() {
            merged.schema = doc.schema.clone();
        }
        for name in merged.merge(doc) {
            tracing::warn!(
                permission = %name,
                file = %path.display(),
                "Permission redefined by later catalog file"
            );
        }
    }

    tracing::info!(
        files = entries.len(),
        permissions = merged.permissions.len(),
        "Loaded permissions catalogs"
    );

    Ok(merged)
}

/// Load a provisioning table.
pub fn load_deployments(path: &Path) -> Result<PermissionsDeployment, AuthzError> {
    let deployments: PermissionsDeployment = read_json(path)?;
    tracing::info!(
        file = %path.display(),
        permissions = deployments.permission_deployments.len(),
        "Loaded permission deployments"
    );
    Ok(deployments)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, AuthzError> {
    let contents = std::fs::read_to_string(path).map_err(|source| AuthzError::CatalogLoad {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| AuthzError::CatalogParse {
        path: path.display().to_string(),
        source,
    })
}
