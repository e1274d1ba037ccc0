//! Structural checks over a permissions catalog.
//!
//! Findings are collected as [`PermissionsError`] values; a malformed catalog
//! never produces an `Err`.

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

use crate::authz::constraints::PathConstraints;
use crate::authz::engine::{AuthzBuilder, AuthzOptions};
use crate::authz::resource::ProtectedResource;
use crate::authz::types::{Method, PathSet, Permission, PermissionsDocument, SchemeType};


#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum PermissionsErrorCode {
    DuplicateLeastPrivilegeScopes,
    InvalidLeastPrivilegeScheme,
    InvalidPathsetScheme,
    MissingLeastPrivilegePermission,
    InvalidAlsoRequiresPermission,
    DuplicatePathsetEntry,
}

impl fmt::Display for PermissionsErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// One catalog defect, tied to the normalized path it was found on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionsError {
    pub path: String,
    pub code: PermissionsErrorCode,
    pub message: String,
}

impl PermissionsError {
    fn new(path: &str, code: PermissionsErrorCode, message: String) -> Self {
        Self {
            path: path.to_string(),
            code,
            message,
        }
    }
}

impl fmt::Display for PermissionsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] {}", self.code, self.path, self.message)
    }
}

/// Decides whether several least privileged scopes on one method and scheme
/// are an acceptable overlap rather than a catalog defect.
pub trait DuplicateScopeFilter {
    fn is_false_positive(&self, method: Method, scopes: &BTreeSet<String>) -> bool;
}

impl<F> DuplicateScopeFilter for F
where
    F: Fn(Method, &BTreeSet<String>) -> bool,
{
    fn is_false_positive(&self, method: Method, scopes: &BTreeSet<String>) -> bool {
        self(method, scopes)
    }
}

/// Duplicate least privileged scopes on GET are acceptable when every scope
/// carries the same verb root, e.g. `Foo.Read`, `Bar.Read` and
/// `Foo.ReadBasic` all grant one effective `Read` privilege.
///
/// The verb is the second dotted segment of the scope name; a `Basic`
/// suffix is folded into its root.
#[derive(Debug, Clone, Copy, Default)]
pub struct VerbRootFilter;

impl VerbRootFilter {
    fn verb_root(scope: &str) -> Option<&str> {
        let verb = scope.split('.').nth(1).filter(|verb| !verb.is_empty())?;
        Some(
            verb.strip_suffix("Basic")
                .filter(|root| !root.is_empty())
                .unwrap_or(verb),
        )
    }
}

impl DuplicateScopeFilter for VerbRootFilter {
    fn is_false_positive(&self, method: Method, scopes: &BTreeSet<String>) -> bool {
        if method != Method::Get {
            return false;
        }
        let mut roots = scopes.iter().map(|scope| Self::verb_root(scope));
        match roots.next() {
            Some(Some(first)) => roots.all(|root| root == Some(first)),
            _ => false,
        }
    }
}

/// Checks for one (permission, pathset, path) visited during inversion.
pub(crate) fn check_path_set(
    doc: &PermissionsDocument,
    name: &str,
    permission: &Permission,
    path_set: &PathSet,
    path: &str,
    constraints: &PathConstraints,
) -> Vec<PermissionsError> {
    let mut errors = Vec::new();

    let declared = join(permission.schemes.keys());
    for scheme in &path_set.scheme_keys {
        if !permission.supports_scheme(*scheme) {
            errors.push(PermissionsError::new(
                path,
                PermissionsErrorCode::InvalidPathsetScheme,
                format!(
                    "Pathset Scheme '{scheme}' for scope '{name}' is not declared by the permission. Declared Schemes: {declared}"
                ),
            ));
        }
    }

    let unexpected: Vec<SchemeType> = constraints
        .least
        .iter()
        .copied()
        .filter(|scheme| !path_set.scheme_keys.contains(scheme))
        .collect();
    if !unexpected.is_empty() {
        errors.push(PermissionsError::new(
            path,
            PermissionsErrorCode::InvalidLeastPrivilegeScheme,
            format!(
                "Unexpected Least Privilege Scheme '{}' for scope '{name}'. Expected Schemes: {}",
                join(unexpected.iter()),
                join(path_set.scheme_keys.iter()),
            ),
        ));
    }

    for target in &constraints.also_requires {
        let message = match doc.permissions.get(target) {
            None => format!("AlsoRequires Permission '{target}' for scope '{name}' does not exist"),
            Some(other) => {
                let missing: Vec<&SchemeType> = path_set
                    .scheme_keys
                    .iter()
                    .filter(|scheme| !other.supports_scheme(**scheme))
                    .collect();
                if missing.is_empty() {
                    continue;
                }
                format!(
                    "AlsoRequires Permission '{target}' for scope '{name}' does not support schemes: {}",
                    join(missing.into_iter())
                )
            }
        };
        errors.push(PermissionsError::new(
            path,
            PermissionsErrorCode::InvalidAlsoRequiresPermission,
            message,
        ));
    }

    errors
}

pub(crate) fn duplicate_entry(
    name: &str,
    path: &str,
    scheme: SchemeType,
    method: Method,
) -> PermissionsError {
    PermissionsError::new(
        path,
        PermissionsErrorCode::DuplicatePathsetEntry,
        format!(
            "Duplicate pathset entry. Permission: '{name}' Path: '{path}' Scheme: '{scheme}' Method: '{method}'"
        ),
    )
}

/// Duplicate and missing least privilege declarations on one resource.
pub(crate) fn check_least_privilege(
    resource: &ProtectedResource,
    filter: &dyn DuplicateScopeFilter,
) -> Vec<PermissionsError> {
    let mut errors = Vec::new();
    for (method, schemes) in resource.supported_methods() {
        for (scheme, claims) in schemes {
            if claims.is_empty() {
                continue;
            }
            let least = resource.least_permissions(*method, *scheme);
            if least.is_empty() {
                errors.push(PermissionsError::new(
                    resource.url(),
                    PermissionsErrorCode::MissingLeastPrivilegePermission,
                    format!("Missing Least Privilege Permission for Scheme '{scheme}' for Method '{method}'"),
                ));
            } else if least.len() > 1 && !filter.is_false_positive(*method, &least) {
                errors.push(PermissionsError::new(
                    resource.url(),
                    PermissionsErrorCode::DuplicateLeastPrivilegeScopes,
                    format!(
                        "Duplicate Least Privilege Scopes {} for Scheme '{scheme}' for Method '{method}'",
                        join(least.iter())
                    ),
                ));
            }
        }
    }
    errors
}

/// Validate a catalog on a fresh builder.
pub fn validate(doc: &PermissionsDocument, options: AuthzOptions) -> BTreeSet<PermissionsError> {
    AuthzBuilder::new(options).validate(doc)
}

fn join<T: fmt::Display>(items: impl Iterator<Item = T>) -> String {
    items.map(|item| item.to_string()).collect::<Vec<_>>().join(", ")
}
