use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::authz::errors::AuthzError;

/// Authorization context under which a permission can be granted.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum SchemeType {
    DelegatedWork,
    DelegatedPersonal,
    Application,
    ResourceSpecificConsent,
}

impl SchemeType {
    pub const ALL: [SchemeType; 4] = [
        SchemeType::DelegatedWork,
        SchemeType::DelegatedPersonal,
        SchemeType::Application,
        SchemeType::ResourceSpecificConsent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SchemeType::DelegatedWork => "DelegatedWork",
            SchemeType::DelegatedPersonal => "DelegatedPersonal",
            SchemeType::Application => "Application",
            SchemeType::ResourceSpecificConsent => "ResourceSpecificConsent",
        }
    }

    /// Human readable name used in documentation tables.
    pub fn display_name(&self) -> &'static str {
        match self {
            SchemeType::DelegatedWork => "Delegated (work or school account)",
            SchemeType::DelegatedPersonal => "Delegated (personal Microsoft account)",
            SchemeType::Application => "Application",
            SchemeType::ResourceSpecificConsent => "Resource specific consent",
        }
    }
}

impl fmt::Display for SchemeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemeType {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        SchemeType::ALL
            .into_iter()
            .find(|scheme| scheme.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| AuthzError::UnknownScheme(s.to_string()))
    }
}

/// HTTP method of a request.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl Method {
    pub const ALL: [Method; 7] = [
        Method::Get,
        Method::Post,
        Method::Put,
        Method::Patch,
        Method::Delete,
        Method::Head,
        Method::Options,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Method::ALL
            .into_iter()
            .find(|method| method.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| AuthzError::UnknownMethod(s.to_string()))
    }
}

/// Outcome of a point access check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AccessRequestResult {
    Success,
    MissingResource,
    UnsupportedMethod,
    UnsupportedScheme,
    InsufficientPermissions,
}

// ---------- Catalog types ----------

/// Consent and display metadata of a permission for one scheme.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Scheme {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_description: Option<String>,
    #[serde(skip_serializing_if = "is_false")]
    pub requires_admin_consent: bool,
    #[serde(skip_serializing_if = "is_zero")]
    pub privilege_level: i32,
}

/// A bundle of methods x schemes x paths sharing one set of constraints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PathSet {
    pub scheme_keys: BTreeSet<SchemeType>,
    pub methods: BTreeSet<Method>,
    /// path -> constraint string, e.g. `least=Application;AlsoRequires=Foo.Read`
    pub paths: BTreeMap<String, Option<String>>,
    /// Comma separated co-requirement applied when a path declares none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub also_requires: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub included_properties: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub excluded_properties: Vec<String>,
}

impl PathSet {
    pub fn new(
        methods: impl IntoIterator<Item = Method>,
        schemes: impl IntoIterator<Item = SchemeType>,
    ) -> Self {
        Self {
            methods: methods.into_iter().collect(),
            scheme_keys: schemes.into_iter().collect(),
            ..Default::default()
        }
    }

    pub fn with_path(mut self, path: &str, constraints: Option<&str>) -> Self {
        self.paths
            .insert(path.to_string(), constraints.map(|c| c.to_string()));
        self
    }

    pub fn with_also_requires(mut self, permission: &str) -> Self {
        self.also_requires = Some(permission.to_string());
        self
    }

    /// The pathset-wide co-requirement default as a list.
    pub fn default_also_requires(&self) -> Vec<String> {
        self.also_requires
            .as_deref()
            .map(split_list)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OwnerInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_security_group: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProvisioningInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<SchemeType>,
    #[serde(skip_serializing_if = "is_false")]
    pub is_hidden: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub is_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_app_id: Option<String>,
}

/// A named permission and everything it grants.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Permission {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "is_false")]
    pub implicit: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub is_hidden: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub privilege_level: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required_environments: Vec<String>,
    pub schemes: BTreeMap<SchemeType, Scheme>,
    pub path_sets: Vec<PathSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_info: Option<OwnerInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning_info: Option<ProvisioningInfo>,
}

impl Permission {
    /// Declares the given schemes with empty metadata.
    pub fn with_schemes(schemes: impl IntoIterator<Item = SchemeType>) -> Self {
        Self {
            schemes: schemes
                .into_iter()
                .map(|scheme| (scheme, Scheme::default()))
                .collect(),
            ..Default::default()
        }
    }

    pub fn with_path_set(mut self, path_set: PathSet) -> Self {
        self.path_sets.push(path_set);
        self
    }

    pub fn supports_scheme(&self, scheme: SchemeType) -> bool {
        self.schemes.contains_key(&scheme)
    }
}

/// The permission catalog: permission name -> permission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PermissionsDocument {
    #[serde(rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    pub permissions: BTreeMap<String, Permission>,
}

impl PermissionsDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_permission(mut self, name: &str, permission: Permission) -> Self {
        self.permissions.insert(name.to_string(), permission);
        self
    }

    /// Merge `other` into this document. Returns the names that were replaced.
    pub fn merge(&mut self, other: PermissionsDocument) -> Vec<String> {
        let mut replaced = Vec::new();
        for (name, permission) in other.permissions {
            if self.permissions.insert(name.clone(), permission).is_some() {
                replaced.push(name);
            }
        }
        replaced
    }
}

/// Side-loaded provisioning table: permission name -> deployments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PermissionsDeployment {
    pub permission_deployments: BTreeMap<String, Vec<ProvisioningInfo>>,
}

impl PermissionsDeployment {
    pub fn provisioning_for(
        &self,
        permission: &str,
        scheme: SchemeType,
    ) -> Option<&ProvisioningInfo> {
        self.permission_deployments
            .get(permission)?
            .iter()
            .find(|info| info.scheme == Some(scheme))
    }
}

/// Split a comma separated list, dropping blanks.
pub(crate) fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| item.to_string())
        .collect()
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_zero(value: &i32) -> bool {
    *value == 0
}
