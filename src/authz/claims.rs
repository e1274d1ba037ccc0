use serde::{Serialize, Serializer};
use std::fmt;

use crate::authz::errors::AuthzError;
use crate::authz::types::ProvisioningInfo;

/// One permission's eligibility for a single path, method and scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptableClaim {
    pub permission: String,
    #[serde(skip_serializing_if = "is_false")]
    pub least: bool,
    #[serde(
        serialize_with = "serialize_joined",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub also_requires: Vec<String>,
    #[serde(skip)]
    pub is_hidden: bool,
    #[serde(skip)]
    pub is_enabled: bool,
    #[serde(skip)]
    pub supported_environments: Vec<String>,
}

impl AcceptableClaim {
    pub fn new(permission: &str, least: bool, also_requires: Vec<String>) -> Self {
        Self {
            permission: permission.to_string(),
            least,
            also_requires,
            is_hidden: false,
            is_enabled: false,
            supported_environments: Vec::new(),
        }
    }

    /// Copy deployment flags from a provisioning record.
    pub fn with_provisioning(mut self, info: &ProvisioningInfo) -> Self {
        self.is_hidden = info.is_hidden;
        self.is_enabled = info.is_enabled;
        self.supported_environments = info.environment.iter().cloned().collect();
        self
    }

    // TODO: enforce also_requires once callers pass complete permission sets
    pub fn is_authorized(&self, provided: &[&str]) -> bool {
        provided.contains(&self.permission.as_str())
    }

    /// The single permission this claim must be combined with, if any.
    pub fn partner(&self) -> Result<Option<&str>, AuthzError> {
        match self.also_requires.as_slice() {
            [] => Ok(None),
            [partner] => Ok(Some(partner.as_str())),
            _ => Err(AuthzError::UnsupportedAlsoRequires {
                permission: self.permission.clone(),
                also_requires: self.also_requires.join(", "),
            }),
        }
    }

    /// Display label: `Foo.Read` or `Foo.Read and Bar.Read` for paired claims.
    pub fn label(&self) -> Result<String, AuthzError> {
        Ok(match self.partner()? {
            Some(partner) => format!("{} and {}", self.permission, partner),
            None => self.permission.clone(),
        })
    }

    pub fn pair(&self) -> Result<Option<PermissionPair>, AuthzError> {
        Ok(self
            .partner()?
            .map(|partner| PermissionPair::new(&self.permission, partner)))
    }

    /// Same permission and co-requirements, ignoring the least flag and
    /// deployment metadata.
    pub fn same_grant(&self, other: &AcceptableClaim) -> bool {
        self.permission == other.permission && self.also_requires == other.also_requires
    }
}

/// Unordered pair of permissions: `(A, B)` and `(B, A)` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PermissionPair {
    first: String,
    second: String,
}

impl PermissionPair {
    pub fn new(a: &str, b: &str) -> Self {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        Self {
            first: first.to_string(),
            second: second.to_string(),
        }
    }

    pub fn contains(&self, permission: &str) -> bool {
        self.first == permission || self.second == permission
    }
}

impl fmt::Display for PermissionPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} and {}", self.first, self.second)
    }
}

#[allow(clippy::ptr_arg)]
fn serialize_joined<S: Serializer>(values: &Vec<String>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&values.join(","))
}

fn is_false(value: &bool) -> bool {
    !*value
}
