pub mod claims;
pub mod constraints;
pub mod engine;
pub mod errors;
pub mod loader;
pub mod path;
pub mod resource;
pub mod table;
pub mod types;
pub mod url_tree;
pub mod validation;

use std::collections::BTreeMap;

pub use claims::{AcceptableClaim, PermissionPair};
pub use engine::{AuthzBuilder, AuthzOptions};
pub use errors::AuthzError;
pub use resource::{LeastPrivilegeMap, PrivilegeSummary, ProtectedResource};
pub use types::{AccessRequestResult, Method, PermissionsDeployment, PermissionsDocument, SchemeType};
pub use validation::{DuplicateScopeFilter, PermissionsError, PermissionsErrorCode, VerbRootFilter};

use url_tree::UrlTree;

/// Path-centric authorization state built from one or more permission catalogs.
/// Immutable after [`AuthzBuilder::freeze`]; loading more catalogs requires a new builder.
#[derive(Debug)]
pub struct AuthzState {
    options: AuthzOptions,
    /// normalized path -> resource
    resources: BTreeMap<String, ProtectedResource>,
    url_tree: UrlTree,
}

impl AuthzState {
    pub fn options(&self) -> AuthzOptions {
        self.options
    }

    pub fn resources(&self) -> &BTreeMap<String, ProtectedResource> {
        &self.resources
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
