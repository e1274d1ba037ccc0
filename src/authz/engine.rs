use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::authz::claims::AcceptableClaim;
use crate::authz::constraints::PathConstraints;
use crate::authz::path::{normalize_path, request_segments};
use crate::authz::resource::ProtectedResource;
use crate::authz::types::{
    AccessRequestResult, Method, PermissionsDeployment, PermissionsDocument, SchemeType,
};
use crate::authz::url_tree::UrlTreeBuilder;
use crate::authz::validation::{self, DuplicateScopeFilter, PermissionsError, VerbRootFilter};
use crate::authz::AuthzState;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthzOptions {
    /// Canonicalize placeholders and OData parenthetical segments in both
    /// catalog paths and request URLs.
    pub lenient_match: bool,
}

/// Mutable loading phase. Catalogs are inverted into per-path resources;
/// [`AuthzBuilder::freeze`] turns the result into a queryable [`AuthzState`].
pub struct AuthzBuilder {
    options: AuthzOptions,
    resources: BTreeMap<String, ProtectedResource>,
    /// Path keys in the order inversion first saw them
    first_seen: Vec<String>,
    duplicate_filter: Box<dyn DuplicateScopeFilter>,
}

impl fmt::Debug for AuthzBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthzBuilder")
            .field("options", &self.options)
            .field("resources", &self.resources.len())
            .finish_non_exhaustive()
    }
}

impl AuthzBuilder {
    pub fn new(options: AuthzOptions) -> Self {
        Self {
            options,
            resources: BTreeMap::new(),
            first_seen: Vec::new(),
            duplicate_filter: Box::new(VerbRootFilter),
        }
    }

    /// Replace the predicate that suppresses acceptable duplicate least
    /// privileged scopes during validation.
    pub fn with_duplicate_filter(mut self, filter: impl DuplicateScopeFilter + 'static) -> Self {
        self.duplicate_filter = Box::new(filter);
        self
    }

    pub fn options(&self) -> AuthzOptions {
        self.options
    }

    pub fn resources(&self) -> &BTreeMap<String, ProtectedResource> {
        &self.resources
    }

    /// Add a catalog. Repeated loads accumulate claims.
    pub fn load(&mut self, doc: &PermissionsDocument) {
        self.invert(doc, None, None);
    }

    /// Add a catalog, attaching deployment metadata to every claim.
    pub fn load_with_deployments(
        &mut self,
        doc: &PermissionsDocument,
        deployments: &PermissionsDeployment,
    ) {
        self.invert(doc, Some(deployments), None);
    }

    /// Load `doc` and report every structural defect found in the resulting
    /// resource set.
    pub fn validate(&mut self, doc: &PermissionsDocument) -> BTreeSet<PermissionsError> {
        let mut errors = BTreeSet::new();
        self.invert(doc, None, Some(&mut errors));
        for resource in self.resources.values() {
            errors.extend(validation::check_least_privilege(
                resource,
                self.duplicate_filter.as_ref(),
            ));
        }
        tracing::info!(
            permissions = doc.permissions.len(),
            resources = self.resources.len(),
            errors = errors.len(),
            "Validated permissions catalog"
        );
        errors
    }

    fn invert(
        &mut self,
        doc: &PermissionsDocument,
        deployments: Option<&PermissionsDeployment>,
        mut errors: Option<&mut BTreeSet<PermissionsError>>,
    ) {
        let lenient = self.options.lenient_match;
        for (name, permission) in &doc.permissions {
            for path_set in &permission.path_sets {
                let default_also_requires = path_set.default_also_requires();
                for (path, value) in &path_set.paths {
                    let constraints =
                        PathConstraints::parse(value.as_deref(), &default_also_requires);
                    let key = normalize_path(path, lenient);

                    if let Some(errors) = errors.as_deref_mut() {
                        errors.extend(validation::check_path_set(
                            doc,
                            name,
                            permission,
                            path_set,
                            &key,
                            &constraints,
                        ));
                    }

                    let resource = match self.resources.entry(key.clone()) {
                        Entry::Occupied(entry) => entry.into_mut(),
                        Entry::Vacant(entry) => {
                            self.first_seen.push(key.clone());
                            entry.insert(ProtectedResource::new(&key))
                        }
                    };
                    for method in &path_set.methods {
                        resource.add_method(*method);
                        for scheme in &path_set.scheme_keys {
                            let mut claim = AcceptableClaim::new(
                                name,
                                constraints.is_least(*scheme),
                                constraints.also_requires.clone(),
                            );
                            if let Some(info) =
                                deployments.and_then(|d| d.provisioning_for(name, *scheme))
                            {
                                claim = claim.with_provisioning(info);
                            }
                            let first_time = resource.add_claim(*method, *scheme, claim);
                            if !first_time {
                                if let Some(errors) = errors.as_deref_mut() {
                                    errors.insert(validation::duplicate_entry(
                                        name, &key, *scheme, *method,
                                    ));
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    /// Build the URL tree and hand everything over to an immutable state.
    ///
    /// Paths are attached in first-seen order (permission name, then pathset,
    /// then path), so that order decides which `{param}` sibling a node
    /// falls back to.
    pub fn freeze(self) -> AuthzState {
        let mut tree = UrlTreeBuilder::new();
        for key in &self.first_seen {
            tree.attach(key);
        }
        let url_tree = tree.freeze();

        tracing::info!(
            resources = self.resources.len(),
            paths = url_tree.len(),
            lenient = self.options.lenient_match,
            "Built authorization state"
        );

        AuthzState {
            options: self.options,
            resources: self.resources,
            url_tree,
        }
    }
}

impl AuthzState {
    /// Resolve a request URL to its resource, if any.
    pub fn find_resource(&self, url: &str) -> Option<&ProtectedResource> {
        let segments = request_segments(url, self.options.lenient_match)?;
        let key = self.url_tree.find(&segments)?;
        self.resources.get(key)
    }

    /// Check whether any of `provided` is accepted for the request.
    ///
    /// AlsoRequires co-requirements are not enforced here: holding the
    /// primary permission of a pair is enough.
    pub fn can_access(
        &self,
        url: &str,
        method: Method,
        scheme: SchemeType,
        provided: &[&str],
    ) -> AccessRequestResult {
        let Some(resource) = self.find_resource(url) else {
            return AccessRequestResult::MissingResource;
        };
        let Some(schemes) = resource.schemes(method) else {
            return AccessRequestResult::UnsupportedMethod;
        };
        let Some(claims) = schemes.get(&scheme) else {
            return AccessRequestResult::UnsupportedScheme;
        };
        if claims.iter().any(|claim| claim.is_authorized(provided)) {
            AccessRequestResult::Success
        } else {
            AccessRequestResult::InsufficientPermissions
        }
    }

    /// Every claim accepted for the request, in catalog order.
    pub fn required_permissions(
        &self,
        url: &str,
        method: Method,
        scheme: SchemeType,
    ) -> &[AcceptableClaim] {
        self.find_resource(url)
            .and_then(|resource| resource.claims(method, scheme))
            .unwrap_or_default()
    }
}
