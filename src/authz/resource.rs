//! Per-path resource index and least privilege disambiguation.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::authz::claims::{AcceptableClaim, PermissionPair};
use crate::authz::errors::AuthzError;
use crate::authz::types::{Method, SchemeType};

pub const PERMISSION_NOT_SUPPORTED: &str = "Not supported.";
pub const PERMISSION_NOT_AVAILABLE: &str = "Not available.";

pub type SchemeClaims = BTreeMap<SchemeType, Vec<AcceptableClaim>>;

/// method -> scheme -> least privileged permission labels
pub type LeastPrivilegeMap = BTreeMap<Method, BTreeMap<SchemeType, BTreeSet<String>>>;

/// All claims accepted for one catalog path.
#[derive(Debug, Clone, Serialize)]
pub struct ProtectedResource {
    url: String,
    #[serde(rename = "methods")]
    supported_methods: BTreeMap<Method, SchemeClaims>,
    /// (permission, scheme) -> methods that permission supports on this path
    #[serde(skip)]
    permission_methods: HashMap<(String, SchemeType), BTreeSet<Method>>,
}

/// Least and higher privileged permissions for one method and scheme.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrivilegeSummary {
    pub supported: bool,
    pub least: Vec<String>,
    pub higher: Vec<String>,
}

impl PrivilegeSummary {
    pub fn least_cell(&self) -> String {
        if self.least.is_empty() {
            PERMISSION_NOT_SUPPORTED.to_string()
        } else {
            self.least.join(", ")
        }
    }

    pub fn higher_cell(&self) -> String {
        if !self.supported {
            PERMISSION_NOT_SUPPORTED.to_string()
        } else if self.higher.is_empty() {
            PERMISSION_NOT_AVAILABLE.to_string()
        } else {
            self.higher.join(", ")
        }
    }
}

impl ProtectedResource {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            supported_methods: BTreeMap::new(),
            permission_methods: HashMap::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn supported_methods(&self) -> &BTreeMap<Method, SchemeClaims> {
        &self.supported_methods
    }

    pub fn schemes(&self, method: Method) -> Option<&SchemeClaims> {
        self.supported_methods.get(&method)
    }

    pub fn claims(&self, method: Method, scheme: SchemeType) -> Option<&[AcceptableClaim]> {
        self.supported_methods
            .get(&method)?
            .get(&scheme)
            .map(|claims| claims.as_slice())
    }

    /// Register a method even when no scheme supports it yet.
    pub fn add_method(&mut self, method: Method) {
        self.supported_methods.entry(method).or_default();
    }

    /// Append a claim. Returns `false` when the permission was already
    /// recorded for this method and scheme; the claim is appended regardless.
    pub fn add_claim(&mut self, method: Method, scheme: SchemeType, claim: AcceptableClaim) -> bool {
        let first_time = self
            .permission_methods
            .entry((claim.permission.clone(), scheme))
            .or_default()
            .insert(method);
        self.supported_methods
            .entry(method)
            .or_default()
            .entry(scheme)
            .or_default()
            .push(claim);
        first_time
    }

    /// Number of methods `permission` supports on this path for `scheme`.
    pub fn method_count(&self, permission: &str, scheme: SchemeType) -> usize {
        self.permission_methods
            .get(&(permission.to_string(), scheme))
            .map_or(0, |methods| methods.len())
    }

    fn only_method(&self, permission: &str, scheme: SchemeType) -> Option<Method> {
        let methods = self.permission_methods.get(&(permission.to_string(), scheme))?;
        match methods.len() {
            1 => methods.iter().next().copied(),
            _ => None,
        }
    }

    /// Claims for display: least privileged first, otherwise insertion order.
    pub fn sorted_claims(&self, method: Method, scheme: SchemeType) -> Vec<&AcceptableClaim> {
        let mut claims: Vec<&AcceptableClaim> =
            self.claims(method, scheme).unwrap_or_default().iter().collect();
        claims.sort_by_key(|claim| !claim.least);
        claims
    }

    /// [`Self::sorted_claims`] for every scheme of `method`.
    pub fn sorted_schemes(
        &self,
        method: Method,
    ) -> Option<BTreeMap<SchemeType, Vec<&AcceptableClaim>>> {
        let schemes = self.schemes(method)?;
        Some(
            schemes
                .keys()
                .map(|scheme| (*scheme, self.sorted_claims(method, *scheme)))
                .collect(),
        )
    }

    /// Distinct permission names flagged least privileged.
    pub fn least_permissions(&self, method: Method, scheme: SchemeType) -> BTreeSet<String> {
        self.claims(method, scheme)
            .unwrap_or_default()
            .iter()
            .filter(|claim| claim.least)
            .map(|claim| claim.permission.clone())
            .collect()
    }

    /// Least privileged labels for every method/scheme, optionally filtered.
    /// Contexts without any least privileged claim are omitted.
    pub fn fetch_least_privilege(
        &self,
        method: Option<Method>,
        scheme: Option<SchemeType>,
    ) -> Result<LeastPrivilegeMap, AuthzError> {
        let mut result = LeastPrivilegeMap::new();
        for (current_method, schemes) in &self.supported_methods {
            if method.is_some_and(|wanted| wanted != *current_method) {
                continue;
            }
            for current_scheme in schemes.keys() {
                if scheme.is_some_and(|wanted| wanted != *current_scheme) {
                    continue;
                }
                let labels = self.least_privilege(*current_method, *current_scheme)?;
                if labels.is_empty() {
                    continue;
                }
                result
                    .entry(*current_method)
                    .or_default()
                    .insert(*current_scheme, labels.into_iter().collect());
            }
        }
        Ok(result)
    }

    /// Least privileged labels for one method and scheme, in candidate order.
    pub fn least_privilege(&self, method: Method, scheme: SchemeType) -> Result<Vec<String>, AuthzError> {
        self.least_claims(method, scheme)?
            .into_iter()
            .map(|claim| claim.label())
            .collect()
    }

    /// Least and higher privileged permissions for one method and scheme.
    pub fn privilege_summary(
        &self,
        method: Method,
        scheme: SchemeType,
    ) -> Result<PrivilegeSummary, AuthzError> {
        let claims = self.claims(method, scheme).unwrap_or_default();
        if claims.is_empty() {
            return Ok(PrivilegeSummary::default());
        }

        let winners = self.least_claims(method, scheme)?;
        let mut excluded: HashSet<String> = HashSet::new();
        let mut least = Vec::with_capacity(winners.len());
        for winner in &winners {
            let label = winner.label()?;
            excluded.insert(winner.permission.clone());
            if let Some(partner) = winner.partner()? {
                excluded.insert(partner.to_string());
                excluded.insert(label.clone());
            }
            least.push(label);
        }

        let higher_claims: Vec<&AcceptableClaim> = claims
            .iter()
            .filter(|claim| !excluded.contains(&claim.permission))
            .collect();
        let higher = unique_labels(&higher_claims)?
            .into_iter()
            .map(|claim| claim.label())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PrivilegeSummary {
            supported: true,
            least,
            higher,
        })
    }

    fn least_claims(&self, method: Method, scheme: SchemeType) -> Result<Vec<&AcceptableClaim>, AuthzError> {
        let mut candidates: Vec<&AcceptableClaim> = Vec::new();
        for claim in self.claims(method, scheme).unwrap_or_default() {
            if claim.least && !candidates.iter().any(|c| c.same_grant(claim)) {
                candidates.push(claim);
            }
        }
        self.disambiguate(method, scheme, candidates)
    }

    /// Pick the least privileged claim(s) among the least flagged candidates.
    fn disambiguate<'a>(
        &self,
        method: Method,
        scheme: SchemeType,
        candidates: Vec<&'a AcceptableClaim>,
    ) -> Result<Vec<&'a AcceptableClaim>, AuthzError> {
        if candidates.len() <= 1 {
            return Ok(candidates);
        }

        let paired: Vec<&str> = candidates
            .iter()
            .filter(|claim| !claim.also_requires.is_empty())
            .map(|claim| claim.permission.as_str())
            .collect();
        if paired.len() > 2 {
            return Err(AuthzError::ConflictingLeastPrivilegePairs {
                method: method.to_string(),
                scheme: scheme.to_string(),
                permissions: paired.join(", "),
            });
        }

        let exclusive: Vec<&AcceptableClaim> = candidates
            .iter()
            .copied()
            .filter(|claim| self.method_count(&claim.permission, scheme) == 1)
            .collect();
        if exclusive.len() > 1 {
            tracing::debug!(
                url = %self.url,
                %method,
                %scheme,
                candidates = exclusive.len(),
                "unresolved least privilege tie"
            );
            return unique_labels(&candidates);
        }

        if let Some(claim) = exclusive
            .iter()
            .find(|claim| self.only_method(&claim.permission, scheme) == Some(method))
        {
            return Ok(vec![*claim]);
        }

        // min_by_key keeps the first of equal elements
        let narrowest = candidates
            .iter()
            .copied()
            .min_by_key(|claim| self.method_count(&claim.permission, scheme));
        Ok(narrowest.into_iter().collect())
    }
}

/// Drop claims whose permission (or unordered permission pair) was already seen.
fn unique_labels<'a>(claims: &[&'a AcceptableClaim]) -> Result<Vec<&'a AcceptableClaim>, AuthzError> {
    let mut seen_pairs: HashSet<PermissionPair> = HashSet::new();
    let mut seen_singles: HashSet<&str> = HashSet::new();
    let mut unique = Vec::new();
    for claim in claims {
        let fresh = match claim.pair()? {
            Some(pair) => seen_pairs.insert(pair),
            None => seen_singles.insert(claim.permission.as_str()),
        };
        if fresh {
            unique.push(*claim);
        }
    }
    Ok(unique)
}
