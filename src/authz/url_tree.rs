//! Segment trie resolving request paths to catalog path keys.
//!
//! Built once with [`UrlTreeBuilder`] and frozen into an immutable [`UrlTree`].

use std::collections::BTreeMap;

use crate::authz::path::path_segments;

#[derive(Debug, Default)]
struct UrlNode {
    children: BTreeMap<String, UrlNode>,
    /// Key of the child acting as the `{param}` fallback. The first one
    /// attached wins.
    parameter: Option<String>,
    /// Normalized catalog path terminating at this node.
    resource: Option<String>,
}

#[derive(Debug, Default)]
pub struct UrlTreeBuilder {
    root: UrlNode,
    paths: usize,
}

impl UrlTreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a normalized catalog path.
    pub fn attach(&mut self, path: &str) {
        let mut node = &mut self.root;
        for segment in path_segments(path) {
            if segment.starts_with('{') && node.parameter.is_none() {
                node.parameter = Some(segment.to_string());
            }
            node = node.children.entry(segment.to_string()).or_default();
        }
        match &node.resource {
            Some(existing) => {
                tracing::debug!(path, existing = %existing, "path already attached to URL tree");
            }
            None => {
                node.resource = Some(path.to_string());
                self.paths += 1;
            }
        }
    }

    pub fn freeze(self) -> UrlTree {
        UrlTree {
            root: self.root,
            paths: self.paths,
        }
    }
}

#[derive(Debug)]
pub struct UrlTree {
    root: UrlNode,
    paths: usize,
}

impl UrlTree {
    /// Walk the trie, preferring literal segments over the parameter child.
    /// Returns the catalog path key of the terminal node.
    pub fn find<S: AsRef<str>>(&self, segments: &[S]) -> Option<&str> {
        let mut node = &self.root;
        for segment in segments {
            node = match node.children.get(segment.as_ref()) {
                Some(child) => child,
                None => {
                    let parameter = node.parameter.as_ref()?;
                    node.children.get(parameter)?
                }
            };
        }
        node.resource.as_deref()
    }

    pub fn len(&self) -> usize {
        self.paths
    }

    pub fn is_empty(&self) -> bool {
        self.paths == 0
    }
}
