//! Parsing of the per-path constraint string of a pathset.
//!
//! Format: `key1=val1,val2;key2=val3`. Recognized keys are `least` (scheme
//! names) and `AlsoRequires` (permission names). Keys match case-insensitively.

use crate::authz::types::{split_list, SchemeType};

const LEAST_KEY: &str = "least";
const ALSO_REQUIRES_KEY: &str = "alsorequires";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathConstraints {
    /// Schemes for which the permission is least privileged on this path.
    pub least: Vec<SchemeType>,
    /// Permissions that must be held together with this one.
    pub also_requires: Vec<String>,
}

impl PathConstraints {
    /// Parse a constraint string. `default_also_requires` applies when the
    /// string carries no `AlsoRequires` key.
    pub fn parse(value: Option<&str>, default_also_requires: &[String]) -> Self {
        let mut least = Vec::new();
        let mut also_requires = None;

        for part in value.unwrap_or_default().split(';') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let Some((key, val)) = part.split_once('=') else {
                tracing::warn!(segment = part, "ignoring path constraint without `=`");
                continue;
            };
            match key.trim().to_ascii_lowercase().as_str() {
                LEAST_KEY => {
                    for name in split_list(val) {
                        match name.parse::<SchemeType>() {
                            Ok(scheme) if !least.contains(&scheme) => least.push(scheme),
                            Ok(_) => {}
                            Err(_) => {
                                tracing::warn!(scheme = %name, "ignoring unknown least privilege scheme")
                            }
                        }
                    }
                }
                ALSO_REQUIRES_KEY => {
                    also_requires = Some(split_list(val));
                }
                other => {
                    tracing::debug!(key = other, "ignoring unrecognized path constraint");
                }
            }
        }

        Self {
            least,
            also_requires: also_requires.unwrap_or_else(|| default_also_requires.to_vec()),
        }
    }

    pub fn is_least(&self, scheme: SchemeType) -> bool {
        self.least.contains(&scheme)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty() {
        let c = PathConstraints::parse(None, &[]);
        assert!(c.least.is_empty());
        assert!(c.also_requires.is_empty());

        let c = PathConstraints::parse(Some(""), &[]);
        assert_eq!(c, PathConstraints::default());
    }

    #[test]
    fn test_parse_least_and_also_requires() {
        let c = PathConstraints::parse(
            Some("least=DelegatedWork,Application;AlsoRequires=Bar.Read"),
            &[],
        );
        assert_eq!(
            c.least,
            vec![SchemeType::DelegatedWork, SchemeType::Application]
        );
        assert_eq!(c.also_requires, vec!["Bar.Read"]);
        assert!(c.is_least(SchemeType::Application));
        assert!(!c.is_least(SchemeType::DelegatedPersonal));
    }

    #[test]
    fn test_parse_keys_case_insensitive() {
        let c = PathConstraints::parse(Some("LEAST=Application; alsorequires = Foo.Read "), &[]);
        assert_eq!(c.least, vec![SchemeType::Application]);
        assert_eq!(c.also_requires, vec!["Foo.Read"]);
    }

    #[test]
    fn test_default_also_requires() {
        let defaults = vec!["Default.Read".to_string()];
        let c = PathConstraints::parse(Some("least=Application"), &defaults);
        assert_eq!(c.also_requires, defaults);

        // An explicit key, even an empty one, overrides the default
        let c = PathConstraints::parse(Some("least=Application;AlsoRequires="), &defaults);
        assert!(c.also_requires.is_empty());
    }

    #[test]
    fn test_parse_ignores_garbage() {
        let c = PathConstraints::parse(Some("nonsense;least=Bogus,Application;other=1"), &[]);
        assert_eq!(c.least, vec![SchemeType::Application]);
        assert!(c.also_requires.is_empty());
    }
}
