use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum AuthzError {
    #[error("Failed to read permissions catalog `{path}`")]
    #[diagnostic(
        code(scopewise::authz::catalog_load),
        help("Check that the file exists and is readable")
    )]
    CatalogLoad {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse permissions catalog `{path}`")]
    #[diagnostic(
        code(scopewise::authz::catalog_parse),
        help("A catalog is a JSON object with a `permissions` map of name -> {{ schemes, pathSets }}")
    )]
    CatalogParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid catalog: {0}")]
    #[diagnostic(code(scopewise::authz::invalid_catalog))]
    InvalidCatalog(String),

    #[error("Permission `{permission}` declares more than one AlsoRequires permission: {also_requires}")]
    #[diagnostic(
        code(scopewise::authz::unsupported_also_requires),
        help("A permission can be paired with at most one other permission")
    )]
    UnsupportedAlsoRequires {
        permission: String,
        also_requires: String,
    },

    #[error("More than two paired least privilege permissions for {method} {scheme}: {permissions}")]
    #[diagnostic(
        code(scopewise::authz::conflicting_least_pairs),
        help("Mark only one permission pair as `least` for each method and scheme")
    )]
    ConflictingLeastPrivilegePairs {
        method: String,
        scheme: String,
        permissions: String,
    },

    #[error("Unknown HTTP method `{0}`")]
    #[diagnostic(
        code(scopewise::authz::unknown_method),
        help("Supported methods: GET, POST, PUT, PATCH, DELETE, HEAD, OPTIONS")
    )]
    UnknownMethod(String),

    #[error("Unknown permission scheme `{0}`")]
    #[diagnostic(
        code(scopewise::authz::unknown_scheme),
        help("Supported schemes: DelegatedWork, DelegatedPersonal, Application, ResourceSpecificConsent")
    )]
    UnknownScheme(String),

    #[error("I/O error: {0}")]
    #[diagnostic(code(scopewise::authz::io))]
    Io(#[from] std::io::Error),
}
