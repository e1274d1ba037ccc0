use scopewise::authz::types::{PathSet, Permission};
use scopewise::authz::{
    AuthzBuilder, AuthzOptions, AuthzState, Method, PermissionsDocument, SchemeType,
};

/// Builder for test permissions
pub struct PermissionBuilder {
    name: String,
    permission: Permission,
}

impl PermissionBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            permission: Permission::default(),
        }
    }

    /// Declare schemes on the permission itself.
    pub fn with_schemes(mut self, schemes: &[SchemeType]) -> Self {
        self.permission = Permission {
            path_sets: self.permission.path_sets,
            ..Permission::with_schemes(schemes.iter().copied())
        };
        self
    }

    /// Add a pathset. `paths` pairs a path with its constraint string.
    pub fn with_path_set(
        mut self,
        methods: &[Method],
        schemes: &[SchemeType],
        paths: &[(&str, Option<&str>)],
    ) -> Self {
        let mut path_set = PathSet::new(methods.iter().copied(), schemes.iter().copied());
        for (path, constraints) in paths {
            path_set = path_set.with_path(path, *constraints);
        }
        self.permission.path_sets.push(path_set);
        self
    }

    /// Set the pathset-wide AlsoRequires default on the last added pathset.
    pub fn also_requiring(mut self, permission: &str) -> Self {
        if let Some(path_set) = self.permission.path_sets.pop() {
            self.permission
                .path_sets
                .push(path_set.with_also_requires(permission));
        }
        self
    }
}

/// Builder for test catalogs
#[derive(Default)]
pub struct CatalogBuilder {
    doc: PermissionsDocument,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, permission: PermissionBuilder) -> Self {
        self.doc
            .permissions
            .insert(permission.name, permission.permission);
        self
    }

    pub fn build(self) -> PermissionsDocument {
        self.doc
    }

    /// Load the catalog into a fresh builder and freeze it.
    pub fn state(self, lenient_match: bool) -> AuthzState {
        let mut builder = AuthzBuilder::new(AuthzOptions { lenient_match });
        builder.load(&self.doc);
        builder.freeze()
    }
}

/// `Foo.Read` with two pathsets over `/foo` and the `/bar` family, plus
/// `Bar.Read` on `/bar/{id}`.
pub fn bar_catalog() -> CatalogBuilder {
    use Method::*;
    use SchemeType::*;

    CatalogBuilder::new()
        .with(
            PermissionBuilder::new("Foo.Read")
                .with_schemes(&[DelegatedWork, DelegatedPersonal, Application])
                .with_path_set(
                    &[Get],
                    &[DelegatedWork, Application],
                    &[
                        ("/foo", Some("least=DelegatedWork,Application")),
                        ("/bar", None),
                        ("/bar/{id}", None),
                        ("/bar/{id}/schmo", None),
                    ],
                )
                .with_path_set(
                    &[Get, Post],
                    &[DelegatedPersonal, Application],
                    &[
                        ("/bar", Some("least=DelegatedPersonal,Application")),
                        ("/bar/{id}", None),
                        ("/bar/{id}/schmo", None),
                    ],
                ),
        )
        .with(
            PermissionBuilder::new("Bar.Read")
                .with_schemes(&[DelegatedPersonal])
                .with_path_set(&[Get], &[DelegatedPersonal], &[("/bar/{id}", None)]),
        )
}

/// `Foo.Read` (GET, delegated work) and `Foo.ReadWrite` (GET+POST, application
/// and delegated work) on `/foo`.
pub fn foo_catalog() -> CatalogBuilder {
    use Method::*;
    use SchemeType::*;

    CatalogBuilder::new()
        .with(
            PermissionBuilder::new("Foo.Read")
                .with_schemes(&[DelegatedWork])
                .with_path_set(&[Get], &[DelegatedWork], &[("/foo", Some("least=DelegatedWork"))]),
        )
        .with(
            PermissionBuilder::new("Foo.ReadWrite")
                .with_schemes(&[Application, DelegatedWork])
                .with_path_set(
                    &[Get, Post],
                    &[Application, DelegatedWork],
                    &[("/foo", Some("least=Application"))],
                ),
        )
}
