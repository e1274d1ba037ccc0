mod helpers;

use std::collections::BTreeSet;

use helpers::{bar_catalog, foo_catalog, CatalogBuilder, PermissionBuilder};
use scopewise::authz::validation::validate;
use scopewise::authz::{
    AuthzBuilder, AuthzOptions, Method, PermissionsError, PermissionsErrorCode, SchemeType,
};

fn strict() -> AuthzOptions {
    AuthzOptions { lenient_match: false }
}

fn codes(errors: &BTreeSet<PermissionsError>) -> Vec<PermissionsErrorCode> {
    errors.iter().map(|e| e.code).collect()
}

#[test]
fn test_clean_catalog() {
    let doc = CatalogBuilder::new()
        .with(
            PermissionBuilder::new("Foo.Read")
                .with_schemes(&[SchemeType::DelegatedWork, SchemeType::Application])
                .with_path_set(
                    &[Method::Get],
                    &[SchemeType::DelegatedWork, SchemeType::Application],
                    &[
                        ("/foo", Some("least=DelegatedWork,Application")),
                        ("/foo/{id}", Some("least=DelegatedWork,Application")),
                    ],
                ),
        )
        .build();
    assert!(validate(&doc, strict()).is_empty());
}

#[test]
fn test_missing_least_on_unflagged_combinations() {
    // POST with DelegatedWork is granted by Foo.ReadWrite but never flagged least
    let errors = validate(&foo_catalog().build(), strict());
    assert_eq!(
        codes(&errors),
        vec![PermissionsErrorCode::MissingLeastPrivilegePermission]
    );
    let error = errors.iter().next().unwrap();
    assert_eq!(
        error.message,
        "Missing Least Privilege Permission for Scheme 'DelegatedWork' for Method 'POST'"
    );
}

#[test]
fn test_undeclared_pathset_scheme() {
    let doc = CatalogBuilder::new()
        .with(
            PermissionBuilder::new("Foo.Read")
                .with_schemes(&[SchemeType::DelegatedWork])
                .with_path_set(
                    &[Method::Get],
                    &[SchemeType::DelegatedWork, SchemeType::Application],
                    &[("/foo", Some("least=DelegatedWork,Application"))],
                ),
        )
        .build();

    let errors = validate(&doc, strict());
    assert_eq!(codes(&errors), vec![PermissionsErrorCode::InvalidPathsetScheme]);
    let error = errors.iter().next().unwrap();
    assert_eq!(error.path, "/foo");
    assert!(error.message.contains("Foo.Read"));
    assert!(error.message.contains("Application"));
}

/// Every name flagged least privileged for GET `/foo` under one scheme.
fn least_on_get(names: &[&str], scheme: SchemeType) -> CatalogBuilder {
    let least = format!("least={scheme}");
    let mut catalog = CatalogBuilder::new();
    for name in names {
        catalog = catalog.with(
            PermissionBuilder::new(name)
                .with_schemes(&[scheme])
                .with_path_set(&[Method::Get], &[scheme], &[("/foo", Some(least.as_str()))]),
        );
    }
    catalog
}

#[test]
fn test_duplicate_least_privilege_scopes() {
    let doc = least_on_get(&["Foo.ReadWrite", "Bar.Manage"], SchemeType::Application).build();

    let errors = validate(&doc, strict());
    assert_eq!(errors.len(), 1);
    let error = errors.iter().next().unwrap();
    assert_eq!(error.code, PermissionsErrorCode::DuplicateLeastPrivilegeScopes);
    assert_eq!(
        error.message,
        "Duplicate Least Privilege Scopes Bar.Manage, Foo.ReadWrite for Scheme 'Application' for Method 'GET'"
    );
    assert_eq!(
        error.to_string(),
        "DuplicateLeastPrivilegeScopes [/foo] Duplicate Least Privilege Scopes Bar.Manage, Foo.ReadWrite for Scheme 'Application' for Method 'GET'"
    );
}

#[test]
fn test_shared_verb_root_on_get_is_accepted() {
    for names in [
        ["Foo.Read", "Foo.ReadBasic"],
        ["Foo.Read", "Bar.Read"],
        ["Foo.ReadBasic.All", "Bar.Read.All"],
    ] {
        let doc = least_on_get(&names, SchemeType::DelegatedWork).build();
        assert!(validate(&doc, strict()).is_empty(), "names: {names:?}");
    }
}

#[test]
fn test_different_verb_roots_on_get_are_reported() {
    for names in [["Foo.Read", "Foo.ReadWrite.All"], ["Foo.Read", "Foo.ReadWrite"]] {
        let doc = least_on_get(&names, SchemeType::DelegatedWork).build();
        let errors = validate(&doc, strict());
        assert_eq!(
            codes(&errors),
            vec![PermissionsErrorCode::DuplicateLeastPrivilegeScopes],
            "names: {names:?}"
        );
    }
}

#[test]
fn test_shared_verb_root_outside_get_is_reported() {
    let mut catalog = CatalogBuilder::new();
    for name in ["Foo.Read", "Bar.Read"] {
        catalog = catalog.with(
            PermissionBuilder::new(name)
                .with_schemes(&[SchemeType::Application])
                .with_path_set(
                    &[Method::Post],
                    &[SchemeType::Application],
                    &[("/foo", Some("least=Application"))],
                ),
        );
    }
    let errors = validate(&catalog.build(), strict());
    assert_eq!(
        codes(&errors),
        vec![PermissionsErrorCode::DuplicateLeastPrivilegeScopes]
    );
}

#[test]
fn test_overlap_reported_with_custom_filter() {
    let doc = least_on_get(&["Foo.Read", "Bar.Read"], SchemeType::DelegatedWork).build();
    let mut builder = AuthzBuilder::new(strict())
        .with_duplicate_filter(|_: Method, _: &BTreeSet<String>| false);
    let errors = builder.validate(&doc);
    assert_eq!(
        codes(&errors),
        vec![PermissionsErrorCode::DuplicateLeastPrivilegeScopes]
    );
}

#[test]
fn test_unexpected_least_scheme_and_missing_least() {
    let doc = CatalogBuilder::new()
        .with(
            PermissionBuilder::new("Foo.Read")
                .with_schemes(&[SchemeType::DelegatedWork, SchemeType::Application])
                .with_path_set(
                    &[Method::Get],
                    &[SchemeType::DelegatedWork],
                    &[("/foo", Some("least=Application"))],
                ),
        )
        .build();

    let errors = validate(&doc, strict());
    assert_eq!(
        codes(&errors),
        vec![
            PermissionsErrorCode::InvalidLeastPrivilegeScheme,
            PermissionsErrorCode::MissingLeastPrivilegePermission,
        ]
    );
    let missing = errors
        .iter()
        .find(|e| e.code == PermissionsErrorCode::MissingLeastPrivilegePermission)
        .unwrap();
    assert_eq!(
        missing.message,
        "Missing Least Privilege Permission for Scheme 'DelegatedWork' for Method 'GET'"
    );
}

#[test]
fn test_also_requires_targets() {
    let doc = CatalogBuilder::new()
        .with(
            PermissionBuilder::new("Foo.Read")
                .with_schemes(&[SchemeType::DelegatedWork])
                .with_path_set(
                    &[Method::Get],
                    &[SchemeType::DelegatedWork],
                    &[
                        ("/foo", Some("least=DelegatedWork;AlsoRequires=Nope.Read")),
                        ("/foo/bar", Some("least=DelegatedWork;AlsoRequires=Bar.Read")),
                    ],
                ),
        )
        .with(
            PermissionBuilder::new("Bar.Read")
                .with_schemes(&[SchemeType::Application])
                .with_path_set(
                    &[Method::Get],
                    &[SchemeType::Application],
                    &[("/bar", Some("least=Application"))],
                ),
        )
        .build();

    let errors: Vec<PermissionsError> = validate(&doc, strict()).into_iter().collect();
    assert_eq!(errors.len(), 2);
    assert!(errors
        .iter()
        .all(|e| e.code == PermissionsErrorCode::InvalidAlsoRequiresPermission));
    assert_eq!(errors[0].path, "/foo");
    assert!(errors[0].message.contains("'Nope.Read'"));
    assert!(errors[0].message.ends_with("does not exist"));
    assert_eq!(errors[1].path, "/foo/bar");
    assert!(errors[1].message.ends_with("does not support schemes: DelegatedWork"));
}

#[test]
fn test_lenient_duplicate_pathset_entry() {
    let catalog = || {
        CatalogBuilder::new().with(
            PermissionBuilder::new("User.Read")
                .with_schemes(&[SchemeType::DelegatedWork])
                .with_path_set(
                    &[Method::Get],
                    &[SchemeType::DelegatedWork],
                    &[
                        ("/users/{user-id}", Some("least=DelegatedWork")),
                        ("/users/{id}", Some("least=DelegatedWork")),
                    ],
                ),
        )
    };

    assert!(validate(&catalog().build(), strict()).is_empty());

    let errors = validate(&catalog().build(), AuthzOptions { lenient_match: true });
    assert_eq!(codes(&errors), vec![PermissionsErrorCode::DuplicatePathsetEntry]);
    let error = errors.iter().next().unwrap();
    assert_eq!(error.path, "/users/{id}");
    assert!(error.message.contains("User.Read"));
}

#[test]
fn test_validated_builder_still_answers_queries() {
    let mut builder = AuthzBuilder::new(strict());
    let errors = builder.validate(&bar_catalog().build());
    // Foo.Read grants GET with Application on the `/bar` family from both pathsets
    let duplicated: Vec<&str> = errors
        .iter()
        .filter(|e| e.code == PermissionsErrorCode::DuplicatePathsetEntry)
        .map(|e| e.path.as_str())
        .collect();
    assert_eq!(duplicated, vec!["/bar", "/bar/{id}", "/bar/{id}/schmo"]);
    assert!(errors.iter().all(|e| matches!(
        e.code,
        PermissionsErrorCode::DuplicatePathsetEntry
            | PermissionsErrorCode::MissingLeastPrivilegePermission
    )));

    let state = builder.freeze();
    assert_eq!(
        state.required_permissions("/foo", Method::Get, SchemeType::Application).len(),
        1
    );
}
