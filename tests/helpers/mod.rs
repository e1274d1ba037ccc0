#![allow(dead_code)]

pub mod builders;

pub use builders::{bar_catalog, foo_catalog, CatalogBuilder, PermissionBuilder};
