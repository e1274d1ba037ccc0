//! Scopewise - permission catalog resolution and least privilege analysis
//!
//! Inverts a permission-centric catalog into a path-centric index, answers
//! access checks against it, picks least privileged permissions and validates
//! catalogs for structural defects.

pub mod authz;
pub mod commands;
pub mod errors;
pub mod settings;
