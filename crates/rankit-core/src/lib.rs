//! rankit core — domain models, repository trait definitions, errors and
//! validation shared by every other crate in the workspace.

pub mod error;
pub mod models;
pub mod repository;
pub mod validate;
