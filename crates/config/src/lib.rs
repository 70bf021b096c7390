//! Configuration: file-based schema with `${ENV}` substitution plus direct
//! environment overrides for the whole documented surface.

pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    loader::{discover_and_load, load_config},
    schema::LiaisonConfig,
    validate::{Diagnostic, Severity, has_errors, validate},
};
