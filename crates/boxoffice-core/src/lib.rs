//! # boxoffice-core
//!
//! Core crate for the BoxOffice booking backend. Contains collaborator
//! traits, configuration schemas, typed identifiers, the admission-token
//! and reservation domain types, and the unified error system.
//!
//! This crate has **no** internal dependencies on other BoxOffice crates.

pub mod config;
pub mod error;
pub mod logging;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
