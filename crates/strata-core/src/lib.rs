//! # Strata Core
//!
//! Core types, traits, and error definitions for the Strata data-access layer.
//! Everything here is storage-agnostic: the SQLx-backed repositories live in
//! `strata-repository`.

pub mod domain;
pub mod error;
pub mod id;
pub mod pagination;
pub mod result;
pub mod telemetry;
pub mod traits;
pub mod validation;

pub use domain::*;
pub use error::*;
pub use id::*;
pub use pagination::*;
pub use result::*;
pub use traits::*;
pub use validation::*;
