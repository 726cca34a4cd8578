//! # Strata Config
//!
//! Configuration management for the Strata data-access layer.
//! Supports layered configuration from files and environment variables.

mod app_config;
mod loader;
mod validation;

pub use app_config::*;
pub use loader::*;
pub use validation::*;
