//! # Domain
//!
//! Concrete mapped entities.

pub mod entities;

pub use entities::*;
