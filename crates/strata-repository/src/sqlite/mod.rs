//! SQLite mappings for the domain entities.

mod book;

pub use book::*;
