//! Domain entities.

mod book;

pub use book::*;
