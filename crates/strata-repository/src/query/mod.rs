//! Named-query compilation and SQL value types.

mod named;
pub(crate) mod value;

pub use named::*;
pub use value::{QueryParameters, ResultRow, SqlValue};
