//! # Strata Repository
//!
//! SQLx-backed data access for any entity with an [`EntityMapping`].
//!
//! ```text
//! GenericRepository / TransactionalRepository
//!   ↓  Arc<PersistenceContextProvider>   (injected, opens contexts on demand)
//! DatabasePool                          (SQLite pool + bundled migrations)
//!   ↓
//! SQLite
//! ```
//!
//! ## Structure
//!
//! ```text
//! src/
//!   context.rs             ← PersistenceContextProvider, ContextFactory
//!   generic_repository.rs  ← GenericRepository
//!   transactional.rs       ← TransactionalRepository
//!   traits.rs              ← EntityMapping + SQL generation
//!   query/
//!     named.rs             ← NamedQuery, NamedQueryRegistry, NamedQueryRequest
//!     value.rs             ← SqlValue, QueryParameters, ResultRow
//!   sqlite/
//!     book.rs              ← Book mapping and its named queries
//! ```

pub mod context;
pub mod generic_repository;
mod ops;
pub mod pool;
pub mod query;
mod scope;
pub mod sqlite;
pub mod traits;
pub mod transactional;

pub use context::*;
pub use generic_repository::*;
pub use pool::*;
pub use query::*;
pub use sqlite::*;
pub use traits::EntityMapping;
pub use transactional::*;
