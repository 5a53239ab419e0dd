//! tenantdb Graph — graph-store repository.
//!
//! Entities are stored as labelled nodes. [`CypherBuilder`] produces every
//! statement from a [`ScopedFilter`](tenantdb_filter::ScopedFilter), so each
//! statement carries the tenant predicate, and [`GraphRepository`] runs them
//! through a [`GraphSession`] driver.

pub mod builder;
pub mod repository;
pub mod session;

pub use builder::{CypherBuilder, NODE_ALIAS};
pub use repository::GraphRepository;
pub use session::{AccessMode, CypherQuery, GraphSession, Row};
