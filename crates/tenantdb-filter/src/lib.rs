//! tenantdb Filter — generic filter compilation.
//!
//! An external parser walks a filter expression and drives a
//! [`FilterCompiler`] through the [`FilterEvents`] callbacks. The resulting
//! [`FilterTree`] is rendered into one of three shapes, scoped to a tenant by
//! [`scope`], and handed to a backend adapter ([`document`] or [`cypher`]).

pub mod compiler;
pub mod cypher;
pub mod document;
pub mod error;
pub mod predicate;
pub mod profile;
pub mod scope;
pub mod tree;

pub use compiler::{
    FilterCompiler, FilterEvent, FilterEvents, FilterParser, compile_filter, replay,
};
pub use error::FilterError;
pub use predicate::{Combinator, Operand, Operator, Predicate};
pub use profile::BackendProfile;
pub use scope::{ScopedFilter, id_filter, ids_filter, scope, tenant_filter};
pub use tree::{Clause, FilterShape, FilterTree, NodeId, NodeName, Term};
