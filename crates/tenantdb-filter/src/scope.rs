//! Tenant-scoping serializer.
//!
//! [`scope`] is the only way to obtain a [`ScopedFilter`], and backend
//! adapters only accept a `ScopedFilter`, so no backend can run a filter
//! without the tenant predicate.

use serde_json::Value;
use tenantdb_core::tenant::TenantId;

use crate::predicate::{Combinator, Predicate};
use crate::profile::BackendProfile;
use crate::tree::{Clause, FilterShape, FilterTree, Term};

/// A rendered filter carrying its tenant predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopedFilter {
    shape: FilterShape,
}

impl ScopedFilter {
    /// The backend-neutral shape.
    #[must_use]
    pub fn shape(&self) -> &FilterShape {
        &self.shape
    }

    /// Renders the filter as a generic map.
    #[must_use]
    pub fn to_value(&self) -> Value {
        self.shape.to_value()
    }
}

fn tenant_term(tenant: &TenantId, profile: &BackendProfile) -> Term {
    Term::new(
        profile.tenant_field(),
        Predicate::Eq(Value::String(tenant.as_str().to_owned())),
    )
}

/// Renders `tree` and injects the tenant predicate.
///
/// - empty → `{tenant: id}`
/// - flat map → tenant merged into the same map, replacing any tenant term
/// - combinator → tenant appended to the combinator list, including `$or`
///   lists, where it widens rather than restricts the match
///
/// The tree is not modified.
#[must_use]
pub fn scope(tree: &FilterTree, tenant: &TenantId, profile: &BackendProfile) -> ScopedFilter {
    let tenant = tenant_term(tenant, profile);
    let shape = match tree.render() {
        FilterShape::Empty => FilterShape::Flat(vec![tenant]),
        FilterShape::Flat(mut terms) => {
            terms.retain(|term| term.field != tenant.field);
            terms.push(tenant);
            FilterShape::Flat(terms)
        }
        FilterShape::Combinator(combinator, mut clauses) => {
            clauses.push(Clause::Term(tenant));
            FilterShape::Combinator(combinator, clauses)
        }
    };
    ScopedFilter { shape }
}

/// Filter matching every entity of `tenant`.
#[must_use]
pub fn tenant_filter(tenant: &TenantId, profile: &BackendProfile) -> ScopedFilter {
    ScopedFilter {
        shape: FilterShape::Flat(vec![tenant_term(tenant, profile)]),
    }
}

/// Filter matching the entity with logical id `id` of `tenant`.
#[must_use]
pub fn id_filter(tenant: &TenantId, id: &str, profile: &BackendProfile) -> ScopedFilter {
    ScopedFilter {
        shape: FilterShape::Flat(vec![
            Term::new(
                profile.key_field(),
                Predicate::Eq(Value::String(id.to_owned())),
            ),
            tenant_term(tenant, profile),
        ]),
    }
}

/// Filter matching the entities with any of the logical `ids` of `tenant`.
#[must_use]
pub fn ids_filter(tenant: &TenantId, ids: &[String], profile: &BackendProfile) -> ScopedFilter {
    ScopedFilter {
        shape: FilterShape::Combinator(
            Combinator::And,
            vec![
                Clause::Term(Term::new(
                    profile.key_field(),
                    Predicate::In(ids.iter().cloned().map(Value::String).collect()),
                )),
                Clause::Term(tenant_term(tenant, profile)),
            ],
        ),
    }
}
