//! Document-store adapter: scoped filter → query document.

use serde_json::{Map, Value};

use crate::scope::ScopedFilter;
use crate::tree::{Clause, FilterShape};

/// A query or stored document.
pub type Document = Map<String, Value>;

/// Converts a scoped filter into a document-store query document.
///
/// Accepts all three shapes: empty yields `{}`, a flat filter yields one map
/// of field comparisons, a combinator yields `{"$and"|"$or": [...]}`.
#[must_use]
pub fn to_document(filter: &ScopedFilter) -> Document {
    match filter.shape() {
        FilterShape::Empty => Document::new(),
        FilterShape::Flat(terms) => terms
            .iter()
            .map(|term| (term.field.clone(), term.predicate.to_value()))
            .collect(),
        FilterShape::Combinator(combinator, clauses) => {
            let mut document = Document::new();
            document.insert(
                combinator.tag().to_owned(),
                Value::Array(clauses.iter().map(Clause::to_value).collect()),
            );
            document
        }
    }
}
