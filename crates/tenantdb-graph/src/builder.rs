//! Cypher statement builder.
//!
//! Every matching statement takes a [`ScopedFilter`], so it cannot be built
//! without the tenant predicate.

use serde_json::{Map, Value};
use tenantdb_core::paging::{SortDirection, SortField};
use tenantdb_filter::ScopedFilter;
use tenantdb_filter::cypher::{property, to_where};

use crate::session::CypherQuery;

/// Alias of the matched node in every statement.
pub const NODE_ALIAS: &str = "n";

/// Column holding the deleted-node count.
pub const DELETED_COLUMN: &str = "deleted";

/// Column holding the matched-node count.
pub const TOTAL_COLUMN: &str = "total";

/// Builds tenant-scoped statements over nodes with one label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CypherBuilder {
    label: String,
}

impl CypherBuilder {
    /// Creates a builder for nodes labelled `label`.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    /// The node label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    fn pattern(&self) -> String {
        format!("({NODE_ALIAS}:`{}`)", self.label.replace('`', "``"))
    }

    fn matching(&self, filter: &ScopedFilter) -> (String, Map<String, Value>) {
        let predicate = to_where(filter, NODE_ALIAS);
        (
            format!("MATCH {} WHERE {}", self.pattern(), predicate.clause),
            predicate.params,
        )
    }

    /// `CREATE` a node with `properties`.
    #[must_use]
    pub fn create(&self, properties: Map<String, Value>) -> CypherQuery {
        let mut params = Map::new();
        params.insert("props".to_owned(), Value::Object(properties));
        CypherQuery {
            text: format!("CREATE {} SET {NODE_ALIAS} = $props RETURN {NODE_ALIAS}", self.pattern()),
            params,
        }
    }

    /// Replaces the properties of the nodes matching `filter`.
    #[must_use]
    pub fn update(&self, filter: &ScopedFilter, properties: Map<String, Value>) -> CypherQuery {
        let (head, mut params) = self.matching(filter);
        params.insert("props".to_owned(), Value::Object(properties));
        CypherQuery {
            text: format!("{head} SET {NODE_ALIAS} = $props RETURN {NODE_ALIAS}"),
            params,
        }
    }

    /// Deletes the nodes matching `filter` and their relationships.
    #[must_use]
    pub fn delete(&self, filter: &ScopedFilter) -> CypherQuery {
        let (head, params) = self.matching(filter);
        CypherQuery {
            text: format!(
                "{head} DETACH DELETE {NODE_ALIAS} RETURN count({NODE_ALIAS}) AS {DELETED_COLUMN}"
            ),
            params,
        }
    }

    /// Returns the nodes matching `filter`, sorted and windowed.
    #[must_use]
    pub fn find(
        &self,
        filter: &ScopedFilter,
        sort: &[SortField],
        skip: u64,
        limit: Option<u64>,
    ) -> CypherQuery {
        let (head, mut params) = self.matching(filter);
        let mut text = format!("{head} RETURN {NODE_ALIAS}");
        if !sort.is_empty() {
            let order: Vec<String> = sort
                .iter()
                .map(|field| {
                    let direction = match field.direction {
                        SortDirection::Asc => "ASC",
                        SortDirection::Desc => "DESC",
                    };
                    format!("{} {direction}", property(NODE_ALIAS, &field.field))
                })
                .collect();
            text.push_str(" ORDER BY ");
            text.push_str(&order.join(", "));
        }
        if skip > 0 {
            text.push_str(" SKIP $skip");
            params.insert("skip".to_owned(), Value::from(skip));
        }
        if let Some(limit) = limit {
            text.push_str(" LIMIT $limit");
            params.insert("limit".to_owned(), Value::from(limit));
        }
        CypherQuery { text, params }
    }

    /// Counts the nodes matching `filter`.
    #[must_use]
    pub fn count(&self, filter: &ScopedFilter) -> CypherQuery {
        let (head, params) = self.matching(filter);
        CypherQuery {
            text: format!("{head} RETURN count({NODE_ALIAS}) AS {TOTAL_COLUMN}"),
            params,
        }
    }
}
