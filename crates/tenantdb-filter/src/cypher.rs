//! Graph-store adapter: scoped filter → parameterised Cypher predicate.

use serde_json::{Map, Value};

use crate::predicate::{Combinator, LIKE_FLAGS, Predicate};
use crate::scope::ScopedFilter;
use crate::tree::{Clause, FilterShape, Term};

/// Prefix of the parameters generated for filter values.
pub const PARAM_PREFIX: &str = "f";

/// A Cypher boolean expression and the parameters it references.
#[derive(Debug, Clone, PartialEq)]
pub struct CypherPredicate {
    /// Expression text suitable for a `WHERE` clause.
    pub clause: String,
    /// Parameter values keyed by name (without `$`).
    pub params: Map<String, Value>,
}

/// Quotes `field` as a property of `alias`: ``n.`field` ``.
#[must_use]
pub fn property(alias: &str, field: &str) -> String {
    format!("{alias}.`{}`", field.replace('`', "``"))
}

/// Converts a scoped filter into a Cypher predicate over node `alias`.
///
/// Accepts all three shapes: empty yields `true`, a flat filter AND-s its
/// terms, a combinator joins its clauses with `AND` / `OR`.
#[must_use]
pub fn to_where(filter: &ScopedFilter, alias: &str) -> CypherPredicate {
    let mut writer = Writer {
        alias,
        params: Map::new(),
    };
    let clause = match filter.shape() {
        FilterShape::Empty => "true".to_owned(),
        FilterShape::Flat(terms) => {
            let parts: Vec<String> = terms.iter().map(|term| writer.term(term)).collect();
            join(Combinator::And, parts)
        }
        FilterShape::Combinator(combinator, clauses) => writer.group(*combinator, clauses),
    };
    CypherPredicate {
        clause,
        params: writer.params,
    }
}

fn join(combinator: Combinator, parts: Vec<String>) -> String {
    match (combinator, parts.len()) {
        (Combinator::And, 0) => "true".to_owned(),
        (Combinator::Or, 0) => "false".to_owned(),
        (_, 1) => parts.into_iter().next().unwrap_or_default(),
        (Combinator::And, _) => parts.join(" AND "),
        (Combinator::Or, _) => parts.join(" OR "),
    }
}

struct Writer<'a> {
    alias: &'a str,
    params: Map<String, Value>,
}

impl Writer<'_> {
    fn param(&mut self, value: Value) -> String {
        let name = format!("{PARAM_PREFIX}{}", self.params.len());
        self.params.insert(name.clone(), value);
        format!("${name}")
    }

    fn group(&mut self, combinator: Combinator, clauses: &[Clause]) -> String {
        let parts = clauses
            .iter()
            .map(|clause| match clause {
                Clause::Term(term) => self.term(term),
                Clause::Group(inner, children) => format!("({})", self.group(*inner, children)),
            })
            .collect();
        join(combinator, parts)
    }

    fn term(&mut self, term: &Term) -> String {
        let property = property(self.alias, &term.field);
        match &term.predicate {
            Predicate::Eq(Value::Null) => format!("{property} IS NULL"),
            Predicate::Ne(Value::Null) => format!("{property} IS NOT NULL"),
            Predicate::Eq(value) => format!("{property} = {}", self.param(value.clone())),
            Predicate::Ne(value) => format!("{property} <> {}", self.param(value.clone())),
            Predicate::Gt(value) => format!("{property} > {}", self.param(value.clone())),
            Predicate::Gte(value) => format!("{property} >= {}", self.param(value.clone())),
            Predicate::Lt(value) => format!("{property} < {}", self.param(value.clone())),
            Predicate::Lte(value) => format!("{property} <= {}", self.param(value.clone())),
            Predicate::Like(pattern) => {
                let regex = format!("(?{LIKE_FLAGS}).*{pattern}.*");
                format!("{property} =~ {}", self.param(Value::String(regex)))
            }
            Predicate::In(values) => {
                format!("{property} IN {}", self.param(Value::Array(values.clone())))
            }
            Predicate::NotIn(values) => {
                format!("NOT {property} IN {}", self.param(Value::Array(values.clone())))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tenantdb_core::tenant::TenantId;

    use super::{property, to_where};
    use crate::compiler::{FilterCompiler, FilterEvent, replay};
    use crate::predicate::{Combinator, Operand, Operator};
    use crate::profile::BackendProfile;
    use crate::scope::{scope, tenant_filter};

    fn scoped(events: &[FilterEvent]) -> crate::scope::ScopedFilter {
        let profile = BackendProfile::graph();
        let mut compiler = FilterCompiler::new(&profile);
        replay(events, &mut compiler).unwrap();
        let tree = compiler.finish().unwrap();
        scope(&tree, &TenantId::new("t1").unwrap(), &profile)
    }

    #[test]
    fn test_tenant_only_filter() {
        let predicate = to_where(
            &tenant_filter(&TenantId::new("t1").unwrap(), &BackendProfile::graph()),
            "n",
        );

        assert_eq!(predicate.clause, "n.`tenantId` = $f0");
        assert_eq!(predicate.params["f0"], json!("t1"));
    }

    #[test]
    fn test_flat_filter_ands_terms() {
        let predicate = to_where(
            &scoped(&[FilterEvent::comparison("age", Operator::Gt, Operand::scalar(5))]),
            "n",
        );

        assert_eq!(predicate.clause, "n.`age` > $f0 AND n.`tenantId` = $f1");
        assert_eq!(predicate.params["f0"], json!(5));
        assert_eq!(predicate.params["f1"], json!("t1"));
    }

    #[test]
    fn test_nested_groups_are_parenthesised() {
        // Arrange
        let events = [
            FilterEvent::GroupStart(Combinator::And),
            FilterEvent::comparison("id", Operator::NotIn, Operand::list(["u9"])),
            FilterEvent::GroupStart(Combinator::Or),
            FilterEvent::comparison("name", Operator::Like, Operand::scalar("ad")),
            FilterEvent::comparison("nick", Operator::Ne, Operand::scalar("x")),
            FilterEvent::GroupEnd,
            FilterEvent::GroupEnd,
        ];

        // Act
        let predicate = to_where(&scoped(&events), "n");

        // Assert
        assert_eq!(
            predicate.clause,
            "NOT n.`id` IN $f0 AND (n.`name` =~ $f1 OR n.`nick` <> $f2) AND n.`tenantId` = $f3"
        );
        assert_eq!(predicate.params["f0"], json!(["u9"]));
        assert_eq!(predicate.params["f1"], json!("(?im).*ad.*"));
        assert_eq!(predicate.params.len(), 4);
    }

    #[test]
    fn test_or_group_keeps_tenant_inside_disjunction() {
        let events = [
            FilterEvent::GroupStart(Combinator::Or),
            FilterEvent::comparison("a", Operator::Eq, Operand::scalar(1)),
            FilterEvent::comparison("b", Operator::Eq, Operand::scalar(2)),
            FilterEvent::GroupEnd,
        ];

        let predicate = to_where(&scoped(&events), "n");

        assert_eq!(
            predicate.clause,
            "n.`a` = $f0 OR n.`b` = $f1 OR n.`tenantId` = $f2"
        );
    }

    #[test]
    fn test_null_equality_uses_is_null() {
        let predicate = to_where(
            &scoped(&[FilterEvent::comparison(
                "deletedAt",
                Operator::Eq,
                Operand::Scalar(serde_json::Value::Null),
            )]),
            "n",
        );

        assert_eq!(predicate.clause, "n.`deletedAt` IS NULL AND n.`tenantId` = $f0");
    }

    #[test]
    fn test_property_escapes_backticks() {
        assert_eq!(property("n", "we`ird"), "n.`we``ird`");
    }
}
