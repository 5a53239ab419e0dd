//! Comparison operators, operands and the predicates they compile to.

use serde_json::{Map, Value, json};

/// Regex flags applied to `like`: case-insensitive, multiline.
pub const LIKE_FLAGS: &str = "im";

/// Logical combinator of a group node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Combinator {
    /// All children must match.
    And,
    /// At least one child must match.
    Or,
}

impl Combinator {
    /// The generic map tag (`$and` / `$or`).
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::And => "$and",
            Self::Or => "$or",
        }
    }
}

/// Comparison operators the parser reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// Case-insensitive substring / regular-expression match.
    Like,
    /// Negated `like`.
    NotLike,
    /// `>`
    Gt,
    /// `>=`
    Gte,
    /// `<`
    Lt,
    /// `<=`
    Lte,
    /// Membership in a list.
    In,
    /// Non-membership in a list.
    NotIn,
}

/// Right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A single value.
    Scalar(Value),
    /// A list of values (`in` / `out` style operands).
    List(Vec<Value>),
}

impl Operand {
    /// Creates a scalar operand.
    pub fn scalar(value: impl Into<Value>) -> Self {
        Self::Scalar(value.into())
    }

    /// Creates a list operand.
    pub fn list<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::List(values.into_iter().map(Into::into).collect())
    }

    fn into_value(self) -> Value {
        match self {
            Self::Scalar(value) => value,
            Self::List(values) => Value::Array(values),
        }
    }

    fn into_list(self) -> Vec<Value> {
        match self {
            Self::Scalar(value) => vec![value],
            Self::List(values) => values,
        }
    }

    fn into_pattern(self) -> String {
        match self.into_value() {
            Value::String(pattern) => pattern,
            other => other.to_string(),
        }
    }
}

/// The operator-tagged value stored on a leaf node.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Equal to the raw value.
    Eq(Value),
    /// Not equal.
    Ne(Value),
    /// Greater than.
    Gt(Value),
    /// Greater than or equal.
    Gte(Value),
    /// Less than.
    Lt(Value),
    /// Less than or equal.
    Lte(Value),
    /// Case-insensitive multiline regex match on the raw pattern.
    Like(String),
    /// Member of the list.
    In(Vec<Value>),
    /// Not a member of the list.
    NotIn(Vec<Value>),
}

impl Predicate {
    /// Compiles one parser comparison into a predicate.
    ///
    /// `NotLike` compiles to `Lt` on the raw operand, matching the observed
    /// behavior of existing deployments. `In`/`NotIn` accept a scalar as a
    /// one-element list.
    #[must_use]
    pub fn from_comparison(operator: Operator, operand: Operand) -> Self {
        match operator {
            Operator::Eq => Self::Eq(operand.into_value()),
            Operator::Ne => Self::Ne(operand.into_value()),
            Operator::Like => Self::Like(operand.into_pattern()),
            Operator::NotLike | Operator::Lt => Self::Lt(operand.into_value()),
            Operator::Gt => Self::Gt(operand.into_value()),
            Operator::Gte => Self::Gte(operand.into_value()),
            Operator::Lte => Self::Lte(operand.into_value()),
            Operator::In => Self::In(operand.into_list()),
            Operator::NotIn => Self::NotIn(operand.into_list()),
        }
    }

    /// Renders the predicate as a generic value: raw for equality,
    /// `{"$op": value}` otherwise, `{"$regex", "$options"}` for `like`.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Eq(value) => value.clone(),
            Self::Ne(value) => json!({ "$ne": value }),
            Self::Gt(value) => json!({ "$gt": value }),
            Self::Gte(value) => json!({ "$gte": value }),
            Self::Lt(value) => json!({ "$lt": value }),
            Self::Lte(value) => json!({ "$lte": value }),
            Self::Like(pattern) => {
                let mut regex = Map::new();
                regex.insert("$regex".to_owned(), Value::String(pattern.clone()));
                regex.insert("$options".to_owned(), Value::String(LIKE_FLAGS.to_owned()));
                Value::Object(regex)
            }
            Self::In(values) => json!({ "$in": values }),
            Self::NotIn(values) => json!({ "$nin": values }),
        }
    }
}
