//! Filter tree model.
//!
//! The tree is an arena: nodes live in one `Vec` and refer to their children
//! by [`NodeId`]. Ownership runs strictly top-down; there are no parent
//! pointers. The root is an implicit AND until a group retags it.

use serde_json::{Map, Value};

use crate::predicate::{Combinator, Predicate};

/// Handle of a node inside one [`FilterTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// The root node of every tree.
    pub const ROOT: Self = Self(0);
}

/// Name of a node: a combinator tag, a field, or nothing yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeName {
    /// Not named yet; rendered as an implicit AND.
    Unnamed,
    /// A combinator node.
    Combinator(Combinator),
    /// A leaf comparing this field.
    Field(String),
}

/// One node of the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    name: NodeName,
    value: Option<Predicate>,
    children: Vec<NodeId>,
}

impl Node {
    fn new(name: NodeName) -> Self {
        Self {
            name,
            value: None,
            children: Vec::new(),
        }
    }

    /// The node name.
    #[must_use]
    pub fn name(&self) -> &NodeName {
        &self.name
    }

    /// The leaf predicate, if any.
    #[must_use]
    pub fn value(&self) -> Option<&Predicate> {
        self.value.as_ref()
    }

    /// Child handles in insertion order.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    fn is_leaf(&self) -> bool {
        matches!(self.name, NodeName::Field(_))
    }

    fn combinator(&self) -> Combinator {
        match self.name {
            NodeName::Combinator(combinator) => combinator,
            NodeName::Unnamed | NodeName::Field(_) => Combinator::And,
        }
    }
}

/// A single field comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    /// Native field name.
    pub field: String,
    /// The comparison.
    pub predicate: Predicate,
}

impl Term {
    /// Creates a term.
    #[must_use]
    pub fn new(field: impl Into<String>, predicate: Predicate) -> Self {
        Self {
            field: field.into(),
            predicate,
        }
    }

    /// Renders `{field: value}`.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert(self.field.clone(), self.predicate.to_value());
        Value::Object(map)
    }
}

/// One element of a combinator list.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// A field comparison.
    Term(Term),
    /// A nested group.
    Group(Combinator, Vec<Clause>),
}

impl Clause {
    /// Renders `{field: value}` or `{"$and"|"$or": [...]}`.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Term(term) => term.to_value(),
            Self::Group(combinator, clauses) => group_value(*combinator, clauses),
        }
    }
}

/// The three shapes a rendered root can take.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterShape {
    /// No predicates at all.
    Empty,
    /// A single map of field comparisons, implicitly AND-ed.
    Flat(Vec<Term>),
    /// A combinator with an ordered list of clauses.
    Combinator(Combinator, Vec<Clause>),
}

impl FilterShape {
    /// Renders the shape as a generic map.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Empty => Value::Object(Map::new()),
            Self::Flat(terms) => {
                let mut map = Map::new();
                for term in terms {
                    map.insert(term.field.clone(), term.predicate.to_value());
                }
                Value::Object(map)
            }
            Self::Combinator(combinator, clauses) => group_value(*combinator, clauses),
        }
    }
}

fn group_value(combinator: Combinator, clauses: &[Clause]) -> Value {
    let mut map = Map::new();
    map.insert(
        combinator.tag().to_owned(),
        Value::Array(clauses.iter().map(Clause::to_value).collect()),
    );
    Value::Object(map)
}

/// Ordered, nested boolean predicate structure.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterTree {
    nodes: Vec<Node>,
}

impl Default for FilterTree {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterTree {
    /// Creates a tree holding only the unnamed root.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeName::Unnamed)],
        }
    }

    /// Returns a node by handle.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Returns the root node.
    #[must_use]
    pub fn root(&self) -> &Node {
        self.node(NodeId::ROOT)
    }

    /// Returns `true` when the root has no children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root().children.is_empty()
    }

    /// Appends a new child named `name` under `parent` and returns its handle.
    pub fn new_node(&mut self, parent: NodeId, name: NodeName) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(name));
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Stores the comparison predicate of a leaf.
    pub fn set_leaf_value(&mut self, node: NodeId, predicate: Predicate) {
        self.nodes[node.0].value = Some(predicate);
    }

    /// Renames a node to a combinator in place.
    pub(crate) fn retag(&mut self, node: NodeId, combinator: Combinator) {
        self.nodes[node.0].name = NodeName::Combinator(combinator);
    }

    /// Renders the root into one of the three backend-neutral shapes.
    ///
    /// An unnamed root with a single child renders that child directly, so a
    /// lone comparison becomes a flat map rather than a one-element `$and`.
    #[must_use]
    pub fn render(&self) -> FilterShape {
        let root = self.root();
        if root.children.is_empty() {
            return FilterShape::Empty;
        }
        if root.name == NodeName::Unnamed {
            if let [only] = root.children.as_slice() {
                return match self.clause(*only) {
                    Clause::Term(term) => FilterShape::Flat(vec![term]),
                    Clause::Group(combinator, clauses) => {
                        FilterShape::Combinator(combinator, clauses)
                    }
                };
            }
        }
        FilterShape::Combinator(root.combinator(), self.clauses(NodeId::ROOT))
    }

    /// Renders any node as a generic map: combinators become
    /// `{"$and"|"$or": [child, ...]}`, leaves become `{field: value}`.
    #[must_use]
    pub fn render_node(&self, id: NodeId) -> Value {
        let node = self.node(id);
        if node.is_leaf() {
            return self.clause(id).to_value();
        }
        if node.children.is_empty() {
            return Value::Object(Map::new());
        }
        group_value(node.combinator(), &self.clauses(id))
    }

    /// Maximum number of tagged combinators on any root-to-leaf path.
    #[must_use]
    pub fn combinator_depth(&self) -> usize {
        self.depth_of(NodeId::ROOT)
    }

    fn depth_of(&self, id: NodeId) -> usize {
        let node = self.node(id);
        let own = usize::from(matches!(node.name, NodeName::Combinator(_)));
        let deepest = node
            .children
            .iter()
            .map(|child| self.depth_of(*child))
            .max()
            .unwrap_or(0);
        own + deepest
    }

    fn clauses(&self, id: NodeId) -> Vec<Clause> {
        self.node(id)
            .children
            .iter()
            .map(|child| self.clause(*child))
            .collect()
    }

    fn clause(&self, id: NodeId) -> Clause {
        let node = self.node(id);
        match &node.name {
            NodeName::Field(field) => Clause::Term(Term::new(
                field.clone(),
                node.value
                    .clone()
                    .unwrap_or(Predicate::Eq(Value::Null)),
            )),
            NodeName::Unnamed | NodeName::Combinator(_) => {
                Clause::Group(node.combinator(), self.clauses(id))
            }
        }
    }
}
