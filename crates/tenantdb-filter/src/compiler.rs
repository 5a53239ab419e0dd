//! Filter compiler: turns parser callbacks into a [`FilterTree`].
//!
//! The compiler keeps an explicit stack of scope handles. Group starts push,
//! group ends pop, and the stack must be back at the root when the stream
//! ends.

use tracing::debug;

use crate::error::FilterError;
use crate::predicate::{Combinator, Operand, Operator, Predicate};
use crate::profile::BackendProfile;
use crate::tree::{FilterTree, NodeId, NodeName};

/// Callback surface an expression parser drives.
pub trait FilterEvents {
    /// A `kind` group begins.
    ///
    /// # Errors
    ///
    /// Implementations may reject the event.
    fn on_group_start(&mut self, kind: Combinator) -> Result<(), FilterError>;

    /// The innermost open group ends.
    ///
    /// # Errors
    ///
    /// Returns `FilterError::UnbalancedGroupEnd` when no group is open.
    fn on_group_end(&mut self) -> Result<(), FilterError>;

    /// A comparison `field <operator> operand` was read.
    ///
    /// # Errors
    ///
    /// Implementations may reject the comparison.
    fn on_comparison(
        &mut self,
        field: &str,
        operator: Operator,
        operand: Operand,
    ) -> Result<(), FilterError>;
}

/// External parser seam: walks filter text and drives `events`.
pub trait FilterParser: Send + Sync {
    /// Parses `filter` and reports its structure to `events`.
    ///
    /// # Errors
    ///
    /// Returns `FilterError::Parse` for malformed text, or any error raised
    /// by `events`.
    fn parse(&self, filter: &str, events: &mut dyn FilterEvents) -> Result<(), FilterError>;
}

/// A recorded parser callback.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterEvent {
    /// See [`FilterEvents::on_group_start`].
    GroupStart(Combinator),
    /// See [`FilterEvents::on_group_end`].
    GroupEnd,
    /// See [`FilterEvents::on_comparison`].
    Comparison {
        /// The compared field.
        field: String,
        /// The operator.
        operator: Operator,
        /// The right-hand side.
        operand: Operand,
    },
}

impl FilterEvent {
    /// Creates a comparison event.
    pub fn comparison(field: impl Into<String>, operator: Operator, operand: Operand) -> Self {
        Self::Comparison {
            field: field.into(),
            operator,
            operand,
        }
    }
}

/// Replays recorded events into `sink`, stopping at the first error.
///
/// # Errors
///
/// Returns the first error raised by `sink`.
pub fn replay<'a, I>(events: I, sink: &mut dyn FilterEvents) -> Result<(), FilterError>
where
    I: IntoIterator<Item = &'a FilterEvent>,
{
    for event in events {
        match event {
            FilterEvent::GroupStart(kind) => sink.on_group_start(*kind)?,
            FilterEvent::GroupEnd => sink.on_group_end()?,
            FilterEvent::Comparison {
                field,
                operator,
                operand,
            } => sink.on_comparison(field, *operator, operand.clone())?,
        }
    }
    Ok(())
}

/// Single-pass accumulator building a [`FilterTree`] from parser callbacks.
#[derive(Debug)]
pub struct FilterCompiler {
    tree: FilterTree,
    scopes: Vec<NodeId>,
    profile: BackendProfile,
}

impl FilterCompiler {
    /// Creates a compiler whose `current` scope is the root.
    #[must_use]
    pub fn new(profile: &BackendProfile) -> Self {
        Self {
            tree: FilterTree::new(),
            scopes: vec![NodeId::ROOT],
            profile: profile.clone(),
        }
    }

    /// The node currently receiving children.
    #[must_use]
    pub fn current(&self) -> NodeId {
        self.scopes.last().copied().unwrap_or(NodeId::ROOT)
    }

    /// Number of groups currently open.
    #[must_use]
    pub fn open_groups(&self) -> usize {
        self.scopes.len() - 1
    }

    /// The tree built so far.
    #[must_use]
    pub fn tree(&self) -> &FilterTree {
        &self.tree
    }

    /// Ends compilation and returns the tree.
    ///
    /// # Errors
    ///
    /// Returns `FilterError::UnclosedGroups` if any group is still open.
    pub fn finish(self) -> Result<FilterTree, FilterError> {
        match self.open_groups() {
            0 => Ok(self.tree),
            open => Err(FilterError::UnclosedGroups(open)),
        }
    }
}

impl FilterEvents for FilterCompiler {
    fn on_group_start(&mut self, kind: Combinator) -> Result<(), FilterError> {
        let current = self.current();
        let node = self.tree.node(current);
        let scope = if *node.name() == NodeName::Unnamed && node.children().is_empty() {
            // Retag in place; the scope is pushed again so the matching end balances.
            self.tree.retag(current, kind);
            current
        } else {
            self.tree.new_node(current, NodeName::Combinator(kind))
        };
        self.scopes.push(scope);
        Ok(())
    }

    fn on_group_end(&mut self) -> Result<(), FilterError> {
        if self.scopes.len() <= 1 {
            return Err(FilterError::UnbalancedGroupEnd);
        }
        self.scopes.pop();
        Ok(())
    }

    fn on_comparison(
        &mut self,
        field: &str,
        operator: Operator,
        operand: Operand,
    ) -> Result<(), FilterError> {
        if field.trim().is_empty() {
            return Err(FilterError::EmptyField);
        }
        let name = self.profile.native_field(field).to_owned();
        let leaf = self.tree.new_node(self.current(), NodeName::Field(name));
        self.tree
            .set_leaf_value(leaf, Predicate::from_comparison(operator, operand));
        Ok(())
    }
}

/// Parses `filter` with `parser` and compiles it for `profile`.
///
/// Blank filter text yields an empty tree without invoking the parser.
///
/// # Errors
///
/// Returns parser errors and compiler contract violations.
pub fn compile_filter(
    parser: &dyn FilterParser,
    profile: &BackendProfile,
    filter: &str,
) -> Result<FilterTree, FilterError> {
    let mut compiler = FilterCompiler::new(profile);
    if filter.trim().is_empty() {
        return compiler.finish();
    }
    debug!(filter, "compiling filter");
    parser.parse(filter, &mut compiler)?;
    compiler.finish()
}
