//! Scripted `FilterParser` replaying canned event streams.

use std::collections::HashMap;

use tenantdb_filter::{FilterError, FilterEvent, FilterEvents, FilterParser, replay};

/// A parser that knows a fixed set of filter strings.
///
/// Each registered filter text maps to the callback sequence a real RSQL
/// parser would produce for it. Unknown text fails with `FilterError::Parse`.
#[derive(Debug, Default, Clone)]
pub struct ScriptedParser {
    scripts: HashMap<String, Vec<FilterEvent>>,
}

impl ScriptedParser {
    /// Creates a parser with no registered filters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the events produced for `filter`.
    #[must_use]
    pub fn with(mut self, filter: impl Into<String>, events: Vec<FilterEvent>) -> Self {
        self.scripts.insert(filter.into(), events);
        self
    }
}

impl FilterParser for ScriptedParser {
    fn parse(&self, filter: &str, events: &mut dyn FilterEvents) -> Result<(), FilterError> {
        let script = self
            .scripts
            .get(filter)
            .ok_or_else(|| FilterError::Parse(format!("unexpected filter '{filter}'")))?;
        replay(script, events)
    }
}
