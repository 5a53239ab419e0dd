//! Shared test doubles and utilities for tenantdb.

mod clock;
mod collection;
mod event_store;
mod graph;
mod matcher;
mod parser;

pub use clock::FixedClock;
pub use collection::InMemoryCollection;
pub use event_store::{EmptyEventStore, FailingEventStore, InMemoryEventStore};
pub use graph::RecordingGraphSession;
pub use matcher::{compare_values, matches};
pub use parser::ScriptedParser;
