//! tenantdb Core — shared data-access abstractions.
//!
//! This crate defines the outcome types, tenant context, repository and
//! event-store contracts that every storage backend implements. It contains
//! no driver code.

pub mod clock;
pub mod entity;
pub mod error;
pub mod event;
pub mod outcome;
pub mod paging;
pub mod repository;
pub mod tenant;
