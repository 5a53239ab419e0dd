//! Generic repository outcome types.
//!
//! Every repository operation wraps its result in an [`Outcome`], which
//! separates "matched", "matched nothing" and "failed". Callers chain the
//! continuation methods instead of branching on raw errors:
//!
//! ```
//! use tenantdb_core::error::DomainError;
//! use tenantdb_core::outcome::FindResult;
//!
//! let outcome: FindResult<String> = FindResult::not_found();
//! let result = outcome
//!     .on_success(|name| {
//!         println!("found {name}");
//!         Ok(())
//!     })
//!     .on_not_found(|| DomainError::NotFound("user u1".into()))
//!     .into_result();
//! assert!(matches!(result, Err(DomainError::NotFound(_))));
//! ```

use crate::error::DomainError;

/// Payload, found signal and optional error of one repository operation.
///
/// `error` and `found` are never set together, and `found` implies a
/// payload is present.
#[derive(Debug)]
pub struct Outcome<D> {
    data: Option<D>,
    found: bool,
    error: Option<DomainError>,
}

/// Outcome of a single-entity lookup.
pub type FindResult<T> = Outcome<T>;

/// Outcome of a list lookup.
pub type FindListResult<T> = Outcome<Vec<T>>;

/// Outcome of a single-entity mutation.
pub type SetResult<T> = Outcome<T>;

/// Outcome of a batch mutation.
pub type SetManyResult<T> = Outcome<Vec<T>>;

impl<D> Outcome<D> {
    /// Creates an outcome from its raw parts, normalising the found flag.
    #[must_use]
    pub fn new(data: Option<D>, found: bool, error: Option<DomainError>) -> Self {
        let found = found && error.is_none() && data.is_some();
        Self { data, found, error }
    }

    /// Creates a failed outcome for early-exit paths.
    #[must_use]
    pub fn with_error(error: DomainError) -> Self {
        Self {
            data: None,
            found: false,
            error: Some(error),
        }
    }

    /// Creates a matched outcome.
    #[must_use]
    pub fn found(data: D) -> Self {
        Self {
            data: Some(data),
            found: true,
            error: None,
        }
    }

    /// Creates an outcome that completed without matching anything.
    #[must_use]
    pub fn not_found() -> Self {
        Self {
            data: None,
            found: false,
            error: None,
        }
    }

    /// Converts a backend call result, treating `Ok(None)` as not found.
    #[must_use]
    pub fn from_result(result: Result<Option<D>, DomainError>) -> Self {
        match result {
            Ok(Some(data)) => Self::found(data),
            Ok(None) => Self::not_found(),
            Err(err) => Self::with_error(err),
        }
    }

    /// Returns the error, if the operation failed.
    #[must_use]
    pub fn error(&self) -> Option<&DomainError> {
        self.error.as_ref()
    }

    /// Returns the payload, if any.
    #[must_use]
    pub fn data(&self) -> Option<&D> {
        self.data.as_ref()
    }

    /// Returns `true` if the operation matched and did not fail.
    #[must_use]
    pub fn is_found(&self) -> bool {
        self.found
    }

    /// Runs `success` on the payload iff there is no error and it was found.
    ///
    /// An error returned by `success` becomes the outcome's error.
    #[must_use]
    pub fn on_success<F>(mut self, success: F) -> Self
    where
        F: FnOnce(&D) -> Result<(), DomainError>,
    {
        if self.error.is_none() && self.found {
            if let Some(data) = &self.data {
                if let Err(err) = success(data) {
                    self.found = false;
                    self.error = Some(err);
                }
            }
        }
        self
    }

    /// Replaces the error with the return value of `on_err` iff failed.
    #[must_use]
    pub fn on_error<F>(mut self, on_err: F) -> Self
    where
        F: FnOnce(DomainError) -> DomainError,
    {
        if let Some(err) = self.error.take() {
            self.error = Some(on_err(err));
        }
        self
    }

    /// Turns "matched nothing" into the error returned by `not_found`.
    ///
    /// Never invoked when the outcome already carries an error.
    #[must_use]
    pub fn on_not_found<F>(mut self, not_found: F) -> Self
    where
        F: FnOnce() -> DomainError,
    {
        if self.error.is_none() && !self.found {
            self.error = Some(not_found());
        }
        self
    }

    /// Transforms the payload, keeping the found flag and error.
    #[must_use]
    pub fn map<U, F>(self, f: F) -> Outcome<U>
    where
        F: FnOnce(D) -> U,
    {
        Outcome {
            data: self.data.map(f),
            found: self.found,
            error: self.error,
        }
    }

    /// Splits the outcome into payload, found flag and error.
    #[must_use]
    pub fn into_parts(self) -> (Option<D>, bool, Option<DomainError>) {
        (self.data, self.found, self.error)
    }

    /// Converts to a `Result`, with `Ok(None)` for "matched nothing".
    ///
    /// # Errors
    ///
    /// Returns the carried error if the operation failed.
    pub fn into_result(self) -> Result<Option<D>, DomainError> {
        match self.error {
            Some(err) => Err(err),
            None if self.found => Ok(self.data),
            None => Ok(None),
        }
    }
}

impl<T> Outcome<Vec<T>> {
    /// Creates a list outcome that counts as found iff `list` is non-empty.
    #[must_use]
    pub fn from_list(list: Vec<T>) -> Self {
        let found = !list.is_empty();
        Self {
            data: Some(list),
            found,
            error: None,
        }
    }
}

impl Outcome<u64> {
    /// Creates a mutation-count outcome that counts as found iff `count > 0`.
    #[must_use]
    pub fn from_count(count: u64) -> Self {
        Self {
            data: Some(count),
            found: count > 0,
            error: None,
        }
    }
}
