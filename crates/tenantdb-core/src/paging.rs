//! Paged lookups: query, sort order and the paged outcome.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// A tenant-scoped, filtered and sorted page request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindPagingQuery {
    /// The tenant whose data is queried.
    pub tenant_id: String,
    /// RSQL-style filter text; empty means "all".
    pub filter: String,
    /// Sort specification, e.g. `name,-createdAt`.
    pub sort: String,
    /// Zero-based page number.
    pub page_num: i64,
    /// Page size; zero disables paging.
    pub page_size: i64,
}

impl FindPagingQuery {
    /// Creates a query for `tenant_id` with no filter, sort or paging.
    #[must_use]
    pub fn new(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            ..Self::default()
        }
    }

    /// Sets the filter text.
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    /// Sets the sort specification.
    #[must_use]
    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = sort.into();
        self
    }

    /// Sets the page number and size.
    #[must_use]
    pub fn with_page(mut self, page_num: i64, page_size: i64) -> Self {
        self.page_num = page_num;
        self.page_size = page_size;
        self
    }

    /// Checks that the page number and size are usable.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidFilter` for a negative page number or
    /// size, or a page whose offset does not fit in an `i64`.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.page_num < 0 {
            return Err(DomainError::InvalidFilter(format!(
                "pageNum must not be negative, got {}",
                self.page_num
            )));
        }
        if self.page_size < 0 {
            return Err(DomainError::InvalidFilter(format!(
                "pageSize must not be negative, got {}",
                self.page_size
            )));
        }
        self.skip().map(|_| ())
    }

    /// Number of rows to skip for the requested page.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidFilter` if the offset overflows.
    pub fn skip(&self) -> Result<i64, DomainError> {
        if self.page_size <= 0 {
            return Ok(0);
        }
        self.page_size
            .checked_mul(self.page_num.max(0))
            .ok_or_else(|| {
                DomainError::InvalidFilter(format!(
                    "page {} of size {} is out of range",
                    self.page_num, self.page_size
                ))
            })
    }

    /// Row limit for the requested page, if paging is enabled.
    #[must_use]
    pub fn limit(&self) -> Option<i64> {
        (self.page_size > 0).then_some(self.page_size)
    }
}

/// Computes the page count for `total_rows`.
///
/// An extra page is added only when the remainder exceeds one row, so
/// `total_pages(11, 5) == 2` while `total_pages(12, 5) == 3`.
#[must_use]
pub fn total_pages(total_rows: i64, page_size: i64) -> i64 {
    if page_size == 0 {
        return 0;
    }
    let mut pages = total_rows / page_size;
    if total_rows % page_size > 1 {
        pages += 1;
    }
    pages
}

/// Sort direction of one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Ascending order.
    Asc,
    /// Descending order.
    Desc,
}

/// One field of a sort specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortField {
    /// The logical field name.
    pub field: String,
    /// The direction.
    pub direction: SortDirection,
}

impl SortField {
    /// Parses a comma separated sort specification.
    ///
    /// Each item is `field`, `field:asc`, `field:desc` or `-field`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidFilter` for an empty field name or an
    /// unknown direction.
    pub fn parse_list(spec: &str) -> Result<Vec<Self>, DomainError> {
        spec.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(Self::parse)
            .collect()
    }

    fn parse(item: &str) -> Result<Self, DomainError> {
        let (field, direction) = if let Some(field) = item.strip_prefix('-') {
            (field, SortDirection::Desc)
        } else if let Some((field, dir)) = item.split_once(':') {
            let direction = match dir.trim().to_ascii_lowercase().as_str() {
                "asc" => SortDirection::Asc,
                "desc" => SortDirection::Desc,
                other => {
                    return Err(DomainError::InvalidFilter(format!(
                        "unknown sort direction '{other}' for field '{field}'"
                    )));
                }
            };
            (field, direction)
        } else {
            (item, SortDirection::Asc)
        };

        let field = field.trim();
        if field.is_empty() {
            return Err(DomainError::InvalidFilter(format!(
                "sort item '{item}' has no field name"
            )));
        }
        Ok(Self {
            field: field.to_owned(),
            direction,
        })
    }
}

/// Outcome of a paged lookup.
#[derive(Debug)]
pub struct FindPagingResult<T> {
    data: Option<Vec<T>>,
    total_rows: i64,
    total_pages: i64,
    page_num: i64,
    page_size: i64,
    filter: String,
    sort: String,
    found: bool,
    error: Option<DomainError>,
}

impl<T> FindPagingResult<T> {
    /// Creates a paged outcome.
    ///
    /// Pagination fields are copied from `query` when both it and `data` are
    /// present. The page counts as found iff `total_rows > 0`.
    #[must_use]
    pub fn new(
        data: Option<Vec<T>>,
        total_rows: i64,
        query: Option<&FindPagingQuery>,
        error: Option<DomainError>,
    ) -> Self {
        let (total_pages, page_num, page_size, filter, sort) = match (&data, query) {
            (Some(_), Some(query)) => (
                total_pages(total_rows, query.page_size),
                query.page_num,
                query.page_size,
                query.filter.clone(),
                query.sort.clone(),
            ),
            _ => (0, 0, 0, String::new(), String::new()),
        };
        let found = total_rows > 0 && error.is_none() && data.is_some();
        Self {
            data,
            total_rows,
            total_pages,
            page_num,
            page_size,
            filter,
            sort,
            found,
            error,
        }
    }

    /// Creates a failed paged outcome.
    #[must_use]
    pub fn with_error(error: DomainError) -> Self {
        Self::new(None, 0, None, Some(error))
    }

    /// Returns the error, if the lookup failed.
    #[must_use]
    pub fn error(&self) -> Option<&DomainError> {
        self.error.as_ref()
    }

    /// Returns the rows of the page.
    #[must_use]
    pub fn data(&self) -> Option<&[T]> {
        self.data.as_deref()
    }

    /// Returns `true` if the filter matched at least one row.
    #[must_use]
    pub fn is_found(&self) -> bool {
        self.found
    }

    /// Total rows matching the filter across all pages.
    #[must_use]
    pub fn total_rows(&self) -> i64 {
        self.total_rows
    }

    /// Number of pages.
    #[must_use]
    pub fn total_pages(&self) -> i64 {
        self.total_pages
    }

    /// Zero-based page number.
    #[must_use]
    pub fn page_num(&self) -> i64 {
        self.page_num
    }

    /// Page size.
    #[must_use]
    pub fn page_size(&self) -> i64 {
        self.page_size
    }

    /// The filter text the page was produced from.
    #[must_use]
    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// The sort specification the page was produced from.
    #[must_use]
    pub fn sort(&self) -> &str {
        &self.sort
    }

    /// Runs `success` on the rows iff there is no error and rows were found.
    #[must_use]
    pub fn on_success<F>(mut self, success: F) -> Self
    where
        F: FnOnce(&[T]) -> Result<(), DomainError>,
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

    /// Turns an empty page into the error returned by `not_found`.
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

    /// Converts to a `Result` over the page rows.
    ///
    /// # Errors
    ///
    /// Returns the carried error if the lookup failed.
    pub fn into_result(self) -> Result<Vec<T>, DomainError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.data.unwrap_or_default()),
        }
    }
}
