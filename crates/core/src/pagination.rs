//! Page requests and page envelopes.

use serde::{Deserialize, Serialize};

use crate::validation::{ValidationError, Violations};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// SQL keyword.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// `?page=&size=&sortBy=&sortDirection=` query parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageRequest {
    /// Zero-based page index.
    pub page: u32,
    pub size: u32,
    pub sort_by: Option<String>,
    pub sort_direction: SortDirection,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
            sort_by: None,
            sort_direction: SortDirection::Asc,
        }
    }
}

/// A checked page request with its sort column resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSpec {
    pub page: u32,
    pub size: u32,
    /// Entry from the caller's whitelist; safe to splice into SQL.
    pub sort_column: &'static str,
    pub direction: SortDirection,
}

impl PageSpec {
    #[must_use]
    pub const fn limit(&self) -> i64 {
        self.size as i64
    }

    #[must_use]
    pub const fn offset(&self) -> i64 {
        self.page as i64 * self.size as i64
    }
}

impl PageRequest {
    #[must_use]
    pub const fn new(page: u32, size: u32) -> Self {
        Self {
            page,
            size,
            sort_by: None,
            sort_direction: SortDirection::Asc,
        }
    }

    /// Check the size and map `sortBy` through `sortable`.
    ///
    /// `sortable` pairs each accepted wire name with its column; `id` is the
    /// default when `sortBy` is absent.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] for an out-of-range size or an unknown
    /// sort field.
    pub fn resolve(
        &self,
        sortable: &[(&str, &'static str)],
    ) -> Result<PageSpec, ValidationError> {
        let mut violations = Violations::new();
        violations.check(
            self.size == 0 || self.size > MAX_PAGE_SIZE,
            format!("Page size must be between 1 and {MAX_PAGE_SIZE}"),
        );

        let wanted = self.sort_by.as_deref().map_or("id", str::trim);
        let sort_column = sortable
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(wanted))
            .map(|(_, column)| *column);
        if sort_column.is_none() {
            violations.push(format!("Invalid sort field: {wanted}"));
        }

        violations.finish()?;
        Ok(PageSpec {
            page: self.page,
            size: self.size,
            sort_column: sort_column.unwrap_or("id"),
            direction: self.sort_direction,
        })
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    #[must_use]
    pub fn new(content: Vec<T>, spec: &PageSpec, total_elements: u64) -> Self {
        let size = u64::from(spec.size.max(1));
        Self {
            content,
            page: spec.page,
            size: spec.size,
            total_elements,
            total_pages: total_elements.div_ceil(size),
        }
    }

    /// Convert every item, keeping the paging metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        }
    }
}
