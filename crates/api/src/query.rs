//! Query parameter types shared by several handler modules.

use atrium_core::search::{clamp_limit, clamp_offset, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};
use serde::Deserialize;

/// Generic pagination parameters (`?limit=&offset=`).
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PaginationParams {
    /// Clamped `(limit, offset)` ready to bind.
    pub fn resolve(&self) -> (i64, i64) {
        (
            clamp_limit(self.limit, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT),
            clamp_offset(self.offset),
        )
    }
}

/// Query parameters for list endpoints that support an `include_inactive` flag.
#[derive(Debug, Default, Deserialize)]
pub struct IncludeInactiveParams {
    #[serde(default)]
    pub include_inactive: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl IncludeInactiveParams {
    pub fn page(&self) -> (i64, i64) {
        (
            clamp_limit(self.limit, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT),
            clamp_offset(self.offset),
        )
    }
}

/// Filters accepted by the business-entity list endpoints.
///
/// Each handler reads the fields that apply to its entity and ignores the
/// rest.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub status: Option<String>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ListParams {
    pub fn page(&self) -> (i64, i64) {
        (
            clamp_limit(self.limit, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT),
            clamp_offset(self.offset),
        )
    }

    /// Escaped `ILIKE` pattern for `search`, if a non-blank term was given.
    pub fn search_pattern(&self) -> Option<String> {
        self.search
            .as_deref()
            .and_then(atrium_core::search::like_pattern)
    }
}
