//! Pagination bounds and free-text search helpers shared by list endpoints.

/// Default page size for list endpoints.
pub const DEFAULT_LIST_LIMIT: i64 = 50;

/// Hard upper bound on page size.
pub const MAX_LIST_LIMIT: i64 = 200;

/// Maximum accepted length of a `q` search term.
pub const MAX_SEARCH_TERM_LEN: usize = 200;

/// Clamp a user-provided limit to valid bounds.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).max(1).min(max)
}

/// Clamp a user-provided offset to non-negative.
pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}

/// Build an `ILIKE` pattern from a free-text term.
///
/// Escapes the LIKE metacharacters (`%`, `_`, `\`) so user input only ever
/// matches literally, trims whitespace, and returns `None` for empty input.
pub fn like_pattern(term: &str) -> Option<String> {
    let trimmed = term.trim();
    if trimmed.is_empty() {
        return None;
    }
    let truncated: String = trimmed.chars().take(MAX_SEARCH_TERM_LEN).collect();
    let mut escaped = String::with_capacity(truncated.len() + 2);
    escaped.push('%');
    for c in truncated.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    Some(escaped)
}
