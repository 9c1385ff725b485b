//! Content item types, workflow statuses, and slug rules.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;
use crate::fields;
use crate::types::Timestamp;

pub const MAX_TITLE_LENGTH: usize = 300;
pub const MAX_SLUG_LENGTH: usize = 120;
pub const MAX_BODY_LENGTH: usize = 200_000;

pub const TYPE_ARTICLE: &str = "article";
pub const TYPE_PAGE: &str = "page";
pub const TYPE_POST: &str = "post";
pub const TYPE_EMAIL: &str = "email";

pub const CONTENT_TYPES: &[&str] = &[TYPE_ARTICLE, TYPE_PAGE, TYPE_POST, TYPE_EMAIL];

pub const STATUS_DRAFT: &str = "draft";
pub const STATUS_REVIEW: &str = "review";
pub const STATUS_PUBLISHED: &str = "published";
pub const STATUS_ARCHIVED: &str = "archived";

pub const CONTENT_STATUSES: &[&str] = &[STATUS_DRAFT, STATUS_REVIEW, STATUS_PUBLISHED, STATUS_ARCHIVED];

static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("valid slug regex"));

pub fn validate_content_type(content_type: &str) -> Result<(), CoreError> {
    fields::one_of("content type", content_type, CONTENT_TYPES)
}

pub fn validate_content_status(status: &str) -> Result<(), CoreError> {
    fields::one_of("content status", status, CONTENT_STATUSES)
}

pub fn validate_content_slug(slug: &str) -> Result<(), CoreError> {
    if slug.is_empty() || slug.len() > MAX_SLUG_LENGTH || !SLUG_RE.is_match(slug) {
        return Err(CoreError::Validation(format!(
            "Slug '{slug}' must be 1-{MAX_SLUG_LENGTH} lowercase letters, digits, and single hyphens"
        )));
    }
    Ok(())
}

/// Derive a slug from a title: lowercase ASCII alphanumerics joined by hyphens.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    slug.truncate(MAX_SLUG_LENGTH);
    slug.trim_end_matches('-').to_string()
}

/// Statuses reachable from `from`. Archived items may only return to draft.
pub fn valid_transitions(from: &str) -> &'static [&'static str] {
    match from {
        STATUS_DRAFT => &[STATUS_REVIEW, STATUS_PUBLISHED, STATUS_ARCHIVED],
        STATUS_REVIEW => &[STATUS_DRAFT, STATUS_PUBLISHED, STATUS_ARCHIVED],
        STATUS_PUBLISHED => &[STATUS_DRAFT, STATUS_ARCHIVED],
        STATUS_ARCHIVED => &[STATUS_DRAFT],
        _ => &[],
    }
}

pub fn validate_transition(current: &str, next: &str) -> Result<(), CoreError> {
    validate_content_status(next)?;
    if current == next {
        return Ok(());
    }
    let allowed = valid_transitions(current);
    if allowed.contains(&next) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Cannot move content from '{current}' to '{next}'. Allowed: {allowed:?}"
        )))
    }
}

/// `published_at` after a status change: stamped on the first move into
/// `published`, otherwise kept as it was.
pub fn published_at_after(
    current_status: &str,
    next_status: &str,
    current_published_at: Option<Timestamp>,
    now: Timestamp,
) -> Option<Timestamp> {
    if next_status == STATUS_PUBLISHED && current_status != STATUS_PUBLISHED {
        Some(current_published_at.unwrap_or(now))
    } else {
        current_published_at
    }
}
