use serde::Serialize;

use crate::error::AppError;

/// Pagination metadata included in list responses.
#[derive(Serialize, utoipa::ToSchema)]
pub struct Pagination {
    /// Current page number (1-based).
    #[schema(example = 1)]
    pub page: u64,
    /// Number of items per page.
    #[schema(example = 20)]
    pub per_page: u64,
    /// Total number of matching items across all pages.
    #[schema(example = 47)]
    pub total: u64,
    /// Total number of pages.
    #[schema(example = 3)]
    pub total_pages: u64,
}

/// Escape LIKE wildcard characters in a search string.
pub fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Validate a trimmed title (1-256 Unicode characters).
pub fn validate_title(title: &str) -> Result<(), AppError> {
    let title = title.trim();
    if title.is_empty() || title.chars().count() > 256 {
        return Err(AppError::Validation(
            "Title must be 1-256 characters".into(),
        ));
    }
    Ok(())
}

/// Validate a free-text list such as tags or constraints.
pub fn validate_string_list(
    items: &[String],
    name: &str,
    max_items: usize,
    max_len: usize,
) -> Result<(), AppError> {
    if items.len() > max_items {
        return Err(AppError::Validation(format!(
            "At most {max_items} {name} allowed"
        )));
    }
    if items
        .iter()
        .any(|s| s.trim().is_empty() || s.chars().count() > max_len)
    {
        return Err(AppError::Validation(format!(
            "Each of {name} must be 1-{max_len} characters"
        )));
    }
    Ok(())
}
