//! Validation helpers for DTOs.

use validator::ValidationError;

/// Validates that a category is a non-empty numeric provider identifier.
///
/// # Examples
///
/// ```ignore
/// validate_category("9")    // Ok - general knowledge
/// validate_category("22")   // Ok - geography
/// validate_category("")     // Err - empty
/// validate_category("news") // Err - not numeric
/// ```
pub fn validate_category(category: &str) -> Result<(), ValidationError> {
    if category.is_empty() {
        let mut err = ValidationError::new("category_empty");
        err.message = Some("Category must not be empty".into());
        return Err(err);
    }

    if !category.chars().all(|c| c.is_ascii_digit()) {
        let mut err = ValidationError::new("category_format");
        err.message = Some("Category must be a numeric provider identifier".into());
        return Err(err);
    }

    Ok(())
}
