//! Validation errors raised before any state change or remote call.

use thiserror::Error;

/// Input rejected synchronously by the domain layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Identifier text could not be parsed.
    #[error("malformed id: {0}")]
    MalformedId(String),

    /// Title is empty or whitespace only.
    #[error("title must not be blank")]
    BlankTitle,

    /// Identifier does not resolve in the current board list.
    #[error("unknown {kind}: {id}")]
    Unknown {
        /// Entity kind (`board` or `task`).
        kind: &'static str,
        /// Identifier text.
        id: String,
    },
}

/// Trim a title and reject it when nothing remains.
///
/// # Errors
/// Returns [`ValidationError::BlankTitle`] for empty or whitespace-only input.
pub fn normalize_title(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::BlankTitle);
    }
    Ok(trimmed.to_owned())
}
