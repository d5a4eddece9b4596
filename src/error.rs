//! # Error Types
//!
//! This module defines error types used throughout the labelsmith library.
//!
//! Only I/O-layer failures are meant to reach the operator. Algorithmic edge
//! cases (empty text, zero-size boxes, missing aliases, empty undo stacks)
//! are recovered where they occur and never produce a `LabelError`.

use thiserror::Error;

/// Result type for label engine operations.
pub type LabelResult<T> = Result<T, LabelError>;

/// Main error type for labelsmith operations
#[derive(Debug, Error)]
pub enum LabelError {
    /// No element with this id in the store
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// Operation not applicable to the target (e.g. ungroup on a text element)
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// A property patch that does not fit the element's type
    #[error("Invalid property '{key}': {reason}")]
    InvalidProperty { key: String, reason: String },

    /// Symbol could not be encoded (bad characters, wrong length, too long)
    #[error("Encode error: {0}")]
    Encode(String),

    /// Image decode/encode error
    #[error("Image error: {0}")]
    Image(String),

    /// Fetching or saving through a collaborator failed
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Configuration could not be read or parsed
    #[error("Config error: {0}")]
    Config(String),

    /// JSON (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for LabelError {
    fn from(e: reqwest::Error) -> Self {
        LabelError::Fetch(e.to_string())
    }
}

impl From<image::ImageError> for LabelError {
    fn from(e: image::ImageError) -> Self {
        LabelError::Image(e.to_string())
    }
}
