//! Error types for the worksheet core
//!
//! Only configuration and persistence failures are errors. Routine domain
//! guards (deleting the last section, the last term, ...) are silent no-ops
//! and never reach this type.

use thiserror::Error;

/// Errors surfaced to the caller
#[derive(Error, Debug)]
pub enum SheetError {
    #[error("usable height must be positive and finite, got {0}")]
    InvalidUsableHeight(f32),

    #[error("usable width must be positive and finite, got {0}")]
    InvalidUsableWidth(f32),

    #[error("invalid page geometry: {0}")]
    InvalidGeometry(String),

    #[error("unknown box size: {0}")]
    InvalidBoxSize(String),

    #[error("failed to parse JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Result type alias for worksheet operations
pub type Result<T> = std::result::Result<T, SheetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = SheetError::InvalidUsableHeight(0.0);
        assert_eq!(err.to_string(), "usable height must be positive and finite, got 0");

        let err = SheetError::InvalidBoxSize("SIZE_9MM".into());
        assert_eq!(err.to_string(), "unknown box size: SIZE_9MM");
    }

    #[test]
    fn test_parse_error_conversion() {
        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: SheetError = parse.into();
        assert!(matches!(err, SheetError::Parse(_)));
    }
}
