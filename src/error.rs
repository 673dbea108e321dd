//! Error types for threadline operations.

use thiserror::Error;

/// Result type alias for threadline operations.
pub type Result<T> = std::result::Result<T, ThreadlineError>;

/// Main error type for threadline operations.
#[derive(Error, Debug)]
pub enum ThreadlineError {
    /// Remote comment API failures (transport or server-side).
    #[error("Comment API error: {0}")]
    Api(String),

    /// Member directory lookup failures.
    #[error("Member lookup error: {0}")]
    Member(String),

    /// Invalid input or arguments.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization/deserialization errors at the wire boundary.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Requested entity does not exist.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl ThreadlineError {
    /// Creates a new comment API error.
    pub fn api<T: ToString>(msg: T) -> Self {
        Self::Api(msg.to_string())
    }

    /// Creates a new member lookup error.
    pub fn member<T: ToString>(msg: T) -> Self {
        Self::Member(msg.to_string())
    }

    /// Creates a new invalid input error.
    pub fn invalid_input<T: ToString>(msg: T) -> Self {
        Self::InvalidInput(msg.to_string())
    }

    /// Creates a new serialization error.
    pub fn serialization<T: ToString>(msg: T) -> Self {
        Self::Serialization(msg.to_string())
    }

    /// Creates a new not found error.
    pub fn not_found<T: ToString>(msg: T) -> Self {
        Self::NotFound(msg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ThreadlineError::api("relay unreachable");
        assert_eq!(err.to_string(), "Comment API error: relay unreachable");

        let err = ThreadlineError::not_found("comment c42");
        assert_eq!(err.to_string(), "Not found: comment c42");
    }

    #[test]
    fn test_helper_constructors() {
        assert!(matches!(
            ThreadlineError::invalid_input("empty body"),
            ThreadlineError::InvalidInput(_)
        ));
        assert!(matches!(
            ThreadlineError::member("timeout"),
            ThreadlineError::Member(_)
        ));
        assert!(matches!(
            ThreadlineError::serialization("bad json"),
            ThreadlineError::Serialization(_)
        ));
    }
}
