use thiserror::Error;

/// Core error type for stamp operations.
#[derive(Error, Debug)]
pub enum StampError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("More than one migration matches '{query}': {}", .matches.join(", "))]
    AmbiguousQuery { query: String, matches: Vec<String> },

    #[error("Migration already disabled: {0}")]
    AlreadyDisabled(String),

    #[error("Migration already enabled: {0}")]
    NotDisabled(String),

    #[error("Migration file already exists: {0}")]
    Conflict(String),

    #[error("Invalid migration filename: {0}")]
    InvalidFilename(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),

    #[error("Runner error: {0}")]
    Runner(String),
}

impl StampError {
    /// Whether the error is a user precondition rather than an environment failure.
    ///
    /// The CLI prints these as a single line instead of an error chain.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::NotFound(_)
                | Self::AmbiguousQuery { .. }
                | Self::AlreadyDisabled(_)
                | Self::NotDisabled(_)
                | Self::Conflict(_)
        )
    }
}

/// Result type alias using StampError.
pub type Result<T> = std::result::Result<T, StampError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ambiguous_message_lists_matches() {
        let err = StampError::AmbiguousQuery {
            query: "init".into(),
            matches: vec!["202401010000_init.rb".into(), "202401010000_init.rb.bak".into()],
        };
        assert_eq!(
            err.to_string(),
            "More than one migration matches 'init': 202401010000_init.rb, 202401010000_init.rb.bak"
        );
    }

    #[test]
    fn test_user_error_classification() {
        assert!(StampError::AlreadyDisabled("x".into()).is_user_error());
        assert!(StampError::Conflict("x".into()).is_user_error());
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(!StampError::from(io).is_user_error());
        assert!(!StampError::Runner("exit 1".into()).is_user_error());
    }

    #[test]
    fn test_sqlx_error_converts() {
        let err: StampError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, StampError::Sql(_)));
        assert!(!err.is_user_error());
    }
}
