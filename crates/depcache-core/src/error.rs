//! Error types for dependency-aware cache operations.

/// Errors that can occur during cache operations.
///
/// Partial effects already committed to the backend before an error
/// (for example the primary write preceding a failed dependency link)
/// are never rolled back; see [`crate::LinkOutcome`] for how that case
/// is reported.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The connection pool is exhausted or the backend is unreachable.
    #[error("Connection unavailable: {message}")]
    ConnectionUnavailable {
        /// Description of the connection failure.
        message: String,
    },

    /// A queued command in a dependency-link transaction failed.
    ///
    /// The transaction is aborted as a whole; no partial adds are
    /// visible to committed readers.
    #[error("Link transaction aborted: {message}")]
    TransactionAborted {
        /// The first error reported for the batch.
        message: String,
    },

    /// The backend no longer recognizes the registered script handle.
    ///
    /// Recovered transparently exactly once by re-registering the
    /// script; surfaced only if the retry fails the same way.
    #[error("Script handle unknown to the backend after re-registration")]
    ScriptUnknownHandle,

    /// Registering the cascading-delete script failed.
    #[error("Script registration failed: {message}")]
    ScriptRegistrationFailed {
        /// Description of the registration failure.
        message: String,
    },

    /// Any other backend-reported command failure.
    #[error("Backend error: {message}")]
    Backend {
        /// Description of the backend error.
        message: String,
    },

    /// Invalid connection URL or pool parameters.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },
}

impl CacheError {
    /// Creates a new `ConnectionUnavailable` error.
    #[must_use]
    pub fn connection_unavailable(message: impl Into<String>) -> Self {
        Self::ConnectionUnavailable {
            message: message.into(),
        }
    }

    /// Creates a new `TransactionAborted` error.
    #[must_use]
    pub fn transaction_aborted(message: impl Into<String>) -> Self {
        Self::TransactionAborted {
            message: message.into(),
        }
    }

    /// Creates a new `ScriptRegistrationFailed` error.
    #[must_use]
    pub fn script_registration_failed(message: impl Into<String>) -> Self {
        Self::ScriptRegistrationFailed {
            message: message.into(),
        }
    }

    /// Creates a new `Backend` error.
    #[must_use]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Whether the operation may succeed if issued again as-is.
    ///
    /// Only an unknown script handle is recoverable, and the backend
    /// implementation already performs that single retry internally, so
    /// callers observing this error have exhausted the recovery path.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::ScriptUnknownHandle)
    }

    /// Get the error category for logging and monitoring.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConnectionUnavailable { .. } => ErrorCategory::Connection,
            Self::TransactionAborted { .. } => ErrorCategory::Transaction,
            Self::ScriptUnknownHandle | Self::ScriptRegistrationFailed { .. } => {
                ErrorCategory::Script
            }
            Self::Backend { .. } => ErrorCategory::Backend,
            Self::Configuration { .. } => ErrorCategory::Configuration,
        }
    }
}

/// Error categories for monitoring and classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Connection,
    Transaction,
    Script,
    Backend,
    Configuration,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connection => write!(f, "connection"),
            Self::Transaction => write!(f, "transaction"),
            Self::Script => write!(f, "script"),
            Self::Backend => write!(f, "backend"),
            Self::Configuration => write!(f, "configuration"),
        }
    }
}

/// Convenience result type for cache operations.
pub type CacheResult<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CacheError::connection_unavailable("pool exhausted");
        assert_eq!(err.to_string(), "Connection unavailable: pool exhausted");

        let err = CacheError::transaction_aborted("SADD failed");
        assert_eq!(err.to_string(), "Link transaction aborted: SADD failed");

        let err = CacheError::script_registration_failed("read-only replica");
        assert!(err.to_string().contains("Script registration failed"));
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(
            CacheError::connection_unavailable("x").category(),
            ErrorCategory::Connection
        );
        assert_eq!(
            CacheError::transaction_aborted("x").category(),
            ErrorCategory::Transaction
        );
        assert_eq!(
            CacheError::ScriptUnknownHandle.category(),
            ErrorCategory::Script
        );
        assert_eq!(
            CacheError::script_registration_failed("x").category(),
            ErrorCategory::Script
        );
        assert_eq!(CacheError::backend("x").category(), ErrorCategory::Backend);
        assert_eq!(
            CacheError::configuration("x").category(),
            ErrorCategory::Configuration
        );
    }

    #[test]
    fn test_only_unknown_handle_is_recoverable() {
        assert!(CacheError::ScriptUnknownHandle.is_recoverable());
        assert!(!CacheError::backend("x").is_recoverable());
        assert!(!CacheError::connection_unavailable("x").is_recoverable());
        assert!(!CacheError::script_registration_failed("x").is_recoverable());
    }

    #[test]
    fn test_category_display() {
        assert_eq!(ErrorCategory::Connection.to_string(), "connection");
        assert_eq!(ErrorCategory::Transaction.to_string(), "transaction");
        assert_eq!(ErrorCategory::Script.to_string(), "script");
        assert_eq!(ErrorCategory::Backend.to_string(), "backend");
        assert_eq!(ErrorCategory::Configuration.to_string(), "configuration");
    }
}
