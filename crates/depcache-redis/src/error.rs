//! Error types for the Redis cache backend.

use depcache_core::CacheError;
use redis::{ErrorKind, RedisError};

/// Checks if a Redis error reports an unknown script handle (NOSCRIPT).
///
/// Redis forgets registered scripts when its script cache is flushed or
/// the process restarts; this condition is the trigger for transparent
/// re-registration.
pub fn is_unknown_script(err: &RedisError) -> bool {
    err.kind() == ErrorKind::NoScriptError
}

/// Checks if a Redis error means the backend could not be reached at all,
/// as opposed to the backend rejecting a command.
pub fn is_connection_failure(err: &RedisError) -> bool {
    err.is_io_error()
        || err.is_connection_refusal()
        || err.is_connection_dropped()
        || err.is_timeout()
}

/// Errors specific to the Redis cache backend.
#[derive(Debug, thiserror::Error)]
pub enum RedisCacheError {
    /// A Redis command failed.
    #[error("Redis command error: {0}")]
    Command(#[from] RedisError),

    /// The pool could not be built from the configuration.
    #[error("Pool creation error: {0}")]
    CreatePool(#[from] deadpool_redis::CreatePoolError),

    /// A connection could not be borrowed from the pool.
    #[error("Pool error: {0}")]
    Pool(#[from] deadpool_redis::PoolError),

    /// A dependency-link transaction was aborted.
    #[error("Link transaction aborted: {message}")]
    Transaction { message: String },

    /// Loading the cascading-delete script failed.
    #[error("Script registration failed: {message}")]
    ScriptRegistration { message: String },

    /// The script handle was still unknown after re-registration.
    #[error("Script handle unknown after re-registration")]
    ScriptUnknown,

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl RedisCacheError {
    /// Creates a new transaction error.
    #[must_use]
    pub fn transaction(message: impl Into<String>) -> Self {
        Self::Transaction {
            message: message.into(),
        }
    }

    /// Creates a new script registration error.
    #[must_use]
    pub fn script_registration(message: impl Into<String>) -> Self {
        Self::ScriptRegistration {
            message: message.into(),
        }
    }

    /// Creates a new configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

impl From<RedisCacheError> for CacheError {
    fn from(err: RedisCacheError) -> Self {
        match err {
            RedisCacheError::Command(e) => {
                if is_connection_failure(&e) {
                    CacheError::connection_unavailable(e.to_string())
                } else {
                    CacheError::backend(e.to_string())
                }
            }
            RedisCacheError::CreatePool(e) => CacheError::configuration(e.to_string()),
            RedisCacheError::Pool(e) => CacheError::connection_unavailable(e.to_string()),
            RedisCacheError::Transaction { message } => CacheError::transaction_aborted(message),
            RedisCacheError::ScriptRegistration { message } => {
                CacheError::script_registration_failed(message)
            }
            RedisCacheError::ScriptUnknown => CacheError::ScriptUnknownHandle,
            RedisCacheError::Config { message } => CacheError::configuration(message),
        }
    }
}

/// Result type alias for Redis backend operations.
pub type Result<T> = std::result::Result<T, RedisCacheError>;
