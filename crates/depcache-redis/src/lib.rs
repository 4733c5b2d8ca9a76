//! # depcache-redis
//!
//! Redis backend for the depcache dependency-aware cache.
//!
//! Stored keys can be linked to any number of caller-chosen dependency
//! names; invalidating a name deletes every key linked to it in one
//! atomic server-side operation, without the caller tracking fan-out.
//!
//! ## Architecture
//!
//! - **[`Cache`]**: the pooled client handle — passthrough reads and
//!   writes, dependency linking, cascading invalidation.
//! - **Reverse index**: one backend set per dependency name
//!   (`"depend:" + name`) holding the keys linked to it. Never cached
//!   locally; every membership read is a live round trip.
//! - **[`script`]**: the server-side cascading-delete script and its
//!   registration lifecycle (register once, re-register transparently
//!   when the backend forgets the handle).
//! - **[`pool`]**: deadpool-backed connection pool; borrowed
//!   connections are returned on drop on every exit path.
//!
//! ## Example
//!
//! ```ignore
//! use depcache_redis::{Cache, CacheConfig};
//!
//! let cache = Cache::connect(CacheConfig::new("redis://localhost:6379")).await?;
//!
//! // Write a key that depends on "org:7".
//! cache.set("user:42", "alice", &["org:7"]).await?;
//!
//! // Later: drop everything that depended on "org:7".
//! let dropped = cache.invalidate(&["org:7"]).await?;
//! assert_eq!(dropped, 1);
//! assert!(!cache.exists("user:42").await?);
//! ```

pub mod cache;
pub mod commands;
pub mod config;
pub mod error;
pub mod pool;
pub mod script;

pub use cache::Cache;
pub use config::CacheConfig;
pub use error::{RedisCacheError, is_connection_failure, is_unknown_script};
pub use script::{KILL_BY_DEPENDENCY, ScriptRegistry};

// Re-export the backend-agnostic surface so most callers depend on one
// crate only.
pub use depcache_core::{
    CacheError, CacheResult, CacheValue, DEPENDENCY_PREFIX, ErrorCategory, LinkOutcome,
    dependency_set_key, is_dependency_key,
};
