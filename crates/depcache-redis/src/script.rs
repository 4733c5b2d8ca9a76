//! Server-side script lifecycle for cascading invalidation.
//!
//! The find-dependents-and-delete step of an invalidation must be atomic
//! from the point of view of any concurrent linker or reader, so it runs
//! as a single server-side Lua script: one round trip, one atomic
//! execution unit on the backend. This module owns that script's body
//! and its registration lifecycle.
//!
//! ## Handle lifecycle
//!
//! ```text
//! Unregistered ──SCRIPT LOAD──► Registered ──NOSCRIPT──► Stale
//!       ▲                                                  │
//!       └────────────────── re-register ◄──────────────────┘
//! ```
//!
//! The SHA handle is content-derived: registering the same body twice is
//! idempotent on Redis and yields the same handle, so concurrent callers
//! observing staleness may all re-register without coordination — no
//! client-side mutex is needed.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use deadpool_redis::Connection;
use tracing::{debug, warn};

use crate::error::{RedisCacheError, Result, is_unknown_script};

/// Deletes every member of the given dependency sets, returning the
/// number of keys actually removed.
///
/// KEYS holds the reverse-index set names. The union of their members is
/// deduplicated so a key present in several sets is deleted and counted
/// once. Members whose key no longer exists contribute zero to the
/// count. Each set is deleted after draining, keeping the index
/// invariant: once invalidation returns, no set lists a key that is
/// gone. The named primary keys are the caller's second, non-atomic
/// step.
pub const KILL_BY_DEPENDENCY: &str = r"
local deleted = 0
local seen = {}
for _, set_key in ipairs(KEYS) do
    local members = redis.call('SMEMBERS', set_key)
    for _, member in ipairs(members) do
        if not seen[member] then
            seen[member] = true
            deleted = deleted + redis.call('DEL', member)
        end
    end
    redis.call('DEL', set_key)
end
return deleted
";

/// Cached registration state for the cascading-delete script.
///
/// One registry lives per pool lifetime. The handle starts out absent,
/// is populated on first registration, and is dropped (then lazily
/// re-created) whenever an invocation reports it unknown.
#[derive(Debug, Default)]
pub struct ScriptRegistry {
    kill_by_dependency: ArcSwapOption<String>,
}

impl ScriptRegistry {
    /// Creates a registry with no registered handle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently cached handle, if any.
    #[must_use]
    pub fn cached_sha(&self) -> Option<Arc<String>> {
        self.kill_by_dependency.load_full()
    }

    /// Loads the script on the backend and caches the returned handle.
    ///
    /// Safe to call redundantly from concurrent callers: `SCRIPT LOAD`
    /// is idempotent and every caller stores the same content-derived
    /// SHA.
    pub async fn register(&self, conn: &mut Connection) -> Result<Arc<String>> {
        let sha: String = redis::cmd("SCRIPT")
            .arg("LOAD")
            .arg(KILL_BY_DEPENDENCY)
            .query_async(conn)
            .await
            .map_err(|e| RedisCacheError::script_registration(e.to_string()))?;

        debug!(sha = %sha, "registered kill-by-dependency script");

        let sha = Arc::new(sha);
        self.kill_by_dependency.store(Some(Arc::clone(&sha)));
        Ok(sha)
    }

    /// Returns the cached handle, registering the script first if needed.
    pub async fn sha(&self, conn: &mut Connection) -> Result<Arc<String>> {
        match self.cached_sha() {
            Some(sha) => Ok(sha),
            None => self.register(conn).await,
        }
    }

    /// Drops the cached handle so the next use re-registers.
    pub fn invalidate(&self) {
        self.kill_by_dependency.store(None);
    }
}

/// Runs the cascading-delete script over the given dependency-set keys.
///
/// Invocation is by handle first; if the backend reports the handle
/// unknown (script cache flushed, backend restarted), the script is
/// re-registered and the invocation retried exactly once. A second
/// unknown-handle failure is surfaced as fatal.
pub async fn kill_by_dependency(
    registry: &ScriptRegistry,
    conn: &mut Connection,
    set_keys: &[String],
) -> Result<u64> {
    let sha = registry.sha(conn).await?;

    match eval_by_sha(conn, &sha, set_keys).await {
        Ok(deleted) => Ok(deleted),
        Err(err) if is_unknown_script(&err) => {
            warn!("kill-by-dependency script handle stale, re-registering");
            registry.invalidate();
            let sha = registry.register(conn).await?;

            match eval_by_sha(conn, &sha, set_keys).await {
                Ok(deleted) => Ok(deleted),
                Err(err) if is_unknown_script(&err) => Err(RedisCacheError::ScriptUnknown),
                Err(err) => Err(err.into()),
            }
        }
        Err(err) => Err(err.into()),
    }
}

async fn eval_by_sha(
    conn: &mut Connection,
    sha: &str,
    set_keys: &[String],
) -> std::result::Result<u64, redis::RedisError> {
    let mut cmd = redis::cmd("EVALSHA");
    cmd.arg(sha).arg(set_keys.len());
    for key in set_keys {
        cmd.arg(key);
    }
    cmd.query_async(conn).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_starts_unregistered() {
        let registry = ScriptRegistry::new();
        assert!(registry.cached_sha().is_none());
    }

    #[test]
    fn test_invalidate_clears_cached_handle() {
        let registry = ScriptRegistry::new();
        registry
            .kill_by_dependency
            .store(Some(Arc::new("abc123".to_owned())));
        assert_eq!(registry.cached_sha().as_deref().map(String::as_str), Some("abc123"));

        registry.invalidate();
        assert!(registry.cached_sha().is_none());
    }

    #[test]
    fn test_script_dedupes_union() {
        // The script must count each member once even when it appears in
        // several dependency sets.
        assert!(KILL_BY_DEPENDENCY.contains("seen[member] = true"));
        assert!(KILL_BY_DEPENDENCY.contains("SMEMBERS"));
        assert!(KILL_BY_DEPENDENCY.contains("DEL"));
    }
}
