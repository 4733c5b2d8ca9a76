//! The Redis-backed dependency-aware cache client.
//!
//! ## Dependency tracking
//!
//! Every value-writing operation accepts a list of dependency names.
//! After the primary write, the key is added to each name's
//! reverse-index set (`"depend:" + name`) in one MULTI/EXEC
//! transaction. [`Cache::invalidate`] later deletes every key recorded
//! under the given names in a single atomic server-side script
//! invocation, plus the named keys themselves.
//!
//! ## Write/link coupling
//!
//! The primary write and the link transaction are two phases with no
//! rollback between them: when the link fails the value stays written
//! and the operation reports [`LinkOutcome::Failed`]. Callers that
//! ignore the outcome keep the write but lose invalidation coverage for
//! it — see [`LinkOutcome`].

use std::sync::Arc;
use std::time::Duration;

use deadpool_redis::{Connection, Pool};
use depcache_core::{CacheError, CacheResult, CacheValue, LinkOutcome, dependency_set_key};
use tracing::{debug, info, warn};

use crate::commands;
use crate::config::CacheConfig;
use crate::error::RedisCacheError;
use crate::pool;
use crate::script::{self, ScriptRegistry};

/// A handle to a pooled Redis cache with dependency-aware invalidation.
///
/// Cheap to clone; clones share the same pool and script registry.
/// Construct one per logical backend and pass it to every caller — there
/// is no process-wide singleton, so independent pools (for example one
/// per test) can coexist in one process.
#[derive(Clone)]
pub struct Cache {
    pool: Pool,
    scripts: Arc<ScriptRegistry>,
}

impl Cache {
    /// Connects to Redis: builds the pool, verifies connectivity, and
    /// eagerly registers the cascading-delete script.
    ///
    /// A script-registration failure here is downgraded to lazy
    /// registration on first use, so a read-only or restricted backend
    /// can still serve the passthrough operations.
    pub async fn connect(config: CacheConfig) -> CacheResult<Self> {
        let pool = pool::create_pool(&config).map_err(CacheError::from)?;
        let cache = Self::with_pool(pool);

        let mut conn = cache.connection().await?;
        commands::ping(&mut conn).await?;

        if let Err(err) = cache.scripts.register(&mut conn).await {
            warn!(error = %err, "eager script registration failed, will retry on first use");
        }

        info!(url = %pool::mask_password(&config.url), "connected to Redis cache");
        Ok(cache)
    }

    /// Wraps an existing pool.
    ///
    /// The script registers itself lazily on the first invalidation.
    #[must_use]
    pub fn with_pool(pool: Pool) -> Self {
        Self {
            pool,
            scripts: Arc::new(ScriptRegistry::new()),
        }
    }

    /// The underlying connection pool.
    #[must_use]
    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    /// Closes the pool: idle connections are dropped and further
    /// borrows fail with [`CacheError::ConnectionUnavailable`].
    ///
    /// The cached script handle is simply discarded; scripts need no
    /// explicit unregistration on the backend.
    pub fn close(&self) {
        self.pool.close();
        debug!("Redis cache pool closed");
    }

    async fn connection(&self) -> CacheResult<Connection> {
        self.pool
            .get()
            .await
            .map_err(|e| CacheError::from(RedisCacheError::from(e)))
    }

    // --- Read operations -------------------------------------------------

    /// Gets a key as text.
    pub async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.connection().await?;
        Ok(commands::get(&mut conn, key).await?)
    }

    /// Gets a key as raw bytes.
    pub async fn get_bytes(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let mut conn = self.connection().await?;
        Ok(commands::get_bytes(&mut conn, key).await?)
    }

    /// Checks whether a key exists.
    pub async fn exists(&self, key: &str) -> CacheResult<bool> {
        let mut conn = self.connection().await?;
        Ok(commands::exists(&mut conn, key).await?)
    }

    /// Gets a hash field as text.
    pub async fn hash_get(&self, hash: &str, field: &str) -> CacheResult<Option<String>> {
        let mut conn = self.connection().await?;
        Ok(commands::hash_get(&mut conn, hash, field).await?)
    }

    /// Gets several hash fields at once, `None` per missing field.
    pub async fn hash_map_get(
        &self,
        hash: &str,
        fields: &[&str],
    ) -> CacheResult<Vec<Option<String>>> {
        if fields.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.connection().await?;
        Ok(commands::hash_map_get(&mut conn, hash, fields).await?)
    }

    /// Checks set membership.
    pub async fn set_is_member(
        &self,
        set: &str,
        member: impl Into<CacheValue>,
    ) -> CacheResult<bool> {
        let member = member.into();
        let mut conn = self.connection().await?;
        Ok(commands::set_is_member(&mut conn, set, member.as_bytes()).await?)
    }

    /// Returns the whole list stored at `key`.
    pub async fn list_range(&self, key: &str) -> CacheResult<Vec<String>> {
        let mut conn = self.connection().await?;
        Ok(commands::list_range(&mut conn, key).await?)
    }

    /// Every key on the backend. O(N) on the server; diagnostics only.
    pub async fn keys(&self) -> CacheResult<Vec<String>> {
        let mut conn = self.connection().await?;
        Ok(commands::all_keys(&mut conn).await?)
    }

    /// Health probe (PING).
    pub async fn ping(&self) -> CacheResult<()> {
        let mut conn = self.connection().await?;
        Ok(commands::ping(&mut conn).await?)
    }

    // --- Write operations with dependency linking ------------------------

    /// Sets a key and links it to each dependency name.
    pub async fn set(
        &self,
        key: &str,
        value: impl Into<CacheValue>,
        dependencies: &[&str],
    ) -> CacheResult<LinkOutcome> {
        let value = value.into();
        let mut conn = self.connection().await?;
        commands::set_value(&mut conn, key, value.as_bytes()).await?;
        Ok(link(&mut conn, key, dependencies).await)
    }

    /// Sets a key with a TTL (whole seconds) and links its dependencies.
    pub async fn set_with_ttl(
        &self,
        key: &str,
        value: impl Into<CacheValue>,
        ttl: Duration,
        dependencies: &[&str],
    ) -> CacheResult<LinkOutcome> {
        let value = value.into();
        let mut conn = self.connection().await?;
        commands::set_value_ex(&mut conn, key, value.as_bytes(), ttl.as_secs()).await?;
        Ok(link(&mut conn, key, dependencies).await)
    }

    /// Sets a hash field and links the hash to each dependency name.
    ///
    /// The link is recorded for the hash as a whole, not the field:
    /// invalidating a dependency deletes the entire hash.
    pub async fn hash_set(
        &self,
        hash: &str,
        field: &str,
        value: impl Into<CacheValue>,
        dependencies: &[&str],
    ) -> CacheResult<LinkOutcome> {
        let value = value.into();
        let mut conn = self.connection().await?;
        commands::hash_set(&mut conn, hash, field, value.as_bytes()).await?;
        Ok(link(&mut conn, hash, dependencies).await)
    }

    /// Sets several hash fields and links the hash to each dependency.
    pub async fn hash_map_set(
        &self,
        hash: &str,
        pairs: &[(&str, CacheValue)],
        dependencies: &[&str],
    ) -> CacheResult<LinkOutcome> {
        let mut conn = self.connection().await?;
        if !pairs.is_empty() {
            let raw: Vec<(&str, &[u8])> =
                pairs.iter().map(|(f, v)| (*f, v.as_bytes())).collect();
            commands::hash_map_set(&mut conn, hash, &raw).await?;
        }
        Ok(link(&mut conn, hash, dependencies).await)
    }

    /// Sets several hash fields, applies a TTL to the hash, and links
    /// the hash to each dependency.
    pub async fn hash_map_set_with_ttl(
        &self,
        hash: &str,
        pairs: &[(&str, CacheValue)],
        ttl: Duration,
        dependencies: &[&str],
    ) -> CacheResult<LinkOutcome> {
        let mut conn = self.connection().await?;
        if !pairs.is_empty() {
            let raw: Vec<(&str, &[u8])> =
                pairs.iter().map(|(f, v)| (*f, v.as_bytes())).collect();
            commands::hash_map_set(&mut conn, hash, &raw).await?;
        }
        commands::expire(&mut conn, hash, ttl.as_secs() as i64).await?;
        Ok(link(&mut conn, hash, dependencies).await)
    }

    /// Adds a member to a set and links the set to each dependency name.
    pub async fn set_add(
        &self,
        set: &str,
        member: impl Into<CacheValue>,
        dependencies: &[&str],
    ) -> CacheResult<LinkOutcome> {
        let member = member.into();
        let mut conn = self.connection().await?;
        commands::set_add(&mut conn, set, member.as_bytes()).await?;
        Ok(link(&mut conn, set, dependencies).await)
    }

    /// Adds several members to an existing set. No dependency linking.
    pub async fn set_add_many(&self, set: &str, members: &[&str]) -> CacheResult<()> {
        if members.is_empty() {
            return Ok(());
        }
        let mut conn = self.connection().await?;
        Ok(commands::set_add_many(&mut conn, set, members).await?)
    }

    /// Removes a member from a set.
    ///
    /// Also the manual way to unlink a key from one dependency: remove
    /// it from the `depend:`-prefixed set.
    pub async fn set_remove_member(
        &self,
        set: &str,
        member: impl Into<CacheValue>,
    ) -> CacheResult<()> {
        let member = member.into();
        let mut conn = self.connection().await?;
        Ok(commands::set_remove_member(&mut conn, set, member.as_bytes()).await?)
    }

    /// Appends values to the list stored at `key`.
    pub async fn list_push(&self, key: &str, values: &[&str]) -> CacheResult<()> {
        if values.is_empty() {
            return Ok(());
        }
        let mut conn = self.connection().await?;
        Ok(commands::list_push(&mut conn, key, values).await?)
    }

    /// Sets the expiration for an existing key.
    pub async fn expire(&self, key: &str, ttl: Duration) -> CacheResult<bool> {
        let mut conn = self.connection().await?;
        Ok(commands::expire(&mut conn, key, ttl.as_secs() as i64).await?)
    }

    // --- Invalidation -----------------------------------------------------

    /// Cascading invalidation: deletes every key that declared a
    /// dependency on any of `keys`, then the named keys themselves.
    ///
    /// Returns the number of dependent keys deleted; the named keys are
    /// not counted. The dependent lookup-and-delete runs as one atomic
    /// script invocation, so no concurrent reader observes a dependent
    /// alive after this returns, and no dependent linked mid-flight is
    /// silently lost. The follow-up deletion of the named keys is a
    /// separate command and is independently fallible: if it errors,
    /// the already-deleted dependents stay deleted.
    ///
    /// Duplicate names are processed once; unknown names contribute
    /// zero; deleting absent keys is not an error. An empty `keys`
    /// returns `Ok(0)` without touching the backend.
    pub async fn invalidate(&self, keys: &[&str]) -> CacheResult<u64> {
        if keys.is_empty() {
            return Ok(0);
        }

        let mut named: Vec<&str> = Vec::with_capacity(keys.len());
        for &key in keys {
            if !named.contains(&key) {
                named.push(key);
            }
        }
        let set_keys: Vec<String> = named.iter().map(|k| dependency_set_key(k)).collect();

        let mut conn = self.connection().await?;
        let deleted = script::kill_by_dependency(&self.scripts, &mut conn, &set_keys).await?;

        commands::delete_keys(&mut conn, &named).await?;

        debug!(keys = ?named, deleted, "cascading invalidation complete");

        Ok(deleted)
    }

    /// Alias for [`Cache::invalidate`].
    pub async fn delete(&self, keys: &[&str]) -> CacheResult<u64> {
        self.invalidate(keys).await
    }

    /// Deletes keys without consulting the dependency index.
    ///
    /// Returns the number of keys that existed. Dependency sets naming
    /// these keys are left as-is, so a later invalidation of those
    /// dependencies sees (and skips) the already-gone keys.
    pub async fn delete_without_dependencies(&self, keys: &[&str]) -> CacheResult<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.connection().await?;
        Ok(commands::delete_keys(&mut conn, keys).await?)
    }

    /// Flushes the entire backend. Removes keys only, not registered
    /// scripts.
    pub async fn flush(&self) -> CacheResult<()> {
        let mut conn = self.connection().await?;
        Ok(commands::flush_all(&mut conn).await?)
    }
}

/// Runs the dependency-link step after a primary write on the same
/// borrowed connection and folds its result into a [`LinkOutcome`].
async fn link(conn: &mut Connection, key: &str, dependencies: &[&str]) -> LinkOutcome {
    if dependencies.is_empty() {
        return LinkOutcome::NotRequested;
    }

    match link_dependencies(conn, key, dependencies).await {
        Ok(()) => LinkOutcome::Linked {
            dependencies: dependencies.len(),
        },
        Err(err) => {
            warn!(key = %key, error = %err, "dependency link failed after write");
            LinkOutcome::Failed(err.into())
        }
    }
}

/// Adds `key` to each dependency's reverse-index set in one MULTI/EXEC
/// transaction: all adds commit or none are visible to readers. The
/// first failing command aborts the batch and is surfaced; set-adds are
/// idempotent, so re-linking an already linked key is a no-op.
async fn link_dependencies(
    conn: &mut Connection,
    key: &str,
    dependencies: &[&str],
) -> Result<(), RedisCacheError> {
    if dependencies.is_empty() {
        return Ok(());
    }

    let mut pipe = redis::pipe();
    pipe.atomic();
    for dependency in dependencies {
        pipe.sadd(dependency_set_key(dependency), key).ignore();
    }

    pipe.query_async::<()>(conn)
        .await
        .map_err(|e| RedisCacheError::transaction(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A pool pointing at a closed port: construction succeeds (lazy),
    /// any borrow fails.
    fn unreachable_cache() -> Cache {
        let config = CacheConfig::new("redis://127.0.0.1:1").with_wait_timeout_ms(Some(100));
        let pool = pool::create_pool(&config).expect("lazy pool");
        Cache::with_pool(pool)
    }

    #[tokio::test]
    async fn test_invalidate_empty_performs_no_backend_calls() {
        // Nothing listens on the pool's address, so any round trip
        // would error; an empty invalidation must still succeed.
        let cache = unreachable_cache();
        assert_eq!(cache.invalidate(&[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_without_dependencies_empty_is_noop() {
        let cache = unreachable_cache();
        assert_eq!(cache.delete_without_dependencies(&[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_hash_map_get_empty_fields_is_noop() {
        let cache = unreachable_cache();
        assert!(cache.hash_map_get("h", &[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_borrow_after_close_is_connection_unavailable() {
        let cache = unreachable_cache();
        cache.close();

        let err = cache.get("any").await.unwrap_err();
        assert!(matches!(err, CacheError::ConnectionUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_backend_surfaces_connection_error() {
        let cache = unreachable_cache();
        let err = cache.ping().await.unwrap_err();
        assert!(matches!(err, CacheError::ConnectionUnavailable { .. }));
    }
}
