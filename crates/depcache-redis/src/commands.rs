//! Typed command forwarders over a borrowed pool connection.
//!
//! Every function here is a one-command round trip that forwards its
//! arguments and translates the reply type. Dependency tracking and
//! invalidation semantics live in [`crate::cache`]; nothing in this
//! module carries invariants of its own.

use deadpool_redis::Connection;
use redis::AsyncCommands;

use crate::error::Result;

/// GET as text. `None` when the key does not exist.
pub async fn get(conn: &mut Connection, key: &str) -> Result<Option<String>> {
    Ok(conn.get::<_, Option<String>>(key).await?)
}

/// GET as raw bytes. `None` when the key does not exist.
pub async fn get_bytes(conn: &mut Connection, key: &str) -> Result<Option<Vec<u8>>> {
    Ok(conn.get::<_, Option<Vec<u8>>>(key).await?)
}

/// SET without expiry.
pub async fn set_value(conn: &mut Connection, key: &str, value: &[u8]) -> Result<()> {
    Ok(conn.set::<_, _, ()>(key, value).await?)
}

/// SETEX: SET with a TTL in seconds.
pub async fn set_value_ex(
    conn: &mut Connection,
    key: &str,
    value: &[u8],
    seconds: u64,
) -> Result<()> {
    Ok(conn.set_ex::<_, _, ()>(key, value, seconds).await?)
}

/// EXISTS.
pub async fn exists(conn: &mut Connection, key: &str) -> Result<bool> {
    Ok(conn.exists::<_, bool>(key).await?)
}

/// EXPIRE. Returns false when the key does not exist.
pub async fn expire(conn: &mut Connection, key: &str, seconds: i64) -> Result<bool> {
    Ok(conn.expire::<_, bool>(key, seconds).await?)
}

/// DEL over one or more keys. Returns the number of keys removed.
pub async fn delete_keys(conn: &mut Connection, keys: &[&str]) -> Result<u64> {
    Ok(conn.del::<_, u64>(keys).await?)
}

/// FLUSHALL. Removes every key; registered scripts survive.
pub async fn flush_all(conn: &mut Connection) -> Result<()> {
    Ok(redis::cmd("FLUSHALL").query_async::<()>(conn).await?)
}

/// SADD of a single member.
pub async fn set_add(conn: &mut Connection, set: &str, member: &[u8]) -> Result<()> {
    Ok(conn.sadd::<_, _, ()>(set, member).await?)
}

/// SADD of several members at once.
pub async fn set_add_many(conn: &mut Connection, set: &str, members: &[&str]) -> Result<()> {
    Ok(conn.sadd::<_, _, ()>(set, members).await?)
}

/// SREM.
pub async fn set_remove_member(conn: &mut Connection, set: &str, member: &[u8]) -> Result<()> {
    Ok(conn.srem::<_, _, ()>(set, member).await?)
}

/// SISMEMBER.
pub async fn set_is_member(conn: &mut Connection, set: &str, member: &[u8]) -> Result<bool> {
    Ok(conn.sismember::<_, _, bool>(set, member).await?)
}

/// HGET. `None` when the hash or field does not exist.
pub async fn hash_get(conn: &mut Connection, hash: &str, field: &str) -> Result<Option<String>> {
    Ok(conn.hget::<_, _, Option<String>>(hash, field).await?)
}

/// HSET of a single field.
pub async fn hash_set(conn: &mut Connection, hash: &str, field: &str, value: &[u8]) -> Result<()> {
    Ok(conn.hset::<_, _, _, ()>(hash, field, value).await?)
}

/// HMGET. One entry per requested field, `None` for missing fields.
pub async fn hash_map_get(
    conn: &mut Connection,
    hash: &str,
    fields: &[&str],
) -> Result<Vec<Option<String>>> {
    let mut cmd = redis::cmd("HMGET");
    cmd.arg(hash);
    for field in fields {
        cmd.arg(field);
    }
    Ok(cmd.query_async(conn).await?)
}

/// HSET of several field/value pairs at once.
pub async fn hash_map_set(
    conn: &mut Connection,
    hash: &str,
    pairs: &[(&str, &[u8])],
) -> Result<()> {
    Ok(conn.hset_multiple::<_, _, _, ()>(hash, pairs).await?)
}

/// RPUSH: appends values to a list.
pub async fn list_push(conn: &mut Connection, key: &str, values: &[&str]) -> Result<()> {
    Ok(conn.rpush::<_, _, ()>(key, values).await?)
}

/// LRANGE over the whole list.
pub async fn list_range(conn: &mut Connection, key: &str) -> Result<Vec<String>> {
    Ok(conn.lrange::<_, Vec<String>>(key, 0, -1).await?)
}

/// KEYS *. O(N) on the server; diagnostics only.
pub async fn all_keys(conn: &mut Connection) -> Result<Vec<String>> {
    Ok(conn.keys::<_, Vec<String>>("*").await?)
}

/// PING.
pub async fn ping(conn: &mut Connection) -> Result<()> {
    Ok(redis::cmd("PING").query_async::<()>(conn).await?)
}
