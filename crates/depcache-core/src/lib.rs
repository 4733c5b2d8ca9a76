//! # depcache-core
//!
//! Backend-agnostic types for the depcache dependency-aware cache.
//!
//! This crate defines the public surface shared by all cache backends:
//! the error type, the closed set of storable value types, the naming
//! convention for dependency reverse-index sets, and the outcome type
//! reported by writes that also link dependencies. It does not talk to
//! any backend itself — implementations live in separate crates
//! (currently `depcache-redis`).
//!
//! ## Dependency model
//!
//! A *dependency name* is an opaque, caller-chosen tag. Linking a stored
//! key to one or more dependency names records the key in each name's
//! backend-resident reverse-index set (`"depend:" + name`). Invalidating
//! a name later deletes every key recorded in its set, plus the name's
//! own key, in one cascading operation.

mod error;
mod key;
mod link;
mod value;

pub use error::{CacheError, CacheResult, ErrorCategory};
pub use key::{DEPENDENCY_PREFIX, dependency_set_key, is_dependency_key};
pub use link::LinkOutcome;
pub use value::CacheValue;
