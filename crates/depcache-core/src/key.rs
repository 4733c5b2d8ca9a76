//! Naming convention for dependency reverse-index sets.

/// Prefix applied to a dependency name to form its reverse-index set key.
///
/// Callers must not use this prefix for their own primary keys, or those
/// keys will collide with the index namespace.
pub const DEPENDENCY_PREFIX: &str = "depend:";

/// Returns the backend key of the reverse-index set for a dependency name.
#[must_use]
pub fn dependency_set_key(name: &str) -> String {
    format!("{DEPENDENCY_PREFIX}{name}")
}

/// Whether a key lives in the dependency-index namespace.
///
/// Useful as a guard when callers generate primary keys from untrusted
/// input and want to reject collisions with the index.
#[must_use]
pub fn is_dependency_key(key: &str) -> bool {
    key.starts_with(DEPENDENCY_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependency_set_key() {
        assert_eq!(dependency_set_key("org:7"), "depend:org:7");
        assert_eq!(dependency_set_key(""), "depend:");
    }

    #[test]
    fn test_is_dependency_key() {
        assert!(is_dependency_key("depend:org:7"));
        assert!(is_dependency_key(dependency_set_key("user:42").as_str()));
        assert!(!is_dependency_key("user:42"));
        assert!(!is_dependency_key("dependx"));
    }
}
