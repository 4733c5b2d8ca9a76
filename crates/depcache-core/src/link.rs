//! Outcome reporting for writes that also link dependencies.

use crate::error::{CacheError, CacheResult};

/// Result of the dependency-link step of a write operation.
///
/// A write with dependencies is two phases: the primary write, then one
/// transaction adding the key to each dependency's reverse-index set.
/// The phases are deliberately not coupled — if the link step fails the
/// primary write has already taken effect and is not rolled back. The
/// write's `Result` covers the primary write; this type carries the
/// link step's fate separately so callers can tell "write lost" from
/// "tracking lost".
///
/// A caller that ignores a `Failed` outcome keeps the written value but
/// loses dependency tracking for it, silently reducing future
/// invalidation coverage.
#[derive(Debug)]
pub enum LinkOutcome {
    /// Every dependency-set add committed.
    Linked {
        /// Number of dependency names linked.
        dependencies: usize,
    },

    /// The write carried no dependencies; no transaction was issued.
    NotRequested,

    /// The primary write landed but the link transaction failed.
    Failed(CacheError),
}

impl LinkOutcome {
    /// Whether dependency tracking is in place for this write.
    ///
    /// `NotRequested` counts as linked: there was nothing to track.
    #[must_use]
    pub fn is_linked(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }

    /// Collapses the outcome into a `Result` for callers that treat a
    /// lost link the same as a failed write.
    pub fn into_result(self) -> CacheResult<()> {
        match self {
            Self::Linked { .. } | Self::NotRequested => Ok(()),
            Self::Failed(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_linked() {
        assert!(LinkOutcome::Linked { dependencies: 2 }.is_linked());
        assert!(LinkOutcome::NotRequested.is_linked());
        assert!(!LinkOutcome::Failed(CacheError::backend("SADD failed")).is_linked());
    }

    #[test]
    fn test_into_result() {
        assert!(LinkOutcome::Linked { dependencies: 1 }.into_result().is_ok());
        assert!(LinkOutcome::NotRequested.into_result().is_ok());

        let err = LinkOutcome::Failed(CacheError::transaction_aborted("boom"))
            .into_result()
            .unwrap_err();
        assert!(matches!(err, CacheError::TransactionAborted { .. }));
    }
}
