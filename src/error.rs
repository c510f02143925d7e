//! Error types for delaygate.
//!
//! All failures are strongly typed with thiserror so callers can pattern
//! match on specific conditions instead of string-probing messages.

use thiserror::Error;

use crate::profile::ProfileId;
use crate::storage::StorageError;

/// Top-level error type for delay profile operations.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// The referenced profile id does not exist.
    #[error("Delay profile not found: {id}")]
    NotFound {
        /// The id that failed to resolve.
        id: ProfileId,
    },

    /// The operation would remove the reserved default profile.
    #[error("The default delay profile cannot be deleted")]
    DefaultImmutable,

    /// No profile, including the default, matched the requested tag set.
    ///
    /// Structurally impossible while the default profile's empty tag set is
    /// intact, but handled as a typed failure rather than a panic.
    #[error("No delay profile matches tag set '{key}'")]
    NoMatch {
        /// Canonical key of the tag set that failed to resolve.
        key: String,
    },

    /// A store operation failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ProfileError {
    /// Returns true if this is a missing-profile error.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true if this is a default-profile immutability violation.
    #[must_use]
    pub const fn is_default_immutable(&self) -> bool {
        matches!(self, Self::DefaultImmutable)
    }

    /// Returns true if this is a failed tag-set resolution.
    #[must_use]
    pub const fn is_no_match(&self) -> bool {
        matches!(self, Self::NoMatch { .. })
    }
}

/// Result type alias for delay profile operations.
pub type ProfileResult<T> = Result<T, ProfileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_carries_the_id() {
        let id = ProfileId::new();
        let err = ProfileError::NotFound { id };
        assert!(err.is_not_found());
        assert!(err.to_string().contains(&id.to_string()));
    }

    #[test]
    fn default_immutable_display() {
        let err = ProfileError::DefaultImmutable;
        assert!(err.is_default_immutable());
        assert!(err.to_string().contains("cannot be deleted"));
    }

    #[test]
    fn no_match_carries_the_key() {
        let err = ProfileError::NoMatch {
            key: "1,5,9".to_string(),
        };
        assert!(err.is_no_match());
        assert!(err.to_string().contains("1,5,9"));
    }

    #[test]
    fn storage_errors_convert() {
        let err: ProfileError = StorageError::BackendError("lock poisoned".to_string()).into();
        assert!(matches!(err, ProfileError::Storage(_)));
        assert!(err.to_string().contains("lock poisoned"));
    }
}
