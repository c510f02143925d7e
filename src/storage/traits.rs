//! Abstract storage trait for delay profiles.
//!
//! The store is a collaborator: the resolution core never owns persistence
//! mechanics. Using a trait enables:
//! - In-memory backends for testing and embedded use
//! - Persistent backends for production

use thiserror::Error;

use crate::profile::{DelayProfile, ProfileId};

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Profile not found.
    #[error("Profile not found: {0}")]
    ProfileNotFound(ProfileId),

    /// Key already exists.
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// Backend error.
    #[error("Storage backend error: {0}")]
    BackendError(String),
}

/// Durable collection of delay profile records.
///
/// # Atomicity
/// `update_many` must commit all given profiles or none; the ordering
/// invariants maintained by the service depend on batch renumbering never
/// landing partially.
pub trait ProfileStore: Send + Sync {
    /// Get a profile by ID.
    fn get(&self, id: ProfileId) -> Result<Option<DelayProfile>, StorageError>;

    /// All stored profiles, in insertion order.
    fn all(&self) -> Result<Vec<DelayProfile>, StorageError>;

    /// Number of stored profiles.
    fn count(&self) -> Result<usize, StorageError>;

    /// Insert a new profile, assigning its id when nil.
    ///
    /// Returns the persisted profile including the assigned id. Returns an
    /// error if a non-nil id already exists.
    fn insert(&self, profile: DelayProfile) -> Result<DelayProfile, StorageError>;

    /// Replace an existing profile. Returns an error if not found.
    fn update(&self, profile: DelayProfile) -> Result<DelayProfile, StorageError>;

    /// Replace a batch of existing profiles atomically.
    ///
    /// Either every profile is committed or none; an unknown id fails the
    /// whole batch.
    fn update_many(&self, profiles: Vec<DelayProfile>) -> Result<(), StorageError>;

    /// Delete a profile by ID. Returns an error if not found.
    fn delete(&self, id: ProfileId) -> Result<(), StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time test: ensure the trait is object-safe
    fn _assert_profile_store_object_safe(_: &dyn ProfileStore) {}

    #[test]
    fn storage_error_display() {
        let err = StorageError::ProfileNotFound(ProfileId::new());
        assert!(err.to_string().contains("Profile not found"));

        let err = StorageError::BackendError("connection refused".to_string());
        assert!(err.to_string().contains("connection refused"));
    }
}
