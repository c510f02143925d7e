//! In-memory profile store.
//!
//! Thread-safe reference implementation of [`ProfileStore`], intended for
//! embedded usage and tests.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::profile::{DelayProfile, ProfileId};
use crate::storage::traits::{ProfileStore, StorageError};

fn lock_err(context: &'static str) -> StorageError {
    StorageError::BackendError(format!("poisoned lock: {context}"))
}

#[derive(Debug, Default)]
struct ProfileState {
    by_id: HashMap<ProfileId, DelayProfile>,
    // Insertion order; `all` must be deterministic for renumbering.
    inserted: Vec<ProfileId>,
}

/// Thread-safe in-memory profile store.
#[derive(Debug, Default)]
pub struct InMemoryProfileStore {
    state: RwLock<ProfileState>,
}

impl InMemoryProfileStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProfileStore for InMemoryProfileStore {
    fn get(&self, id: ProfileId) -> Result<Option<DelayProfile>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("profile.get"))?;
        Ok(state.by_id.get(&id).cloned())
    }

    fn all(&self) -> Result<Vec<DelayProfile>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("profile.all"))?;
        Ok(state
            .inserted
            .iter()
            .filter_map(|id| state.by_id.get(id).cloned())
            .collect())
    }

    fn count(&self) -> Result<usize, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("profile.count"))?;
        Ok(state.by_id.len())
    }

    fn insert(&self, mut profile: DelayProfile) -> Result<DelayProfile, StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("profile.insert"))?;

        if profile.id.is_nil() {
            profile.id = ProfileId::new();
        } else if state.by_id.contains_key(&profile.id) {
            return Err(StorageError::DuplicateKey(profile.id.to_string()));
        }

        state.inserted.push(profile.id);
        state.by_id.insert(profile.id, profile.clone());
        Ok(profile)
    }

    fn update(&self, profile: DelayProfile) -> Result<DelayProfile, StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("profile.update"))?;

        if !state.by_id.contains_key(&profile.id) {
            return Err(StorageError::ProfileNotFound(profile.id));
        }
        state.by_id.insert(profile.id, profile.clone());
        Ok(profile)
    }

    fn update_many(&self, profiles: Vec<DelayProfile>) -> Result<(), StorageError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| lock_err("profile.update_many"))?;

        // Verify the whole batch before applying any of it.
        for profile in &profiles {
            if !state.by_id.contains_key(&profile.id) {
                return Err(StorageError::ProfileNotFound(profile.id));
            }
        }
        for profile in profiles {
            state.by_id.insert(profile.id, profile);
        }
        Ok(())
    }

    fn delete(&self, id: ProfileId) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("profile.delete"))?;

        if state.by_id.remove(&id).is_none() {
            return Err(StorageError::ProfileNotFound(id));
        }
        state.inserted.retain(|existing| *existing != id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn profile() -> DelayProfile {
        DelayProfile::new(HashSet::new())
    }

    #[test]
    fn insert_assigns_an_id() {
        let store = InMemoryProfileStore::new();
        let persisted = store.insert(profile()).unwrap();
        assert!(!persisted.id.is_nil());
        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(store.get(persisted.id).unwrap().unwrap().id, persisted.id);
    }

    #[test]
    fn insert_rejects_duplicate_ids() {
        let store = InMemoryProfileStore::new();
        let persisted = store.insert(profile()).unwrap();

        let mut copy = profile();
        copy.id = persisted.id;
        let err = store.insert(copy).unwrap_err();
        assert!(matches!(err, StorageError::DuplicateKey(_)));
    }

    #[test]
    fn update_requires_existing_profile() {
        let store = InMemoryProfileStore::new();
        let mut unsaved = profile();
        unsaved.id = ProfileId::new();

        let err = store.update(unsaved).unwrap_err();
        assert!(matches!(err, StorageError::ProfileNotFound(_)));
    }

    #[test]
    fn update_many_is_all_or_nothing() {
        let store = InMemoryProfileStore::new();
        let mut first = store.insert(profile()).unwrap();
        first.enabled = false;

        let mut unknown = profile();
        unknown.id = ProfileId::new();

        let err = store.update_many(vec![first.clone(), unknown]).unwrap_err();
        assert!(matches!(err, StorageError::ProfileNotFound(_)));

        // The known profile must not have been touched.
        assert!(store.get(first.id).unwrap().unwrap().enabled);
    }

    #[test]
    fn delete_removes_and_errors_on_unknown() {
        let store = InMemoryProfileStore::new();
        let persisted = store.insert(profile()).unwrap();

        store.delete(persisted.id).unwrap();
        assert_eq!(store.count().unwrap(), 0);
        assert!(store.get(persisted.id).unwrap().is_none());

        let err = store.delete(persisted.id).unwrap_err();
        assert!(matches!(err, StorageError::ProfileNotFound(_)));
    }

    #[test]
    fn all_preserves_insertion_order() {
        let store = InMemoryProfileStore::new();
        let a = store.insert(profile()).unwrap();
        let b = store.insert(profile()).unwrap();
        let c = store.insert(profile()).unwrap();

        let ids: Vec<ProfileId> = store.all().unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![a.id, b.id, c.id]);
    }
}
