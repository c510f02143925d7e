//! Delay profile resolution service.
//!
//! The service composes the profile store and the protocol registry, keeps
//! the dense priority ordering intact across mutations, reconciles every
//! profile's permission list against the live registry at read time, and
//! serves tag-set resolutions through a time-bounded cache.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use crate::cache::ResolutionCache;
use crate::error::{ProfileError, ProfileResult};
use crate::profile::{DelayProfile, ProfileId, ProtocolPermission};
use crate::protocol::{ProtocolDescriptor, ProtocolRegistry};
use crate::storage::{ProfileStore, StorageError};
use crate::tag::{canonical_key, TagId};

fn sync_err(context: &'static str) -> ProfileError {
    ProfileError::Storage(StorageError::BackendError(format!(
        "poisoned lock: {context}"
    )))
}

/// Reconcile a profile's permission list against a registry snapshot.
///
/// Registry protocols without an entry are appended as disallowed with the
/// descriptor's display name; entries whose protocol left the registry are
/// dropped. Idempotent.
fn reconcile_items(profile: &mut DelayProfile, protocols: &[ProtocolDescriptor]) {
    for descriptor in protocols {
        if profile.permission_for(&descriptor.id).is_none() {
            profile
                .items
                .push(ProtocolPermission::from_descriptor(descriptor, false));
        }
    }
    profile
        .items
        .retain(|item| protocols.iter().any(|d| d.id == item.protocol));
}

/// Core orchestrator for delay profile CRUD, ordering, and resolution.
///
/// Mutations are serialized against each other and against cache fills by a
/// single coordination lock; see the field comment on `sync`.
pub struct DelayProfileService {
    store: Arc<dyn ProfileStore>,
    registry: Arc<dyn ProtocolRegistry>,
    cache: ResolutionCache,
    // Writers hold this exclusively across read-modify-persist-clear, so the
    // cache clear is visible before a mutation returns. Resolution holds the
    // read side across lookup-compute-fill, so a stale fill can never
    // interleave with a clear.
    sync: RwLock<()>,
}

impl DelayProfileService {
    /// Creates a service with the default 30-second resolution cache.
    #[must_use]
    pub fn new(store: Arc<dyn ProfileStore>, registry: Arc<dyn ProtocolRegistry>) -> Self {
        Self::with_cache(store, registry, ResolutionCache::new())
    }

    /// Creates a service with an explicitly configured cache.
    #[must_use]
    pub fn with_cache(
        store: Arc<dyn ProfileStore>,
        registry: Arc<dyn ProtocolRegistry>,
        cache: ResolutionCache,
    ) -> Self {
        Self {
            store,
            registry,
            cache,
            sync: RwLock::new(()),
        }
    }

    /// Ensures the reserved default profile exists, inserting it if missing.
    ///
    /// Idempotent; returns the persisted default either way. Run this once at
    /// system initialization so every tag-set request has a match.
    pub fn ensure_default_profile(&self) -> ProfileResult<DelayProfile> {
        let _guard = self.sync.write().map_err(|_| sync_err("service.write"))?;

        if let Some(existing) = self.store.all()?.into_iter().find(|p| p.is_default) {
            return Ok(existing);
        }

        let persisted = self.store.insert(DelayProfile::reserved_default())?;
        self.cache.clear();
        Ok(persisted)
    }

    /// Adds a profile, placing it last among non-default profiles.
    ///
    /// The assigned order is the current store count, which is the next free
    /// slot while the ordering invariant holds. Returns the persisted profile
    /// including its store-assigned id.
    pub fn add(&self, mut profile: DelayProfile) -> ProfileResult<DelayProfile> {
        let _guard = self.sync.write().map_err(|_| sync_err("service.write"))?;

        profile.order = u32::try_from(self.store.count()?).unwrap_or(u32::MAX);
        let persisted = self.store.insert(profile)?;
        self.cache.clear();
        Ok(persisted)
    }

    /// Replaces an existing profile in full.
    ///
    /// # Errors
    /// Returns [`ProfileError::NotFound`] when the id is unknown.
    pub fn update(&self, profile: DelayProfile) -> ProfileResult<DelayProfile> {
        let _guard = self.sync.write().map_err(|_| sync_err("service.write"))?;

        if self.store.get(profile.id)?.is_none() {
            return Err(ProfileError::NotFound { id: profile.id });
        }
        let persisted = self.store.update(profile)?;
        self.cache.clear();
        Ok(persisted)
    }

    /// Deletes a profile and renumbers the survivors densely from 1.
    ///
    /// The default profile keeps its fixed order and is never deleted.
    ///
    /// # Errors
    /// Returns [`ProfileError::DefaultImmutable`] for the default profile and
    /// [`ProfileError::NotFound`] for an unknown id.
    pub fn delete(&self, id: ProfileId) -> ProfileResult<()> {
        let _guard = self.sync.write().map_err(|_| sync_err("service.write"))?;

        let profile = self
            .store
            .get(id)?
            .ok_or(ProfileError::NotFound { id })?;
        if profile.is_default {
            return Err(ProfileError::DefaultImmutable);
        }

        self.store.delete(id)?;

        let mut survivors = self.store.all()?;
        survivors.sort_by_key(|p| p.order);

        let mut next = 1;
        for survivor in &mut survivors {
            if survivor.is_default {
                continue;
            }
            survivor.order = next;
            next += 1;
        }

        self.store.update_many(survivors)?;
        self.cache.clear();
        Ok(())
    }

    /// All profiles, reconciled against the live protocol registry.
    pub fn all(&self) -> ProfileResult<Vec<DelayProfile>> {
        let protocols = self.registry.protocols();
        let mut profiles = self.store.all()?;
        for profile in &mut profiles {
            reconcile_items(profile, &protocols);
        }
        Ok(profiles)
    }

    /// A single profile, reconciled against the live protocol registry.
    ///
    /// # Errors
    /// Returns [`ProfileError::NotFound`] when the id is unknown.
    pub fn get(&self, id: ProfileId) -> ProfileResult<DelayProfile> {
        let mut profile = self
            .store
            .get(id)?
            .ok_or(ProfileError::NotFound { id })?;
        reconcile_items(&mut profile, &self.registry.protocols());
        Ok(profile)
    }

    /// Synthesizes an unsaved template profile for creation previews.
    ///
    /// The template permits every registered non-canonical protocol; the
    /// canonical transport kinds are left to the caller. Never persisted.
    #[must_use]
    pub fn default_profile_template(&self) -> DelayProfile {
        let mut others: Vec<ProtocolDescriptor> = self
            .registry
            .protocols()
            .into_iter()
            .filter(|d| !d.is_canonical_transport)
            .collect();
        others.sort_by(|a, b| a.id.cmp(&b.id));

        let mut template = DelayProfile::new(HashSet::new());
        template.items = others
            .iter()
            .map(|d| ProtocolPermission::from_descriptor(d, true))
            .collect();
        template
    }

    /// All reconciled profiles whose tag set contains `tag`.
    pub fn all_for_tag(&self, tag: TagId) -> ProfileResult<Vec<DelayProfile>> {
        Ok(self
            .all()?
            .into_iter()
            .filter(|p| p.tags.contains(&tag))
            .collect())
    }

    /// All reconciled profiles applying to `tags`: tag intersection or global.
    pub fn all_for_tags(&self, tags: &HashSet<TagId>) -> ProfileResult<Vec<DelayProfile>> {
        Ok(self
            .all()?
            .into_iter()
            .filter(|p| p.matches_tags(tags))
            .collect())
    }

    /// Resolves the highest-priority profile for `tags`, cached for the TTL.
    ///
    /// # Errors
    /// Returns [`ProfileError::NoMatch`] when nothing applies, which cannot
    /// happen while the default profile's empty tag set is intact.
    pub fn best_for_tags(&self, tags: &HashSet<TagId>) -> ProfileResult<DelayProfile> {
        let _guard = self.sync.read().map_err(|_| sync_err("service.read"))?;

        let key = canonical_key(tags);
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit);
        }

        let best = self.fetch_best_for_tags(tags, &key)?;
        self.cache.insert(key, best.clone());
        Ok(best)
    }

    fn fetch_best_for_tags(&self, tags: &HashSet<TagId>, key: &str) -> ProfileResult<DelayProfile> {
        self.all_for_tags(tags)?
            .into_iter()
            .min_by_key(|p| p.order)
            .ok_or_else(|| ProfileError::NoMatch {
                key: key.to_string(),
            })
    }

    /// Repositions `moving_id` to immediately follow `after_id`.
    ///
    /// `None` (and an after id that no longer resolves) moves the profile to
    /// the front (highest priority). The default profile never moves: as the
    /// moving target the call is a no-op, and as the after target it stands
    /// for the end of the list. Returns the full reconciled list in the new
    /// order.
    ///
    /// # Errors
    /// Returns [`ProfileError::NotFound`] when `moving_id` is unknown.
    pub fn reorder(
        &self,
        moving_id: ProfileId,
        after_id: Option<ProfileId>,
    ) -> ProfileResult<Vec<DelayProfile>> {
        let _guard = self.sync.write().map_err(|_| sync_err("service.write"))?;

        let mut all = self.store.all()?;
        all.sort_by_key(|p| p.order);

        let moving = all
            .iter()
            .find(|p| p.id == moving_id)
            .cloned()
            .ok_or(ProfileError::NotFound { id: moving_id })?;
        if moving.is_default {
            return self.reordered_list();
        }

        let mut after = after_id.and_then(|id| all.iter().find(|p| p.id == id).cloned());
        if after.as_ref().is_some_and(|a| a.id == moving_id) {
            // A profile cannot follow itself; the position is already held.
            return self.reordered_list();
        }
        if after.as_ref().is_some_and(|a| a.is_default) {
            // "Immediately after the default" can only mean the end of the
            // list; the default itself sits past every orderable slot.
            after = all
                .iter()
                .rev()
                .find(|p| !p.is_default && p.id != moving_id)
                .cloned();
        }

        let after_order = match &after {
            None => 0,
            Some(a) if moving.order < a.order => a.order - 1,
            Some(a) => a.order,
        };

        let moving_order = moving.order;
        let mut shifted = after_order + 2;
        for profile in &mut all {
            if profile.is_default {
                continue;
            }

            if profile.id == moving_id {
                profile.order = after_order + 1;
            } else if after.as_ref().is_some_and(|a| a.id == profile.id) {
                profile.order = after_order;
            } else if profile.order > after_order {
                profile.order = shifted;
                shifted += 1;
            } else if profile.order > moving_order {
                profile.order -= 1;
            }
        }

        self.store.update_many(all)?;
        self.cache.clear();
        self.reordered_list()
    }

    fn reordered_list(&self) -> ProfileResult<Vec<DelayProfile>> {
        let mut profiles = self.all()?;
        profiles.sort_by_key(|p| p.order);
        Ok(profiles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{InMemoryProtocolRegistry, ProtocolId};
    use crate::storage::InMemoryProfileStore;

    fn registry() -> Arc<InMemoryProtocolRegistry> {
        Arc::new(InMemoryProtocolRegistry::with_protocols([
            ProtocolDescriptor::canonical("usenet", "Usenet"),
            ProtocolDescriptor::canonical("torrent", "Torrent"),
        ]))
    }

    fn service(registry: &Arc<InMemoryProtocolRegistry>) -> DelayProfileService {
        DelayProfileService::new(Arc::new(InMemoryProfileStore::new()), registry.clone())
    }

    #[test]
    fn reconcile_appends_missing_as_disallowed() {
        let protocols = vec![
            ProtocolDescriptor::canonical("usenet", "Usenet"),
            ProtocolDescriptor::new("direct_download", "Direct Download"),
        ];
        let mut profile = DelayProfile::new(HashSet::new());

        reconcile_items(&mut profile, &protocols);

        assert_eq!(profile.items.len(), 2);
        assert!(profile.items.iter().all(|item| !item.allowed));
        let dd = profile
            .permission_for(&ProtocolId::new("direct_download"))
            .unwrap();
        assert_eq!(dd.display_name, "Direct Download");
    }

    #[test]
    fn reconcile_drops_departed_protocols() {
        let mut profile = DelayProfile::new(HashSet::new());
        profile.items.push(ProtocolPermission {
            protocol: ProtocolId::new("defunct"),
            display_name: "Defunct".to_string(),
            allowed: true,
        });

        let protocols = vec![ProtocolDescriptor::canonical("usenet", "Usenet")];
        reconcile_items(&mut profile, &protocols);

        assert_eq!(profile.items.len(), 1);
        assert_eq!(profile.items[0].protocol.as_str(), "usenet");
    }

    #[test]
    fn reconcile_is_idempotent() {
        let protocols = vec![
            ProtocolDescriptor::canonical("usenet", "Usenet"),
            ProtocolDescriptor::canonical("torrent", "Torrent"),
        ];
        let mut profile = DelayProfile::new(HashSet::new());

        reconcile_items(&mut profile, &protocols);
        let once = profile.items.clone();
        reconcile_items(&mut profile, &protocols);

        assert_eq!(profile.items, once);
    }

    #[test]
    fn template_covers_only_non_canonical_protocols() {
        let registry = registry();
        registry.register(ProtocolDescriptor::new("direct_download", "Direct Download"));
        registry.register(ProtocolDescriptor::new("blackhole", "Blackhole"));
        let service = service(&registry);

        let template = service.default_profile_template();

        assert!(template.id.is_nil());
        assert!(!template.is_default);
        let ids: Vec<&str> = template
            .items
            .iter()
            .map(|item| item.protocol.as_str())
            .collect();
        assert_eq!(ids, ["blackhole", "direct_download"]);
        assert!(template.items.iter().all(|item| item.allowed));
    }

    #[test]
    fn ensure_default_profile_is_idempotent() {
        let registry = registry();
        let service = service(&registry);

        let first = service.ensure_default_profile().unwrap();
        let second = service.ensure_default_profile().unwrap();

        assert_eq!(first.id, second.id);
        assert!(first.is_default);
        assert_eq!(
            service.all().unwrap().iter().filter(|p| p.is_default).count(),
            1
        );
    }
}
