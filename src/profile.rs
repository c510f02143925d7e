//! Delay profile records.
//!
//! A delay profile is a priority-ordered policy record: it scopes itself to a
//! set of tags and carries one permission entry per known transport protocol.
//! Exactly one profile is the reserved default; it matches every request and
//! always loses on priority.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::protocol::{ProtocolDescriptor, ProtocolId};
use crate::tag::TagId;

/// Order sentinel for the reserved default profile.
///
/// Lower order wins in resolution, so the default sorts behind every
/// user-created profile and is never touched by renumbering.
pub const DEFAULT_PROFILE_ORDER: u32 = u32::MAX;

/// Stable delay profile identifier, assigned by the store at insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(Uuid);

impl ProfileId {
    /// Creates a new random profile ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a profile ID from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Creates a nil profile ID, used for profiles not yet persisted.
    #[must_use]
    pub const fn nil() -> Self {
        Self(Uuid::nil())
    }

    /// Returns true if this is the nil (unsaved) ID.
    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for ProfileId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for ProfileId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Per-protocol permission entry on a delay profile.
///
/// A profile holds at most one entry per protocol id, in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolPermission {
    /// Protocol this entry governs.
    pub protocol: ProtocolId,

    /// Human-facing protocol name, stamped from the registry descriptor.
    pub display_name: String,

    /// Whether grabs may use this protocol under the profile.
    pub allowed: bool,
}

impl ProtocolPermission {
    /// Creates a permission entry for a registry descriptor.
    #[must_use]
    pub fn from_descriptor(descriptor: &ProtocolDescriptor, allowed: bool) -> Self {
        Self {
            protocol: descriptor.id.clone(),
            display_name: descriptor.display_name.clone(),
            allowed,
        }
    }
}

/// A priority-ordered delay policy scoped to a set of tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayProfile {
    /// Stable identifier; nil until the store assigns one.
    pub id: ProfileId,

    /// True only for the reserved default profile.
    pub is_default: bool,

    /// Priority rank; lower wins. Dense over non-default profiles.
    pub order: u32,

    /// Tags this profile applies to. Empty means it matches every request.
    pub tags: HashSet<TagId>,

    /// Informational flag, carried through unchanged by resolution.
    pub enabled: bool,

    /// Per-protocol permissions, insertion-ordered, one entry per protocol.
    pub items: Vec<ProtocolPermission>,
}

impl DelayProfile {
    /// Creates an unsaved profile scoped to the given tags.
    ///
    /// The store assigns the id at insert; the service assigns the order.
    #[must_use]
    pub fn new(tags: HashSet<TagId>) -> Self {
        Self {
            id: ProfileId::nil(),
            is_default: false,
            order: 0,
            tags,
            enabled: true,
            items: Vec::new(),
        }
    }

    /// Creates the reserved default profile record.
    ///
    /// Empty tag set (matches everything) and the fixed lowest-priority
    /// order sentinel.
    #[must_use]
    pub fn reserved_default() -> Self {
        Self {
            id: ProfileId::nil(),
            is_default: true,
            order: DEFAULT_PROFILE_ORDER,
            tags: HashSet::new(),
            enabled: true,
            items: Vec::new(),
        }
    }

    /// True when the profile applies to every request (empty tag set).
    #[must_use]
    pub fn is_global(&self) -> bool {
        self.tags.is_empty()
    }

    /// True when the profile applies to a request carrying `tags`.
    ///
    /// A profile matches when its tag set intersects the request's, or when
    /// it is global.
    #[must_use]
    pub fn matches_tags(&self, tags: &HashSet<TagId>) -> bool {
        self.is_global() || self.tags.iter().any(|t| tags.contains(t))
    }

    /// Looks up the permission entry for a protocol, if present.
    #[must_use]
    pub fn permission_for(&self, protocol: &ProtocolId) -> Option<&ProtocolPermission> {
        self.items.iter().find(|item| item.protocol == *protocol)
    }

    /// True when the profile permits grabs over `protocol`.
    ///
    /// Protocols without an entry are not permitted.
    #[must_use]
    pub fn allows(&self, protocol: &ProtocolId) -> bool {
        self.permission_for(protocol).is_some_and(|item| item.allowed)
    }
}
