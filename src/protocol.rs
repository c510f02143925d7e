//! Transport protocol descriptors and the protocol registry.
//!
//! Protocol identity is an explicit, stable identifier registered once by
//! each protocol implementation. Canonicality (usenet/torrent, the two
//! transport kinds every installation ships with) is a descriptor flag,
//! never a name check.

use std::fmt;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

/// Stable identifier for a transport protocol capability.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProtocolId(String);

impl ProtocolId {
    /// Creates a protocol ID from its stable string form.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProtocolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProtocolId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ProtocolId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Descriptor for a registered transport protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolDescriptor {
    /// Stable protocol identifier.
    pub id: ProtocolId,

    /// Human-facing protocol name.
    pub display_name: String,

    /// True for the canonical transport kinds (usenet, torrent).
    pub is_canonical_transport: bool,
}

impl ProtocolDescriptor {
    /// Creates a descriptor for a non-canonical protocol.
    #[must_use]
    pub fn new(id: impl Into<ProtocolId>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            is_canonical_transport: false,
        }
    }

    /// Creates a descriptor for a canonical transport protocol.
    #[must_use]
    pub fn canonical(id: impl Into<ProtocolId>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            is_canonical_transport: true,
        }
    }
}

/// Registry of currently recognized transport protocols.
///
/// Membership may grow or shrink between calls; callers must treat each
/// snapshot as potentially different from the last.
pub trait ProtocolRegistry: Send + Sync {
    /// Returns a snapshot of all registered protocols, in registration order.
    fn protocols(&self) -> Vec<ProtocolDescriptor>;
}

/// Thread-safe in-memory protocol registry.
///
/// Supports runtime membership changes, which is what makes read-time
/// permission-list reconciliation observable.
#[derive(Debug, Default)]
pub struct InMemoryProtocolRegistry {
    descriptors: RwLock<Vec<ProtocolDescriptor>>,
}

impl InMemoryProtocolRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry pre-populated with the given descriptors.
    #[must_use]
    pub fn with_protocols(descriptors: impl IntoIterator<Item = ProtocolDescriptor>) -> Self {
        Self {
            descriptors: RwLock::new(descriptors.into_iter().collect()),
        }
    }

    /// Registers a protocol. A descriptor with the same id is replaced in place.
    pub fn register(&self, descriptor: ProtocolDescriptor) {
        let mut guard = self
            .descriptors
            .write()
            .expect("protocol registry lock poisoned");
        if let Some(existing) = guard.iter_mut().find(|d| d.id == descriptor.id) {
            *existing = descriptor;
        } else {
            guard.push(descriptor);
        }
    }

    /// Removes a protocol from the registry. Unknown ids are ignored.
    pub fn deregister(&self, id: &ProtocolId) {
        let mut guard = self
            .descriptors
            .write()
            .expect("protocol registry lock poisoned");
        guard.retain(|d| d.id != *id);
    }
}

impl ProtocolRegistry for InMemoryProtocolRegistry {
    fn protocols(&self) -> Vec<ProtocolDescriptor> {
        self.descriptors
            .read()
            .expect("protocol registry lock poisoned")
            .clone()
    }
}
