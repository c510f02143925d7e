//! # delaygate - priority-ordered delay profile resolution
//!
//! delaygate resolves, for an arbitrary set of classification tags, the
//! single highest-priority delay profile governing how incoming release
//! grabs are delayed and which transport protocols they may use.
//!
//! ## Core Concepts
//!
//! - **Delay profile**: a priority-ordered policy record scoped to a tag set
//! - **Default profile**: the reserved, non-deletable, non-reorderable
//!   profile with an empty tag set, guaranteeing every request a match
//! - **Protocol registry**: the live set of recognized transport protocols;
//!   permission lists are reconciled against it at read time
//! - **Resolution cache**: a short-TTL memo from tag set to best profile,
//!   wiped wholesale on every mutation
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use delaygate::{
//!     DelayProfileService, InMemoryProfileStore, InMemoryProtocolRegistry,
//!     ProtocolDescriptor,
//! };
//!
//! let registry = Arc::new(InMemoryProtocolRegistry::with_protocols([
//!     ProtocolDescriptor::canonical("usenet", "Usenet"),
//!     ProtocolDescriptor::canonical("torrent", "Torrent"),
//! ]));
//! let service = DelayProfileService::new(Arc::new(InMemoryProfileStore::new()), registry);
//! service.ensure_default_profile()?;
//!
//! let best = service.best_for_tags(&[5.into()].into_iter().collect())?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod error;
pub mod profile;
pub mod protocol;
pub mod service;
pub mod storage;
pub mod tag;

// Re-export primary types at crate root for convenience
pub use cache::{ResolutionCache, DEFAULT_RESOLUTION_TTL};
pub use error::{ProfileError, ProfileResult};
pub use profile::{DelayProfile, ProfileId, ProtocolPermission, DEFAULT_PROFILE_ORDER};
pub use protocol::{InMemoryProtocolRegistry, ProtocolDescriptor, ProtocolId, ProtocolRegistry};
pub use service::DelayProfileService;
pub use storage::{InMemoryProfileStore, ProfileStore, StorageError};
pub use tag::{canonical_key, TagId};
