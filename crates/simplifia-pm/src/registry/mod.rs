//! Pack registry lookup.
//!
//! The registry is a single JSON document listing every published pack.
//! [`RegistryClient`] fetches it over HTTP (or from a `file://` mirror) and
//! keeps the parsed document in a [`RegistryCache`] owned by the client, so
//! one CLI invocation fetches it at most once unless a refresh is forced.

mod client;
mod document;

pub use client::{RegistryCache, RegistryClient};
pub use document::{PackDescriptor, RegistryDocument};

use crate::Result;

/// Resolves pack identifiers to download metadata
pub trait PackRegistry {
    /// Look up a single pack; unknown ids and unreachable registries both
    /// fail with [`PackError::NotFound`](crate::PackError::NotFound).
    fn resolve(&mut self, pack_id: &str) -> Result<PackDescriptor>;

    /// Every pack in the registry, in listing order
    fn packs(&mut self, force_refresh: bool) -> Result<Vec<PackDescriptor>>;
}
