//! Artifact downloading, verification and extraction.
//!
//! Each stage of the install pipeline that touches the downloaded archive
//! lives here: the [`ArtifactFetcher`] streams it to the staging area,
//! [`verify_digest`] gates it on the registry's SHA-256, and the
//! [`ArchiveExtractor`] unpacks it and locates `pack.json`.

mod archive;
mod checksum;
mod fetch;

pub use archive::{ArchiveExtractor, ExtractedPack, ZipExtractor};
pub use checksum::{compute_sha256, verify_digest, Verification};
pub use fetch::{ArtifactFetcher, HttpFetcher};
