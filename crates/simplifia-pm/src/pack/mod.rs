//! The `pack.json` manifest shipped inside every pack archive.

mod manifest;

pub use manifest::{DbConfig, InstallSpec, Manifest, MANIFEST_FILE};
