//! Places extracted pack content into the workspace.

mod layout;
mod migration;

pub use layout::{CopyOutcome, CopyRule, CopyStep, LayoutInstaller};
pub use migration::{MigrationOutcome, MigrationReport, MigrationRunner, MigrationStep};
