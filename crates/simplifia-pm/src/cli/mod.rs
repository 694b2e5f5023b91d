//! Terminal presentation shared by the `simplifia` binary.

mod output;
mod progress;

pub use output::{Output, Verbosity};
pub use progress::{format_bytes, InstallProgress};
