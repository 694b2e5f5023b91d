//! Per-invocation state shared by every command.

use anyhow::{Context as _, Result};

use simplifia_pm::cli::{Output, Verbosity};
use simplifia_pm::{AuthState, PackManager, Settings};

pub struct Context {
    pub settings: Settings,
    pub output: Output,
    show_progress: bool,
}

impl Context {
    pub fn load(quiet: bool, verbose: u8, show_progress: bool) -> Result<Self> {
        let settings = Settings::build(true).context("Failed to load configuration")?;
        let verbosity = Verbosity::from_flags(quiet, verbose);

        Ok(Self {
            settings,
            output: Output::new(verbosity),
            show_progress: show_progress && !quiet && console::Term::stderr().is_term(),
        })
    }

    pub fn auth(&self) -> Option<AuthState> {
        AuthState::load(self.settings.auth_path())
    }

    pub fn show_progress(&self) -> bool {
        self.show_progress
    }

    /// A pack manager talking to the configured registry
    pub fn manager(&self) -> Result<PackManager> {
        let bearer = self.auth().map(|auth| auth.bearer_token().to_string());

        PackManager::builder(self.settings.clone())
            .with_bearer(bearer)
            .build()
            .context("Failed to initialise the pack manager")
    }
}
