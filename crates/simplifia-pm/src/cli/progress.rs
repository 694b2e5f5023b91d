//! Install progress display driven by pipeline events.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::orchestrator::{InstallEvent, InstallStage};

const SPINNER_TEMPLATE: &str = "{spinner:.magenta} {prefix:.bold} {msg}";
const DOWNLOAD_TEMPLATE: &str = "{spinner:.magenta} {prefix:.bold} [{bar:30.cyan/blue}] {bytes}/{total_bytes}";

/// One spinner per install that turns into a byte bar while downloading
pub struct InstallProgress {
    bar: ProgressBar,
}

impl InstallProgress {
    pub fn new(pack_id: &str, enabled: bool) -> Self {
        let bar = if enabled {
            let bar = ProgressBar::new_spinner();
            bar.set_style(Self::spinner_style());
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        } else {
            ProgressBar::hidden()
        };
        bar.set_prefix(pack_id.to_string());

        Self { bar }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template(SPINNER_TEMPLATE).unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn download_style() -> ProgressStyle {
        ProgressStyle::with_template(DOWNLOAD_TEMPLATE)
            .map(|style| style.progress_chars("#>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
    }

    pub fn stage_message(stage: InstallStage) -> &'static str {
        match stage {
            InstallStage::Resolving => "looking up pack...",
            InstallStage::Downloading => "downloading...",
            InstallStage::Verifying => "verifying SHA-256...",
            InstallStage::Extracting => "extracting...",
            InstallStage::Installing => "copying files...",
            InstallStage::Migrating => "running migrations...",
            InstallStage::Committing => "recording install...",
            InstallStage::Done => "done",
        }
    }

    pub fn handle(&self, event: InstallEvent) {
        match event {
            InstallEvent::Stage(stage) => {
                if stage == InstallStage::Verifying {
                    self.bar.set_style(Self::spinner_style());
                }
                self.bar.set_message(Self::stage_message(stage));
            }
            InstallEvent::Progress { downloaded, total } => {
                if total > 0 && self.bar.length() != Some(total) {
                    self.bar.set_length(total);
                    self.bar.set_style(Self::download_style());
                }
                self.bar.set_position(downloaded);
                if total == 0 {
                    self.bar.set_message(format!("downloading... {}", format_bytes(downloaded)));
                }
            }
        }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(500), "500 B");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.00 MB");
    }

    #[test]
    fn test_hidden_progress_accepts_events() {
        let progress = InstallProgress::new("crm", false);
        progress.handle(InstallEvent::Stage(InstallStage::Downloading));
        progress.handle(InstallEvent::Progress { downloaded: 10, total: 100 });
        progress.handle(InstallEvent::Progress { downloaded: 10, total: 0 });
        progress.handle(InstallEvent::Stage(InstallStage::Done));
        progress.finish();
    }
}
