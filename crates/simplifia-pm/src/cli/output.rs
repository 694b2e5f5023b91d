//! Styled messages on stderr.

use console::{style, Term};
use std::io::Write;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose,
}

impl Verbosity {
    /// Map a `-v` count; `quiet` wins over any count
    pub fn from_flags(quiet: bool, verbose: u8) -> Self {
        match (quiet, verbose) {
            (true, _) => Verbosity::Quiet,
            (false, 0) => Verbosity::Normal,
            _ => Verbosity::Verbose,
        }
    }
}

pub struct Output {
    term: Term,
    verbosity: Verbosity,
}

impl Output {
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            term: Term::stderr(),
            verbosity,
        }
    }

    fn shows(&self, min: Verbosity) -> bool {
        self.verbosity >= min
    }

    pub fn writeln(&self, message: &str) {
        if self.shows(Verbosity::Normal) {
            let _ = writeln!(&self.term, "{}", message);
        }
    }

    /// Bold heading naming the pack being worked on
    pub fn headline(&self, message: &str) {
        if self.shows(Verbosity::Normal) {
            let _ = writeln!(&self.term, "{}", style(message).magenta().bold());
        }
    }

    pub fn success(&self, message: &str) {
        if self.shows(Verbosity::Normal) {
            let _ = writeln!(&self.term, "{} {}", style("✓").green().bold(), message);
        }
    }

    pub fn warning(&self, message: &str) {
        let _ = writeln!(&self.term, "{} {}", style("Warning:").yellow().bold(), message);
    }

    pub fn error(&self, message: &str) {
        let _ = writeln!(&self.term, "{} {}", style("Error:").red().bold(), message);
    }

    /// Dimmed follow-up advice
    pub fn hint(&self, message: &str) {
        if self.shows(Verbosity::Normal) {
            let _ = writeln!(&self.term, "  {}", style(message).dim());
        }
    }

    pub fn verbose(&self, message: &str) {
        if self.shows(Verbosity::Verbose) {
            let _ = writeln!(&self.term, "{}", style(message).dim());
        }
    }

    pub fn section(&self, title: &str) {
        if self.shows(Verbosity::Normal) {
            let _ = writeln!(&self.term, "\n{}", style(title).bold().underlined());
        }
    }

    pub fn list_item(&self, prefix: &str, message: &str) {
        if self.shows(Verbosity::Normal) {
            let _ = writeln!(&self.term, "  {} {}", style(prefix).cyan(), message);
        }
    }

    /// Left-aligned columns; missing widths default to 20
    pub fn table_row(&self, columns: &[&str], widths: &[usize]) {
        if self.shows(Verbosity::Normal) {
            let line: String = columns
                .iter()
                .enumerate()
                .map(|(i, col)| {
                    let width = widths.get(i).copied().unwrap_or(20);
                    format!("{:<width$}", col, width = width)
                })
                .collect();
            let _ = writeln!(&self.term, "{}", line.trim_end());
        }
    }

    pub fn is_quiet(&self) -> bool {
        self.verbosity == Verbosity::Quiet
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new(Verbosity::Normal)
    }
}
