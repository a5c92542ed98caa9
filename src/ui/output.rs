//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! Results go to stdout, diagnostics to stderr. Quiet mode suppresses
//! everything except errors and the primary result of a command (such as
//! the Mermaid text printed by `render`).

use std::fmt::Display;

use crate::core::case::CaseSummary;
use crate::sync::LockState;

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Quiet mode - minimal output
    Quiet,
    /// Normal mode - standard output
    Normal,
    /// Debug mode - verbose output
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }

    /// Whether prompts may be shown.
    pub fn is_interactive(self) -> bool {
        self != Verbosity::Quiet
    }
}

/// Print a command's primary result (always shown).
pub fn result(message: impl Display) {
    println!("{}", message);
}

/// Print a message (respects quiet mode).
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print a debug message (only in debug mode).
pub fn debug(message: impl Display, verbosity: Verbosity) {
    if verbosity == Verbosity::Debug {
        eprintln!("[debug] {}", message);
    }
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Print a warning message (respects quiet mode).
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("warning: {}", message);
    }
}

/// Print a success message (respects quiet mode).
pub fn success(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Format a lock state for display.
pub fn format_lock(state: &LockState) -> String {
    match state {
        LockState::Unlocked => "unlocked".to_string(),
        LockState::LockedBySelf => "editing (this session holds the lock)".to_string(),
        LockState::LockedByOther(holder) => format!("read-only (locked by {})", holder),
    }
}

/// Format a case listing, one `<id>  <name>` row per case.
pub fn format_cases(cases: &[CaseSummary]) -> String {
    let width = cases
        .iter()
        .map(|c| c.id.get().to_string().len())
        .max()
        .unwrap_or(0);
    format_list(
        &cases
            .iter()
            .map(|c| format!("{:>width$}  {}", c.id.get(), c.name, width = width))
            .collect::<Vec<_>>(),
        "",
    )
}

/// Format a list of items.
pub fn format_list<T: Display>(items: &[T], prefix: &str) -> String {
    items
        .iter()
        .map(|item| format!("{}{}", prefix, item))
        .collect::<Vec<_>>()
        .join("\n")
}
