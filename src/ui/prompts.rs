//! ui::prompts
//!
//! Interactive prompts and confirmations.
//!
//! # Design
//!
//! Prompts are only shown in interactive mode. In non-interactive mode a
//! confirmation is answered by `--yes` or declined; it never blocks on
//! stdin.

use std::io::{self, BufRead, Write};

use thiserror::Error;

/// Errors from prompts.
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("prompt cancelled by user")]
    Cancelled,

    #[error("not in interactive mode")]
    NotInteractive,

    #[error("IO error: {0}")]
    IoError(String),
}

/// Prompt for confirmation (yes/no) on the terminal.
///
/// Returns `Ok(true)` if the user confirms, `Ok(false)` if they decline.
/// An empty answer takes `default`.
///
/// # Errors
///
/// - `PromptError::NotInteractive` if not in interactive mode
/// - `PromptError::Cancelled` if stdin is closed
pub fn confirm(message: &str, default: bool, interactive: bool) -> Result<bool, PromptError> {
    if !interactive {
        return Err(PromptError::NotInteractive);
    }
    let stdin = io::stdin();
    let mut stderr = io::stderr();
    confirm_with(&mut stdin.lock(), &mut stderr, message, default)
}

/// Confirmation over arbitrary streams.
pub fn confirm_with<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    message: &str,
    default: bool,
) -> Result<bool, PromptError> {
    let hint = if default { "[Y/n]" } else { "[y/N]" };
    loop {
        write!(output, "{} {} ", message, hint).map_err(|e| PromptError::IoError(e.to_string()))?;
        output
            .flush()
            .map_err(|e| PromptError::IoError(e.to_string()))?;

        let mut line = String::new();
        let read = input
            .read_line(&mut line)
            .map_err(|e| PromptError::IoError(e.to_string()))?;
        if read == 0 {
            return Err(PromptError::Cancelled);
        }

        match line.trim().to_ascii_lowercase().as_str() {
            "" => return Ok(default),
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            _ => {}
        }
    }
}

/// Decide a confirmation from flags, prompting only when needed.
///
/// `--yes` always confirms. Without it, quiet mode declines and interactive
/// mode asks. A cancelled prompt declines.
pub fn confirm_or_flag(message: &str, yes: bool, interactive: bool) -> bool {
    if yes {
        return true;
    }
    match confirm(message, false, interactive) {
        Ok(answer) => answer,
        Err(PromptError::NotInteractive) | Err(PromptError::Cancelled) => false,
        Err(PromptError::IoError(e)) => {
            tracing::warn!(error = %e, "prompt failed");
            false
        }
    }
}
