//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--config <path>`: Use this config file
//! - `--base-url <url>`: Override the case store URL
//! - `--context <name>`: Session context (one per terminal profile/tab)
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output; implies no prompts
//! - `--yes` / `-y`: Answer yes to confirmations

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::core::types::CaseId;

/// Session context used when `--context` is not given.
pub const DEFAULT_CONTEXT: &str = "default";

/// caseview - Diagrams and edit locks for collaboratively edited assurance cases
#[derive(Parser, Debug)]
#[command(name = "caseview")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Use this config file instead of the default locations
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Case store base URL (overrides config)
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Session context name; each context has its own session token
    #[arg(long, global = true, default_value = DEFAULT_CONTEXT, env = "CASEVIEW_CONTEXT")]
    pub context: String,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output; implies no prompts
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Answer yes to every confirmation
    #[arg(short, long, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }

    /// Determine if interactive mode is enabled.
    pub fn interactive(&self) -> bool {
        !self.quiet
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the Mermaid diagram of a case
    #[command(
        name = "render",
        long_about = "Print the Mermaid flowchart of an assurance case.\n\n\
            Fetches the case once and compiles its tree into Mermaid text. Every node \
            gets a stable identifier of the form <Type>_<id> and a click binding.",
        after_help = "\
EXAMPLES:
    # Render case 1 for a Mermaid renderer
    caseview render 1 > case.mmd

    # Statements only, without the flowchart header
    caseview render 1 --no-header"
    )]
    Render {
        /// Case id
        case: CaseId,

        /// Omit the `graph TB;` header line
        #[arg(long)]
        no_header: bool,
    },

    /// Follow a case, printing the diagram and lock state as they change
    #[command(
        name = "watch",
        long_about = "Poll a case and print its diagram and edit-lock state whenever they change.\n\n\
            With --edit the session takes the edit lock on start, asking before overriding \
            another session's lock. The lock is released on Ctrl-C.",
        after_help = "\
EXAMPLES:
    # Read-only view of case 1
    caseview watch 1

    # Edit case 1, taking over from another session without asking
    caseview watch 1 --edit --yes"
    )]
    Watch {
        /// Case id
        case: CaseId,

        /// Take the edit lock on start
        #[arg(long)]
        edit: bool,

        /// Poll interval in seconds (overrides config)
        #[arg(long, value_name = "SECS")]
        interval: Option<u64>,
    },

    /// Take the edit lock of a case
    Lock {
        /// Case id
        case: CaseId,

        /// Override another session's lock without asking
        #[arg(short, long)]
        force: bool,
    },

    /// Release the edit lock of a case held by this session
    Unlock {
        /// Case id
        case: CaseId,
    },

    /// List the cases in the store
    List,

    /// Show one node of a case by its diagram identifier
    #[command(after_help = "\
EXAMPLES:
    caseview show 1 PropertyClaim_4")]
    Show {
        /// Case id
        case: CaseId,

        /// Diagram node identifier, e.g. PropertyClaim_4
        node: String,
    },

    /// Delete a case from the store
    Delete {
        /// Case id
        case: CaseId,
    },

    /// Show this context's session token
    Session {
        /// Forget the token; the next command mints a new one
        #[arg(long)]
        reset: bool,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
