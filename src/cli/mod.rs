//! cli
//!
//! Command-line interface layer for caseview.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Load configuration and apply flag overrides
//! - Resolve the session identity for the chosen context
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. Handlers talk to the case store through
//! [`crate::store::CaseStore`] and to locking through [`crate::sync`]; they
//! own no protocol logic of their own.

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use std::sync::Arc;

use anyhow::{Context as _, Result};
use tracing_subscriber::EnvFilter;

use crate::core::config::Config;
use crate::session::{FileSessionStore, SessionIdentity};
use crate::store::{CaseStore, HttpCaseStore};
use crate::ui::output::Verbosity;

/// Everything a command handler needs.
#[derive(Debug, Clone)]
pub struct Context {
    /// Loaded configuration with flag overrides applied.
    pub config: Config,
    /// Session context name.
    pub session_context: String,
    /// Output verbosity.
    pub verbosity: Verbosity,
    /// Interactive mode enabled.
    pub interactive: bool,
    /// `--yes` given.
    pub yes: bool,
}

impl Context {
    /// Build the context from parsed flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be loaded.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let mut config = Config::load(cli.config.as_deref()).context("cannot load config")?;
        if let Some(url) = &cli.base_url {
            config.file.base_url = Some(url.clone());
        }

        Ok(Self {
            config,
            session_context: cli.context.clone(),
            verbosity: Verbosity::from_flags(cli.quiet, cli.debug),
            interactive: cli.interactive(),
            yes: cli.yes,
        })
    }

    /// The case store named by the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn store(&self) -> Result<Arc<dyn CaseStore>> {
        let store =
            HttpCaseStore::with_timeout(self.config.base_url(), self.config.request_timeout())
                .context("cannot create case store client")?;
        Ok(Arc::new(store))
    }

    /// The session file store.
    ///
    /// # Errors
    ///
    /// Returns an error if no session file path can be determined.
    pub fn session_store(&self) -> Result<FileSessionStore> {
        let path = self
            .config
            .session_file()
            .context("cannot locate session file")?;
        Ok(FileSessionStore::with_path(path))
    }

    /// Resolve this context's session identity, minting one on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if session storage cannot be read or written.
    pub fn identity(&self) -> Result<SessionIdentity> {
        let store = self.session_store()?;
        SessionIdentity::resolve(&store, &self.session_context)
            .with_context(|| format!("cannot resolve session '{}'", self.session_context))
    }
}

/// Install the `tracing` subscriber.
///
/// `RUST_LOG` wins when set; otherwise warnings only, or debug with
/// `--debug`. Logs go to stderr so stdout stays clean for diagrams.
pub fn init_tracing(debug: bool) {
    let default = if debug { "caseview=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    init_tracing(cli.debug);

    if let args::Command::Completion { shell } = cli.command {
        return commands::completion(shell);
    }

    let ctx = Context::from_cli(&cli)?;
    commands::dispatch(cli.command, &ctx)
}
