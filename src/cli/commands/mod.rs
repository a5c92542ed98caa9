//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Resolves the store and, where the command needs one, the session
//! 2. Runs the operation
//! 3. Formats and displays output
//!
//! # Async Commands
//!
//! Every command except `session` and `completion` talks to the case store
//! over the network. Handlers are synchronous wrappers that build a tokio
//! runtime and block on the async implementation.

mod completion;
mod delete;
mod list;
mod lock;
mod render;
mod session;
mod show;
mod watch;

pub use completion::completion;
pub use delete::delete;
pub use list::list;
pub use lock::{lock, unlock};
pub use render::render;
pub use session::session;
pub use show::show;
pub use watch::watch;

use super::args::Command;
use super::Context;
use anyhow::Result;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Render { case, no_header } => render(ctx, case, no_header),
        Command::Watch {
            case,
            edit,
            interval,
        } => watch(ctx, case, edit, interval),
        Command::Lock { case, force } => lock(ctx, case, force),
        Command::Unlock { case } => unlock(ctx, case),
        Command::List => list(ctx),
        Command::Show { case, node } => show(ctx, case, &node),
        Command::Delete { case } => delete(ctx, case),
        Command::Session { reset } => session(ctx, reset),
        Command::Completion { shell } => completion(shell),
    }
}

pub(crate) fn runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?)
}
