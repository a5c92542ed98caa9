//! session command - Show or reset this context's session token

use anyhow::{Context as _, Result};

use crate::cli::Context;
use crate::session::SessionStore;
use crate::ui::output;

/// Print the session token, or forget it with `reset`.
pub fn session(ctx: &Context, reset: bool) -> Result<()> {
    if reset {
        let store = ctx.session_store()?;
        store
            .forget(&ctx.session_context)
            .context("cannot reset session")?;
        output::success(
            format!("Forgot session for context '{}'.", ctx.session_context),
            ctx.verbosity,
        );
        return Ok(());
    }

    let identity = ctx.identity()?;
    output::result(identity.token());
    output::print(
        format!(
            "context: {}\ncreated: {}",
            identity.context(),
            identity.created_at().to_rfc3339()
        ),
        ctx.verbosity,
    );
    Ok(())
}
