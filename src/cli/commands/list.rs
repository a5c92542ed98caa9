//! list command - List the cases in the store

use anyhow::{Context as _, Result};

use super::runtime;
use crate::cli::Context;
use crate::ui::output;

/// Print one `<id>  <name>` row per case.
pub fn list(ctx: &Context) -> Result<()> {
    let store = ctx.store()?;
    let cases = runtime()?
        .block_on(store.list_cases())
        .context("cannot list cases")?;

    if cases.is_empty() {
        output::print("No cases.", ctx.verbosity);
        return Ok(());
    }
    output::result(output::format_cases(&cases));
    Ok(())
}
