//! delete command - Delete a case from the store
//!
//! # Integrity Contract
//!
//! - Asks for confirmation unless `--yes` is given
//! - Success is reported only when the store answers 204 No Content

use anyhow::{Context as _, Result};

use super::runtime;
use crate::cli::Context;
use crate::core::types::CaseId;
use crate::ui::{output, prompts};

/// Delete a case.
pub fn delete(ctx: &Context, case: CaseId) -> Result<()> {
    let question = format!("Delete case {}? This cannot be undone.", case);
    if !prompts::confirm_or_flag(&question, ctx.yes, ctx.interactive) {
        output::print("Cancelled.", ctx.verbosity);
        return Ok(());
    }

    let store = ctx.store()?;
    runtime()?
        .block_on(store.delete_case(case))
        .with_context(|| format!("cannot delete case {}", case))?;

    output::success(format!("Deleted case {}.", case), ctx.verbosity);
    Ok(())
}
