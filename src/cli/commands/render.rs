//! render command - Print the Mermaid diagram of a case

use anyhow::{Context as _, Result};

use super::runtime;
use crate::cli::Context;
use crate::core::types::CaseId;
use crate::diagram;
use crate::ui::output;

/// Fetch a case once and print its diagram.
///
/// # Arguments
///
/// * `ctx` - Execution context
/// * `case` - Case to render
/// * `no_header` - Print statements only, without `graph TB;`
pub fn render(ctx: &Context, case: CaseId, no_header: bool) -> Result<()> {
    let store = ctx.store()?;
    let document = runtime()?
        .block_on(store.fetch_case(case))
        .with_context(|| format!("cannot fetch case {}", case))?;

    let compiled = diagram::compile(&document, ctx.config.schema(), ctx.config.max_depth())
        .with_context(|| format!("cannot render case {}", case))?;

    output::debug(
        format!("{} nodes in case {}", compiled.node_ids().len(), case),
        ctx.verbosity,
    );

    let text = if no_header {
        compiled.render()
    } else {
        compiled.to_mermaid()
    };
    // Rendered text already ends with a newline.
    print!("{}", text);
    Ok(())
}
