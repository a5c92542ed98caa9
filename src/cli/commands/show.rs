//! show command - Show one node of a case
//!
//! Resolves a diagram identifier (`<Type>_<id>`, as passed to the click
//! callback) back to the node it was generated from.

use anyhow::{anyhow, Context as _, Result};

use super::runtime;
use crate::cli::Context;
use crate::core::types::{CaseId, NodeId};
use crate::ui::output;

/// Print a node's name and attributes.
pub fn show(ctx: &Context, case: CaseId, node: &str) -> Result<()> {
    let node_id: NodeId = node.parse()?;

    let store = ctx.store()?;
    let document = runtime()?
        .block_on(store.fetch_case(case))
        .with_context(|| format!("cannot fetch case {}", case))?;

    let found = document
        .find_node(ctx.config.schema(), &node_id)
        .ok_or_else(|| anyhow!("node {} is not in case {}", node_id, case))?;

    output::result(format!("{}: {}", node_id, found.name()));
    for (key, value) in found.attributes() {
        let value = match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        output::result(format!("  {}: {}", key, value));
    }
    Ok(())
}
