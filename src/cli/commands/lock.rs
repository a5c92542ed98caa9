//! lock and unlock commands - One-shot edit lock changes
//!
//! Both commands fetch the case first so the coordinator starts from the
//! current lock holder, then make a single write.

use anyhow::{Context as _, Result};

use super::runtime;
use crate::cli::Context;
use crate::core::types::CaseId;
use crate::sync::{LockCoordinator, LockOutcome, LockState};
use crate::ui::{output, prompts};

/// Take the edit lock of a case.
///
/// # Arguments
///
/// * `ctx` - Execution context
/// * `case` - Case to lock
/// * `force` - Override another session's lock without asking
pub fn lock(ctx: &Context, case: CaseId, force: bool) -> Result<()> {
    let identity = ctx.identity()?;
    let store = ctx.store()?;
    let yes = force || ctx.yes;
    let interactive = ctx.interactive;

    let outcome = runtime()?.block_on(async {
        let document = store
            .fetch_case(case)
            .await
            .with_context(|| format!("cannot fetch case {}", case))?;

        let mut coordinator = LockCoordinator::new(case, &identity);
        coordinator.observe(document.lock_holder());
        coordinator
            .enable(store.as_ref(), |holder| {
                let question = format!(
                    "Case {} is being edited by session {}. Take over the edit lock?",
                    case, holder
                );
                prompts::confirm_or_flag(&question, yes, interactive)
            })
            .await
            .context("cannot take edit lock")
    })?;

    match outcome {
        LockOutcome::Acquired => {
            output::success(format!("Editing case {}.", case), ctx.verbosity)
        }
        LockOutcome::Overridden => output::success(
            format!("Took over the edit lock of case {}.", case),
            ctx.verbosity,
        ),
        LockOutcome::AlreadyHeld => output::print(
            format!("This session already holds the edit lock of case {}.", case),
            ctx.verbosity,
        ),
        LockOutcome::Declined => output::warn(
            format!("Case {} stays read-only; lock not taken.", case),
            ctx.verbosity,
        ),
    }
    Ok(())
}

/// Release the edit lock of a case if this session holds it.
pub fn unlock(ctx: &Context, case: CaseId) -> Result<()> {
    let identity = ctx.identity()?;
    let store = ctx.store()?;

    let (released, state) = runtime()?.block_on(async {
        let document = store
            .fetch_case(case)
            .await
            .with_context(|| format!("cannot fetch case {}", case))?;

        let mut coordinator = LockCoordinator::new(case, &identity);
        coordinator.observe(document.lock_holder());
        let before = coordinator.state().clone();
        let released = coordinator
            .disable(store.as_ref())
            .await
            .context("cannot release edit lock")?;
        Ok::<_, anyhow::Error>((released, before))
    })?;

    if released {
        output::success(format!("Released the edit lock of case {}.", case), ctx.verbosity);
        return Ok(());
    }

    match state {
        LockState::LockedByOther(holder) => output::warn(
            format!(
                "Case {} is locked by session {}; only that session can release it.",
                case, holder
            ),
            ctx.verbosity,
        ),
        _ => output::print(format!("Case {} is not locked.", case), ctx.verbosity),
    }
    Ok(())
}
