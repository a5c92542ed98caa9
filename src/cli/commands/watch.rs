//! watch command - Follow a case as it changes
//!
//! Runs a [`Viewer`] until Ctrl-C, printing the diagram each time the
//! document changes and a line each time the edit lock changes hands.
//!
//! With `--edit`, the first document is shown before the lock is requested.
//! Taking over another session's lock is confirmed on a blocking thread, so
//! polling keeps running and Ctrl-C still stops the command while the
//! question is open.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};

use super::runtime;
use crate::cli::Context;
use crate::core::types::CaseId;
use crate::session::SessionIdentity;
use crate::sync::{LockOutcome, LockState, Snapshot, Viewer, ViewerHandle, ViewerOptions};
use crate::ui::{output, prompts};

/// Watch a case.
///
/// # Arguments
///
/// * `ctx` - Execution context
/// * `case` - Case to watch
/// * `edit` - Take the edit lock once the case has loaded
/// * `interval` - Poll interval override in seconds
pub fn watch(ctx: &Context, case: CaseId, edit: bool, interval: Option<u64>) -> Result<()> {
    let mut options = ViewerOptions::from(&ctx.config);
    if let Some(secs) = interval {
        if secs == 0 {
            bail!("--interval must be at least 1 second");
        }
        options.poll_interval = Duration::from_secs(secs);
    }

    let identity = ctx.identity()?;
    let runtime = runtime()?;
    let result = runtime.block_on(watch_async(ctx, &identity, case, edit, options));
    // A prompt abandoned by Ctrl-C may still be blocked on stdin.
    runtime.shutdown_background();
    result
}

/// What has been printed so far.
#[derive(Default)]
struct Screen {
    seq: u64,
    lock: Option<LockState>,
}

impl Screen {
    fn show(&mut self, ctx: &Context, case: CaseId, snapshot: &Snapshot) {
        if let Some(diagram) = &snapshot.diagram {
            if snapshot.seq != self.seq {
                self.seq = snapshot.seq;
                output::print(format!("# case {} (poll {})", case, snapshot.seq), ctx.verbosity);
                print!("{}", diagram.to_mermaid());
            }
        }
        if snapshot.case.is_some() && self.lock.as_ref() != Some(&snapshot.lock) {
            output::print(format!("# lock: {}", output::format_lock(&snapshot.lock)), ctx.verbosity);
            self.lock = Some(snapshot.lock.clone());
        }
    }
}

async fn watch_async(
    ctx: &Context,
    identity: &SessionIdentity,
    case: CaseId,
    edit: bool,
    options: ViewerOptions,
) -> Result<()> {
    let viewer = Viewer::new(
        ctx.store()?,
        identity,
        case,
        Arc::new(ctx.config.schema().clone()),
        options,
    );
    let (handle, task) = viewer.spawn();
    let mut snapshots = handle.subscribe();
    let mut screen = Screen::default();

    output::print(
        format!(
            "Watching case {} every {}s (Ctrl-C to stop).",
            case,
            options.poll_interval.as_secs()
        ),
        ctx.verbosity,
    );

    let mut interrupted = false;
    if edit {
        // The current holder is unknown until the first document arrives.
        let loaded = tokio::select! {
            loaded = snapshots.wait_for(|s| s.case.is_some()) => loaded.ok().map(|s| s.clone()),
            _ = tokio::signal::ctrl_c() => {
                interrupted = true;
                None
            }
        };

        if let Some(snapshot) = loaded {
            screen.show(ctx, case, &snapshot);
            let outcome = tokio::select! {
                outcome = take_lock(ctx, &handle, case, &snapshot.lock) => Some(outcome),
                _ = tokio::signal::ctrl_c() => {
                    interrupted = true;
                    None
                }
            };
            match outcome {
                Some(Ok(LockOutcome::Declined)) => {
                    output::warn("continuing read-only", ctx.verbosity)
                }
                Some(Ok(_)) | None => {}
                Some(Err(e)) => output::error(format!("cannot take edit lock: {:#}", e)),
            }
        }
    }

    // Whatever is current now, whether or not the lock request published.
    let current = snapshots.borrow_and_update().clone();
    screen.show(ctx, case, &current);

    while !interrupted {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                screen.show(ctx, case, &snapshot);
            }
            _ = tokio::signal::ctrl_c() => {
                interrupted = true;
            }
        }
    }

    // Closed means the loop already stopped on its own.
    let _ = handle.shutdown().await;
    task.await??;
    output::print("Stopped.", ctx.verbosity);
    Ok(())
}

/// Request the edit lock, asking first if `seen` says another session has it.
async fn take_lock(
    ctx: &Context,
    handle: &ViewerHandle,
    case: CaseId,
    seen: &LockState,
) -> Result<LockOutcome> {
    let approved = match seen {
        LockState::LockedByOther(holder) => {
            let question = format!(
                "Case {} is being edited by session {}. Take over the edit lock?",
                case, holder
            );
            let (yes, interactive) = (ctx.yes, ctx.interactive);
            let answer = tokio::task::spawn_blocking(move || {
                prompts::confirm_or_flag(&question, yes, interactive)
            })
            .await?;
            answer.then(|| holder.clone())
        }
        _ => None,
    };

    // Only the holder the user was asked about may be overridden.
    let outcome = handle
        .enable_edit(move |current| approved.as_ref() == Some(current))
        .await?;
    Ok(outcome)
}
