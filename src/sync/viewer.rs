//! sync::viewer
//!
//! The event loop that keeps one case on screen.
//!
//! # Architecture
//!
//! A [`Viewer`] owns the synchronizer, the lock coordinator and the current
//! diagram. [`Viewer::spawn`] moves it onto a task running one
//! `tokio::select!` loop over:
//!
//! - the poll timer, which issues a fetch task per tick
//! - fetch completions from a `JoinSet`
//! - commands from any number of [`ViewerHandle`]s
//!
//! All state changes happen inside that loop, so a timer refresh and a lock
//! action can never interleave. Fetches run concurrently; the sequence
//! numbers decide which results count. At most [`MAX_PENDING_FETCHES`] run at
//! once; a tick that finds that many still running is skipped. Lock writes are
//! awaited in the loop.
//!
//! Observers read published [`Snapshot`]s through a `watch` channel.
//!
//! # Teardown
//!
//! A shutdown command, or dropping every handle, stops the loop. The timer
//! stops, outstanding fetch results are discarded, and the edit lock is
//! released if this session holds it.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::lock::{LockCoordinator, LockError, LockOutcome, LockState};
use super::poll::{PollingSynchronizer, Refresh, Seq};
use crate::core::case::{AssuranceCase, Node};
use crate::core::config::{Config, DEFAULT_MAX_DEPTH, DEFAULT_POLL_INTERVAL};
use crate::core::schema::TypeSchema;
use crate::core::types::{CaseId, NodeId, SessionToken, TypeError};
use crate::diagram::{self, CompileError, Diagram};
use crate::session::SessionIdentity;
use crate::store::{CaseStore, StoreError};

/// Ticks are skipped while this many fetches are still running.
pub const MAX_PENDING_FETCHES: usize = 4;

/// Errors from the viewer.
#[derive(Debug, Error)]
pub enum ViewerError {
    /// The case could not be compiled; the viewer stopped.
    #[error("cannot render case: {0}")]
    Compile(#[from] CompileError),

    /// A lock write failed.
    #[error(transparent)]
    Lock(#[from] LockError),

    /// A clicked identifier did not parse.
    #[error("invalid node id: {0}")]
    InvalidNodeId(#[from] TypeError),

    /// A clicked identifier is not in the current document.
    #[error("node {0} is not in the current case")]
    UnknownNode(NodeId),

    /// The viewer loop is no longer running.
    #[error("viewer has stopped")]
    Closed,
}

/// Asked whether to take the lock from its current holder.
pub type Confirm = Box<dyn FnOnce(&SessionToken) -> bool + Send>;

/// Viewer tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewerOptions {
    /// Time between polls
    pub poll_interval: Duration,
    /// Diagram depth limit
    pub max_depth: usize,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl From<&Config> for ViewerOptions {
    fn from(config: &Config) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            max_depth: config.max_depth(),
        }
    }
}

/// Published view state.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// The accepted document, once a fetch has succeeded
    pub case: Option<Arc<AssuranceCase>>,
    /// Diagram of the accepted document
    pub diagram: Option<Arc<Diagram>>,
    /// Edit lock as seen by this session
    pub lock: LockState,
    /// Sequence number of the fetch that produced `case`
    pub seq: Seq,
}

enum Command {
    Enable {
        confirm: Confirm,
        reply: oneshot::Sender<Result<LockOutcome, LockError>>,
    },
    Disable {
        reply: oneshot::Sender<Result<bool, LockError>>,
    },
    Refresh,
    Shutdown,
}

type FetchResult = (Seq, Result<AssuranceCase, StoreError>);

/// Viewer state before it is spawned.
pub struct Viewer {
    store: Arc<dyn CaseStore>,
    schema: Arc<TypeSchema>,
    options: ViewerOptions,
    sync: PollingSynchronizer,
    lock: LockCoordinator,
    snapshots: watch::Sender<Snapshot>,
}

impl Viewer {
    /// Create a viewer for `case`.
    pub fn new(
        store: Arc<dyn CaseStore>,
        identity: &SessionIdentity,
        case: CaseId,
        schema: Arc<TypeSchema>,
        options: ViewerOptions,
    ) -> Self {
        let (snapshots, _) = watch::channel(Snapshot::default());
        Self {
            store,
            schema,
            options,
            sync: PollingSynchronizer::new(options.poll_interval),
            lock: LockCoordinator::new(case, identity),
            snapshots,
        }
    }

    /// Start the event loop.
    ///
    /// The join handle yields the loop's result: `Ok` after a clean
    /// shutdown, `ViewerError::Compile` if the case could not be rendered.
    pub fn spawn(self) -> (ViewerHandle, JoinHandle<Result<(), ViewerError>>) {
        let (commands_tx, commands_rx) = mpsc::channel(16);
        let handle = ViewerHandle {
            commands: commands_tx,
            snapshots: self.snapshots.subscribe(),
            schema: Arc::clone(&self.schema),
        };
        let task = tokio::spawn(self.run(commands_rx));
        (handle, task)
    }

    async fn run(mut self, mut commands: mpsc::Receiver<Command>) -> Result<(), ViewerError> {
        let case = self.lock.case();
        info!(%case, interval = ?self.sync.interval(), "viewer started");

        let mut ticker = tokio::time::interval(self.sync.interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut fetches: JoinSet<FetchResult> = JoinSet::new();

        let result = loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if fetches.len() < MAX_PENDING_FETCHES {
                        self.spawn_fetch(&mut fetches);
                    } else {
                        debug!(%case, pending = fetches.len(), "skipping tick, fetches still running");
                    }
                }
                Some(joined) = fetches.join_next() => match joined {
                    Ok((seq, result)) => {
                        if let Err(e) = self.on_fetch(seq, result) {
                            break Err(e);
                        }
                    }
                    Err(e) => warn!(error = %e, "fetch task failed"),
                },
                command = commands.recv() => match command {
                    None | Some(Command::Shutdown) => break Ok(()),
                    Some(command) => self.on_command(command, &mut fetches).await,
                },
            }
        };

        drop(ticker);
        self.sync.teardown();
        if self.lock.release_on_teardown(self.store.as_ref()).await {
            self.publish_lock();
        }
        fetches.abort_all();
        info!(%case, "viewer stopped");
        result
    }

    fn spawn_fetch(&mut self, fetches: &mut JoinSet<FetchResult>) {
        let seq = self.sync.issue();
        let store = Arc::clone(&self.store);
        let case = self.lock.case();
        fetches.spawn(async move { (seq, store.fetch_case(case).await) });
    }

    fn on_fetch(
        &mut self,
        seq: Seq,
        result: Result<AssuranceCase, StoreError>,
    ) -> Result<(), ViewerError> {
        match self.sync.complete(seq, result) {
            Refresh::Changed => {
                let Some(case) = self.sync.accepted() else {
                    return Ok(());
                };
                let diagram = diagram::compile(case, &self.schema, self.options.max_depth)?;
                let case = Arc::new(case.clone());
                self.lock.observe(case.lock_holder());
                let lock = self.lock.state().clone();
                self.snapshots.send_modify(|snapshot| {
                    snapshot.case = Some(case);
                    snapshot.diagram = Some(Arc::new(diagram));
                    snapshot.lock = lock;
                    snapshot.seq = seq;
                });
            }
            Refresh::Unchanged => {
                // The document is the same, but a lock write since the last
                // change may have left the local state ahead of it.
                let holder = self.sync.accepted().and_then(|c| c.lock_holder()).cloned();
                if self.lock.observe(holder.as_ref()) {
                    self.publish_lock();
                }
            }
            Refresh::Failed(_) | Refresh::Stale | Refresh::Discarded => {}
        }
        Ok(())
    }

    async fn on_command(&mut self, command: Command, fetches: &mut JoinSet<FetchResult>) {
        match command {
            Command::Enable { confirm, reply } => {
                let result = self.lock.enable(self.store.as_ref(), confirm).await;
                if matches!(result, Ok(outcome) if outcome.wrote()) {
                    self.after_lock_write(fetches);
                }
                let _ = reply.send(result);
            }
            Command::Disable { reply } => {
                let result = self.lock.disable(self.store.as_ref()).await;
                if matches!(result, Ok(true)) {
                    self.after_lock_write(fetches);
                }
                let _ = reply.send(result);
            }
            Command::Refresh => self.spawn_fetch(fetches),
            Command::Shutdown => {}
        }
    }

    fn after_lock_write(&mut self, fetches: &mut JoinSet<FetchResult>) {
        self.publish_lock();
        self.sync.invalidate_outstanding();
        debug!(case = %self.lock.case(), "refreshing after lock write");
        self.spawn_fetch(fetches);
    }

    fn publish_lock(&self) {
        let lock = self.lock.state().clone();
        self.snapshots.send_modify(|snapshot| snapshot.lock = lock);
    }
}

/// Cloneable handle to a running viewer.
#[derive(Clone)]
pub struct ViewerHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<Snapshot>,
    schema: Arc<TypeSchema>,
}

impl ViewerHandle {
    /// Request edit mode. `confirm` is asked before overriding another
    /// session's lock.
    ///
    /// `confirm` runs inside the viewer loop, which polls nothing while it
    /// runs. Collect any user answer beforehand and pass a closure that only
    /// checks it.
    pub async fn enable_edit<F>(&self, confirm: F) -> Result<LockOutcome, ViewerError>
    where
        F: FnOnce(&SessionToken) -> bool + Send + 'static,
    {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Enable {
            confirm: Box::new(confirm),
            reply,
        })
        .await?;
        Ok(rx.await.map_err(|_| ViewerError::Closed)??)
    }

    /// Leave edit mode. Returns `true` if the lock was released.
    pub async fn disable_edit(&self) -> Result<bool, ViewerError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Disable { reply }).await?;
        Ok(rx.await.map_err(|_| ViewerError::Closed)??)
    }

    /// Fetch now instead of waiting for the next tick.
    pub async fn refresh(&self) -> Result<(), ViewerError> {
        self.send(Command::Refresh).await
    }

    /// Stop the viewer. Returns immediately; await the join handle to wait
    /// for the lock release.
    pub async fn shutdown(&self) -> Result<(), ViewerError> {
        self.send(Command::Shutdown).await
    }

    /// The latest published snapshot.
    pub fn snapshot(&self) -> Snapshot {
        self.snapshots.borrow().clone()
    }

    /// A receiver notified on every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.clone()
    }

    /// Resolve a clicked diagram identifier to its node.
    ///
    /// # Errors
    ///
    /// - `ViewerError::InvalidNodeId` if `id` is not `<type>_<number>`
    /// - `ViewerError::UnknownNode` if nothing in the current case has it
    pub fn select_node(&self, id: &str) -> Result<Node, ViewerError> {
        let node_id: NodeId = id.parse()?;
        let snapshot = self.snapshots.borrow();
        snapshot
            .case
            .as_ref()
            .and_then(|case| case.find_node(&self.schema, &node_id))
            .cloned()
            .ok_or(ViewerError::UnknownNode(node_id))
    }

    async fn send(&self, command: Command) -> Result<(), ViewerError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| ViewerError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::mock::MockCaseStore;

    fn viewer(store: &MockCaseStore) -> Viewer {
        polling_viewer(store, Duration::from_secs(3600))
    }

    fn polling_viewer(store: &MockCaseStore, poll_interval: Duration) -> Viewer {
        let identity =
            SessionIdentity::ephemeral("tab", SessionToken::new("s1").unwrap());
        Viewer::new(
            Arc::new(store.clone()),
            &identity,
            CaseId::new(1),
            Arc::new(TypeSchema::assurance()),
            ViewerOptions {
                poll_interval,
                max_depth: 64,
            },
        )
    }

    #[tokio::test]
    async fn first_tick_publishes_diagram() {
        let store = MockCaseStore::with_cases(vec![AssuranceCase::new(CaseId::new(1), "Case")
            .with_node("goals", Node::new(7, "G"))]);
        let (handle, task) = viewer(&store).spawn();

        let mut rx = handle.subscribe();
        rx.wait_for(|s| s.diagram.is_some()).await.unwrap();
        let node = handle.select_node("TopLevelNormativeGoal_7").unwrap();
        assert_eq!(node.name(), "G");

        handle.shutdown().await.unwrap();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn select_node_errors() {
        let store = MockCaseStore::with_cases(vec![AssuranceCase::new(CaseId::new(1), "Case")]);
        let (handle, task) = viewer(&store).spawn();
        handle
            .subscribe()
            .wait_for(|s| s.case.is_some())
            .await
            .unwrap();

        assert!(matches!(
            handle.select_node("nounderscore"),
            Err(ViewerError::InvalidNodeId(_))
        ));
        assert!(matches!(
            handle.select_node("Evidence_1"),
            Err(ViewerError::UnknownNode(_))
        ));

        handle.shutdown().await.unwrap();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn hung_fetches_do_not_pile_up() {
        let store = MockCaseStore::with_cases(vec![AssuranceCase::new(CaseId::new(1), "Case")]);
        store.set_fetch_delays(vec![Some(Duration::MAX); 64]);
        let (handle, task) = polling_viewer(&store, Duration::from_millis(10)).spawn();

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(store.fetch_count(), MAX_PENDING_FETCHES);

        handle.shutdown().await.unwrap();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn commands_after_stop_are_closed() {
        let store = MockCaseStore::new();
        let (handle, task) = viewer(&store).spawn();
        handle.shutdown().await.unwrap();
        task.await.unwrap().unwrap();

        assert!(matches!(handle.refresh().await, Err(ViewerError::Closed)));
    }
}
