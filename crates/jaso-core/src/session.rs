//! A single recursive watch on a directory tree.
//!
//! [`WatchSession`] registers a [`notify`] watcher on its root and feeds
//! every notification to a worker thread, which coalesces bursts for a short
//! quiet period and then re-normalizes the affected subtrees. A supervisor
//! thread blocks on the worker and reports if it ever dies on its own.
//!
//! ```text
//! notify backend --(mpsc)--> worker: decode, route, debounce, walk
//!                               ^
//!                  supervisor --+ join, report unexpected exit
//! ```
//!
//! The worker also exits when its root disappears (deleted or moved away),
//! since the OS drops the watch with it. The supervisor reports that too.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};

use crate::config::WatchConfig;
use crate::error::{CoreError, CoreResult};
use crate::router::{route, EventRouter, FsEvent};
use crate::shell::{Alert, AlertLevel};
use crate::tree::{CancelToken, TreeNormalizer, TreeOptions};

/// Upper bound on how long a continuous stream of events can delay a walk.
const MAX_BATCH_WAIT: Duration = Duration::from_secs(2);

/// Lifecycle of a [`WatchSession`]. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Active,
    Stopped,
}

/// Messages delivered to the worker thread.
#[derive(Debug)]
enum WorkerMessage {
    Notify(notify::Result<notify::Event>),
    Shutdown,
}

/// Why the worker thread returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WorkerExit {
    Shutdown,
    RootGone,
    Disconnected,
}

/// One recursive watch plus its worker and supervisor threads.
///
/// A session starts at most once; watching again needs a new instance.
/// Dropping a session stops it.
pub struct WatchSession {
    root: PathBuf,
    config: WatchConfig,
    state: SessionState,
    watcher: Option<RecommendedWatcher>,
    wake: Option<Sender<WorkerMessage>>,
    supervisor: Option<JoinHandle<()>>,
    cancel: CancelToken,
    alive: Arc<AtomicBool>,
}

impl WatchSession {
    pub fn new(root: impl Into<PathBuf>, config: WatchConfig) -> Self {
        Self {
            root: root.into(),
            config,
            state: SessionState::Idle,
            watcher: None,
            wake: None,
            supervisor: None,
            cancel: CancelToken::new(),
            alive: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// `true` while the session is active and its worker is still running.
    pub fn is_alive(&self) -> bool {
        self.state == SessionState::Active && self.alive.load(Ordering::SeqCst)
    }

    /// Registers the recursive watch and launches the background threads.
    ///
    /// `alert` is told if the watch later dies without [`stop`](Self::stop)
    /// being called. On failure everything acquired so far is released and
    /// the session moves to [`SessionState::Stopped`].
    ///
    /// # Errors
    ///
    /// - [`CoreError::AlreadyStarted`] — the session is not idle.
    /// - [`CoreError::NotFound`] / [`CoreError::NotADirectory`] — bad root.
    /// - [`CoreError::Watch`] — the OS refused the watch.
    /// - [`CoreError::Io`] — a background thread could not be spawned.
    pub fn start(&mut self, alert: Arc<dyn Alert>) -> CoreResult<()> {
        if self.state != SessionState::Idle {
            return Err(CoreError::AlreadyStarted);
        }

        match self.try_start(alert) {
            Ok(()) => {
                self.state = SessionState::Active;
                tracing::info!("Watching {}", self.root.display());
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Failed to watch {}: {e}", self.root.display());
                self.release();
                self.state = SessionState::Stopped;
                Err(e)
            }
        }
    }

    fn try_start(&mut self, alert: Arc<dyn Alert>) -> CoreResult<()> {
        let root =
            std::fs::canonicalize(&self.root).map_err(|e| CoreError::from_io(&self.root, e))?;
        if !root.is_dir() {
            return Err(CoreError::NotADirectory(root));
        }
        self.root = root;

        let (tx, rx) = mpsc::channel();
        let notify_tx = tx.clone();
        let mut watcher = notify::recommended_watcher(move |result: notify::Result<notify::Event>| {
            let _ = notify_tx.send(WorkerMessage::Notify(result));
        })?;
        watcher.watch(&self.root, RecursiveMode::Recursive)?;
        self.watcher = Some(watcher);
        self.wake = Some(tx);

        let walker = TreeNormalizer::new(TreeOptions {
            exclude: self.config.exclude.clone(),
            ..TreeOptions::default()
        })
        .with_cancel(self.cancel.clone());
        let worker = Worker {
            root: self.root.clone(),
            router: EventRouter::new(walker).with_watch_root(self.root.clone()),
            debounce: self.config.debounce(),
            cancel: self.cancel.clone(),
            rx,
        };

        self.alive.store(true, Ordering::SeqCst);
        let worker = thread::Builder::new()
            .name("jaso-worker".to_string())
            .spawn(move || worker.run())?;

        let supervisor = Supervisor {
            root: self.root.clone(),
            cancel: self.cancel.clone(),
            alive: Arc::clone(&self.alive),
            alert,
        };
        self.supervisor = Some(
            thread::Builder::new()
                .name("jaso-supervisor".to_string())
                .spawn(move || supervisor.run(worker))?,
        );
        Ok(())
    }

    /// Stops watching and waits for the background threads to finish.
    ///
    /// Safe from any state and any number of times. Never fails: problems
    /// while tearing down are logged and swallowed. A rename already in
    /// flight completes, but no new walk starts afterwards.
    pub fn stop(&mut self) {
        if self.state == SessionState::Active {
            tracing::info!("Stopping watch on {}", self.root.display());
        }
        self.release();
        self.state = SessionState::Stopped;
    }

    fn release(&mut self) {
        self.cancel.cancel();

        if let Some(mut watcher) = self.watcher.take() {
            if let Err(e) = watcher.unwatch(&self.root) {
                // Expected when the root itself was deleted
                tracing::debug!("Unwatch {} failed: {e}", self.root.display());
            }
        }
        if let Some(wake) = self.wake.take() {
            let _ = wake.send(WorkerMessage::Shutdown);
        }
        if let Some(supervisor) = self.supervisor.take() {
            if supervisor.join().is_err() {
                tracing::warn!("Supervisor for {} panicked", self.root.display());
            }
        }
        self.alive.store(false, Ordering::SeqCst);
    }
}

impl Drop for WatchSession {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for WatchSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchSession")
            .field("root", &self.root)
            .field("state", &self.state)
            .field("alive", &self.alive.load(Ordering::SeqCst))
            .finish()
    }
}

struct Worker {
    root: PathBuf,
    router: EventRouter,
    debounce: Duration,
    cancel: CancelToken,
    rx: Receiver<WorkerMessage>,
}

impl Worker {
    fn run(self) -> WorkerExit {
        let mut pending: Vec<PathBuf> = Vec::new();
        let mut batch_started: Option<Instant> = None;

        let exit = loop {
            let received = match batch_started {
                None => self.rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
                Some(started) => {
                    let remaining = MAX_BATCH_WAIT.saturating_sub(started.elapsed());
                    self.rx.recv_timeout(self.debounce.min(remaining))
                }
            };

            match received {
                Ok(WorkerMessage::Notify(Ok(event))) => {
                    let event = FsEvent::from(event);
                    if let Some(path) = route(&event) {
                        tracing::debug!("Queued {} from {event:?}", path.display());
                        enqueue(&mut pending, path);
                        batch_started.get_or_insert_with(Instant::now);
                    }
                    if !self.root_exists() {
                        break WorkerExit::RootGone;
                    }
                }
                Ok(WorkerMessage::Notify(Err(e))) => {
                    tracing::warn!("Watch error: {e}");
                    if !self.root_exists() {
                        break WorkerExit::RootGone;
                    }
                }
                Ok(WorkerMessage::Shutdown) => break WorkerExit::Shutdown,
                Err(RecvTimeoutError::Disconnected) => break WorkerExit::Disconnected,
                Err(RecvTimeoutError::Timeout) => {
                    self.flush(&mut pending);
                    batch_started = None;
                }
            }

            if self.cancel.is_cancelled() {
                break WorkerExit::Shutdown;
            }
            if batch_started.is_some_and(|started| started.elapsed() >= MAX_BATCH_WAIT) {
                self.flush(&mut pending);
                batch_started = None;
            }
        };
        tracing::debug!(
            "Worker exiting ({exit:?}) with {} queued roots dropped",
            pending.len()
        );
        exit
    }

    /// The watch dies with its root, whether deleted or moved away.
    fn root_exists(&self) -> bool {
        std::fs::symlink_metadata(&self.root).is_ok_and(|m| m.is_dir())
    }

    fn flush(&self, pending: &mut Vec<PathBuf>) {
        for root in pending.drain(..) {
            if self.cancel.is_cancelled() {
                return;
            }
            self.router.normalize(&root);
        }
    }
}

/// Adds `path` unless an already-queued root covers it, dropping queued
/// roots that `path` covers.
fn enqueue(pending: &mut Vec<PathBuf>, path: &Path) {
    if pending.iter().any(|queued| path.starts_with(queued)) {
        return;
    }
    pending.retain(|queued| !queued.starts_with(path));
    pending.push(path.to_path_buf());
}

struct Supervisor {
    root: PathBuf,
    cancel: CancelToken,
    alive: Arc<AtomicBool>,
    alert: Arc<dyn Alert>,
}

impl Supervisor {
    /// Blocks until the worker exits. A dead watch is reported, not restarted.
    fn run(self, worker: JoinHandle<WorkerExit>) {
        let outcome = worker.join();
        self.alive.store(false, Ordering::SeqCst);

        if self.cancel.is_cancelled() {
            if outcome.is_err() {
                tracing::warn!("Worker for {} panicked while stopping", self.root.display());
            }
            return;
        }

        let reason = match outcome {
            Ok(WorkerExit::RootGone) => {
                tracing::error!("Watched folder {} is gone", self.root.display());
                "the folder was deleted or moved"
            }
            Ok(exit) => {
                tracing::error!("Watch on {} ended unexpectedly ({exit:?})", self.root.display());
                "the file watcher ended unexpectedly"
            }
            Err(_) => {
                tracing::error!("Worker for {} panicked", self.root.display());
                "the file watcher ended unexpectedly"
            }
        };
        self.alert.alert(
            AlertLevel::Error,
            &format!(
                "Stopped watching {}: {reason}. Start a new watch to resume.",
                self.root.display()
            ),
        );
    }
}
