//! Sync session lifecycle
//!
//! A [`SyncSession`] binds one remote client to one background worker thread.
//! `start()` and `stop()` are idempotent and never fail observably; problems
//! inside the worker are logged and end the run.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::config::SyncConfig;
use crate::directory::{ClientDirectory, SyncHost};
use crate::transport::{StreamTransport, WebSocketTransport};
use crate::worker::WorkerTask;

/// Immutable identity of the client a session syncs.
#[derive(Clone)]
pub struct ClientIdentity {
    /// Locally managed clients stream; discovered ones poll
    pub owned: bool,
    pub name: String,
    /// Base URL of the server, e.g. `http://10.0.0.2:32400`
    pub address: String,
    pub device_id: String,
    pub access_token: String,
}

impl ClientIdentity {
    pub fn new(
        owned: bool,
        name: impl Into<String>,
        address: impl Into<String>,
        device_id: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            owned,
            name: name.into(),
            address: address.into(),
            device_id: device_id.into(),
            access_token: access_token.into(),
        }
    }
}

impl std::fmt::Debug for ClientIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientIdentity")
            .field("owned", &self.owned)
            .field("name", &self.name)
            .field("address", &self.address)
            .field("device_id", &self.device_id)
            .field("access_token", &"***")
            .finish()
    }
}

/// How a session keeps its client current.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Strategy {
    /// Periodic presence and update checks
    Polling,
    /// Push notifications over a persistent connection
    Streaming,
}

impl Strategy {
    pub fn for_client(owned: bool) -> Self {
        if owned {
            Strategy::Streaming
        } else {
            Strategy::Polling
        }
    }
}

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SyncState {
    Stopped,
    Starting,
    Polling,
    Streaming,
    Stopping,
}

/// Counters for the current (or last) run of a session.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct SyncStats {
    pub frames_received: u64,
    /// Malformed, legacy and unrecognised frames
    pub frames_dropped: u64,
    pub notifications_decoded: u64,
    pub changesets_dispatched: u64,
    pub poll_cycles: u64,
    /// Full section updates requested
    pub updates_applied: u64,
}

#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    pub(crate) frames_received: AtomicU64,
    pub(crate) frames_dropped: AtomicU64,
    pub(crate) notifications_decoded: AtomicU64,
    pub(crate) changesets_dispatched: AtomicU64,
    pub(crate) poll_cycles: AtomicU64,
    pub(crate) updates_applied: AtomicU64,
}

impl StatsCounters {
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> SyncStats {
        SyncStats {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            notifications_decoded: self.notifications_decoded.load(Ordering::Relaxed),
            changesets_dispatched: self.changesets_dispatched.load(Ordering::Relaxed),
            poll_cycles: self.poll_cycles.load(Ordering::Relaxed),
            updates_applied: self.updates_applied.load(Ordering::Relaxed),
        }
    }

    fn reset(&self) {
        for counter in [
            &self.frames_received,
            &self.frames_dropped,
            &self.notifications_decoded,
            &self.changesets_dispatched,
            &self.poll_cycles,
            &self.updates_applied,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

/// State shared between a session and its worker thread.
#[derive(Debug)]
pub(crate) struct SessionShared {
    state: Mutex<SyncState>,
    pub(crate) stats: StatsCounters,
}

impl SessionShared {
    fn new() -> Self {
        Self {
            state: Mutex::new(SyncState::Stopped),
            stats: StatsCounters::default(),
        }
    }

    pub(crate) fn state(&self) -> SyncState {
        *self.state.lock()
    }

    pub(crate) fn set_state(&self, state: SyncState) {
        *self.state.lock() = state;
    }

    /// Move from Starting to a running state. A stop that already began wins.
    pub(crate) fn enter_running(&self, running: SyncState) {
        let mut state = self.state.lock();
        if *state == SyncState::Starting {
            *state = running;
        }
    }
}

/// Cancellation signal for one worker run.
#[derive(Debug, Default)]
pub(crate) struct TaskControl {
    cancelled: AtomicBool,
    wake: Notify,
}

impl TaskControl {
    pub(crate) fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
        self.wake.notify_one();
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Sleep for `duration`, returning early if cancelled.
    pub(crate) async fn sleep(&self, duration: Duration) {
        if self.is_cancelled() {
            return;
        }
        tokio::select! {
            _ = self.wake.notified() => {}
            _ = tokio::time::sleep(duration) => {}
        }
    }

    /// Resolve once cancellation has been requested.
    pub(crate) async fn cancelled(&self) {
        while !self.is_cancelled() {
            self.wake.notified().await;
        }
    }
}

/// Thread name for a session's worker. OS thread names cannot hold NUL bytes.
fn worker_thread_name(display_name: &str) -> String {
    format!("media-sync[{}]", display_name.replace('\0', ""))
}

struct WorkerHandle {
    control: Arc<TaskControl>,
    thread: JoinHandle<()>,
}

/// Background library sync for one remote client.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use sync_worker::{ClientIdentity, SyncSession};
///
/// let identity = ClientIdentity::new(true, "Living Room", "http://10.0.0.2:32400", "dev-1", token);
/// let session = SyncSession::new(identity, Arc::new(registry), Arc::new(host));
/// session.start();
/// // ...
/// session.stop(); // blocks until the worker has exited
/// ```
pub struct SyncSession {
    identity: Arc<ClientIdentity>,
    config: SyncConfig,
    directory: Arc<dyn ClientDirectory>,
    host: Arc<dyn SyncHost>,
    transport: Arc<dyn StreamTransport>,
    shared: Arc<SessionShared>,
    worker: Mutex<Option<WorkerHandle>>,
}

impl SyncSession {
    /// Create a stopped session using the WebSocket transport and default config.
    pub fn new(
        identity: ClientIdentity,
        directory: Arc<dyn ClientDirectory>,
        host: Arc<dyn SyncHost>,
    ) -> Self {
        Self {
            identity: Arc::new(identity),
            config: SyncConfig::default(),
            directory,
            host,
            transport: Arc::new(WebSocketTransport::new()),
            shared: Arc::new(SessionShared::new()),
            worker: Mutex::new(None),
        }
    }

    pub fn with_config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_transport(mut self, transport: Arc<dyn StreamTransport>) -> Self {
        self.transport = transport;
        self
    }

    pub fn identity(&self) -> &ClientIdentity {
        &self.identity
    }

    pub fn strategy(&self) -> Strategy {
        Strategy::for_client(self.identity.owned)
    }

    pub fn state(&self) -> SyncState {
        self.shared.state()
    }

    pub fn stats(&self) -> SyncStats {
        self.shared.stats.snapshot()
    }

    /// Whether a worker thread is alive. Turns false on its own when a
    /// streaming run ends (connection failure or server close).
    pub fn is_running(&self) -> bool {
        self.worker
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.thread.is_finished())
    }

    /// Start the background worker. No-op while one is already running.
    pub fn start(&self) {
        let mut worker = self.worker.lock();

        if let Some(handle) = worker.as_ref() {
            if !handle.thread.is_finished() {
                tracing::debug!(session = %self.identity.name, "Sync already running");
                return;
            }
        }

        // Reap a worker that ended by itself
        if let Some(finished) = worker.take() {
            if finished.thread.join().is_err() {
                tracing::error!(session = %self.identity.name, "Previous sync worker panicked");
            }
        }

        if let Err(e) = self.config.validate() {
            tracing::error!(session = %self.identity.name, "Not starting sync: {}", e);
            return;
        }

        let control = Arc::new(TaskControl::default());
        self.shared.stats.reset();
        self.shared.set_state(SyncState::Starting);

        let task = WorkerTask {
            identity: Arc::clone(&self.identity),
            config: self.config.clone(),
            strategy: self.strategy(),
            directory: Arc::clone(&self.directory),
            host: Arc::clone(&self.host),
            transport: Arc::clone(&self.transport),
            shared: Arc::clone(&self.shared),
            control: Arc::clone(&control),
        };

        let spawned = thread::Builder::new()
            .name(worker_thread_name(&self.identity.name))
            .spawn(move || task.run());

        match spawned {
            Ok(thread) => {
                tracing::info!(
                    session = %self.identity.name,
                    strategy = ?self.strategy(),
                    "Sync started"
                );
                *worker = Some(WorkerHandle { control, thread });
            }
            Err(e) => {
                tracing::error!(
                    session = %self.identity.name,
                    "Failed to spawn sync worker: {}",
                    e
                );
                self.shared.set_state(SyncState::Stopped);
            }
        }
    }

    /// Stop the background worker and wait for it to exit.
    ///
    /// On return the worker thread has finished and any stream connection has
    /// been closed. No-op when nothing was started.
    pub fn stop(&self) {
        let mut worker = self.worker.lock();
        let Some(handle) = worker.take() else {
            return;
        };

        if !handle.thread.is_finished() {
            self.shared.set_state(SyncState::Stopping);
        }
        handle.control.cancel();

        if handle.thread.join().is_err() {
            tracing::error!(session = %self.identity.name, "Sync worker panicked");
        }
        self.shared.set_state(SyncState::Stopped);

        tracing::info!(session = %self.identity.name, "Sync stopped");
    }
}

impl Drop for SyncSession {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for SyncSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncSession")
            .field("identity", &self.identity)
            .field("config", &self.config)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
