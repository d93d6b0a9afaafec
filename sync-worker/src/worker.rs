//! Background worker task
//!
//! Runs on the session's dedicated thread with its own current-thread tokio
//! runtime. The strategy is fixed at spawn time: polling checks the client on
//! a timer, streaming decodes push notifications until cancelled or closed.

use std::sync::Arc;

use tokio::time::Instant;
use tracing::Instrument;

use sync_notify::{classify, decode, requires_refresh, Decoded, Notification};

use crate::config::SyncConfig;
use crate::directory::{ClientDirectory, SyncHost};
use crate::endpoint::{notification_endpoint, redacted};
use crate::error::SyncError;
use crate::session::{ClientIdentity, SessionShared, StatsCounters, Strategy, SyncState, TaskControl};
use crate::transport::{StreamEvent, StreamTransport};

/// Result of one presence/update check against the client directory.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) enum UpdateOutcome {
    /// The client is no longer registered
    ClientMissing,
    /// The client is registered but the server is unreachable
    NotPresent,
    /// The scan found nothing to apply
    UpToDate,
    /// Updates were applied; `refreshed` is false while media is playing
    Updated { refreshed: bool },
}

/// Check a client for pending library changes and apply them.
///
/// The client is resolved fresh on every call.
pub(crate) fn apply_pending_updates(
    directory: &dyn ClientDirectory,
    host: &dyn SyncHost,
    address: &str,
) -> UpdateOutcome {
    let Some(client) = directory.find(address) else {
        return UpdateOutcome::ClientMissing;
    };

    if !client.presence() {
        return UpdateOutcome::NotPresent;
    }

    client.scan_sections();
    if !client.needs_update() {
        return UpdateOutcome::UpToDate;
    }

    client.update_sections();
    host.invalidate_directory_cache();

    let refreshed = !host.playback_active();
    if refreshed {
        host.refresh_all();
    }

    UpdateOutcome::Updated { refreshed }
}

pub(crate) struct WorkerTask {
    pub(crate) identity: Arc<ClientIdentity>,
    pub(crate) config: SyncConfig,
    pub(crate) strategy: Strategy,
    pub(crate) directory: Arc<dyn ClientDirectory>,
    pub(crate) host: Arc<dyn SyncHost>,
    pub(crate) transport: Arc<dyn StreamTransport>,
    pub(crate) shared: Arc<SessionShared>,
    pub(crate) control: Arc<TaskControl>,
}

impl WorkerTask {
    /// Thread entry point. Always leaves the session Stopped.
    pub(crate) fn run(self) {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                let error = SyncError::Runtime(e.to_string());
                tracing::error!(session = %self.identity.name, "Sync worker not started: {}", error);
                self.shared.set_state(SyncState::Stopped);
                return;
            }
        };

        let span = tracing::info_span!(
            "media_sync",
            session = %self.identity.name,
            device = %self.identity.device_id
        );

        runtime.block_on(
            async {
                match self.strategy {
                    Strategy::Polling => self.sync_by_polling().await,
                    Strategy::Streaming => self.sync_by_streaming().await,
                }
            }
            .instrument(span),
        );

        self.shared.set_state(SyncState::Stopped);
    }

    async fn sync_by_polling(&self) {
        tracing::debug!(
            "Polling {} every {:?}",
            self.identity.address,
            self.config.poll_interval
        );
        self.shared.enter_running(SyncState::Polling);

        let mut last_check = Instant::now();
        while !self.control.is_cancelled() {
            if last_check.elapsed() >= self.config.poll_interval {
                StatsCounters::bump(&self.shared.stats.poll_cycles);
                self.run_update_check();
                last_check = Instant::now();
            }

            self.control.sleep(self.config.poll_slice).await;
        }

        tracing::debug!("Polling ended");
    }

    async fn sync_by_streaming(&self) {
        let url = match notification_endpoint(
            &self.identity.address,
            &self.identity.access_token,
            &self.config,
        ) {
            Ok(url) => url,
            Err(e) => {
                tracing::error!("Cannot build notification endpoint: {}", e);
                return;
            }
        };

        let connected = tokio::select! {
            result = self.transport.connect(&url) => result,
            _ = self.control.cancelled() => {
                tracing::debug!("Stopped while connecting to {}", redacted(&url));
                return;
            }
        };

        // No retry and no fallback to polling: the run simply ends
        let mut connection = match connected {
            Ok(connection) => connection,
            Err(e) => {
                tracing::error!("Notification stream unavailable: {}", SyncError::from(e));
                return;
            }
        };

        tracing::debug!("Connected to {}", redacted(&url));
        self.shared.enter_running(SyncState::Streaming);

        while !self.control.is_cancelled() {
            match connection.next_event(self.config.stream_poll_timeout).await {
                Ok(StreamEvent::Frame(payload)) => self.dispatch_frame(&payload),
                Ok(StreamEvent::Idle) => {}
                Ok(StreamEvent::Closed) => {
                    tracing::info!("Notification stream closed by server");
                    break;
                }
                Err(e) => {
                    tracing::warn!("Notification stream failed: {}", e);
                    break;
                }
            }
        }

        connection.close().await;
        tracing::debug!("Notification stream released");
    }

    /// Decode, classify and forward one frame, in that order.
    fn dispatch_frame(&self, payload: &str) {
        let stats = &self.shared.stats;
        StatsCounters::bump(&stats.frames_received);

        let notifications = match decode(payload) {
            Ok(Decoded::Notifications(notifications)) => notifications,
            Ok(Decoded::Legacy) => {
                tracing::debug!("Ignoring old style msg {}", payload);
                StatsCounters::bump(&stats.frames_dropped);
                return;
            }
            Ok(Decoded::Unrecognized) => {
                tracing::debug!("Ignoring unrecognized msg {}", payload);
                StatsCounters::bump(&stats.frames_dropped);
                return;
            }
            Err(e) => {
                tracing::warn!("Invalid msg {}: {}", payload, e);
                StatsCounters::bump(&stats.frames_dropped);
                return;
            }
        };

        let mut changesets = Vec::new();
        for notification in &notifications {
            let Some(kind) = notification.kind() else {
                let container_type = match notification {
                    Notification::Unknown { container_type } => container_type.as_deref(),
                    _ => None,
                };
                tracing::debug!(
                    container_type = container_type.unwrap_or("-"),
                    "Unknown notification {}",
                    payload
                );
                StatsCounters::bump(&stats.frames_dropped);
                continue;
            };

            tracing::trace!(%kind, "Notification decoded");
            StatsCounters::bump(&stats.notifications_decoded);
            changesets.extend(classify(notification));
        }

        for changeset in &changesets {
            tracing::trace!(
                item_id = %changeset.item_id,
                change_type = ?changeset.change_type,
                "Changeset"
            );
            self.host.on_changeset(changeset);
            StatsCounters::bump(&stats.changesets_dispatched);
        }

        if requires_refresh(&changesets) {
            self.run_update_check();
        }
    }

    fn run_update_check(&self) {
        let outcome = apply_pending_updates(
            self.directory.as_ref(),
            self.host.as_ref(),
            &self.identity.address,
        );

        match outcome {
            UpdateOutcome::ClientMissing => {
                tracing::debug!("Client {} no longer registered, skipping", self.identity.address)
            }
            UpdateOutcome::NotPresent => tracing::debug!("Server not present, skipping"),
            UpdateOutcome::UpToDate => tracing::trace!("Library up to date"),
            UpdateOutcome::Updated { refreshed } => {
                StatsCounters::bump(&self.shared.stats.updates_applied);
                tracing::info!(refreshed, "Library sections updated");
            }
        }
    }
}
