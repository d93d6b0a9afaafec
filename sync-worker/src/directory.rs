//! Collaborator seams between a sync session and its host application.
//!
//! The session never owns a client. It looks the client up by address each
//! time it needs one, because the host may unregister it at any moment.

use std::sync::Arc;

use sync_notify::ChangesetEvent;

/// A remote server client registered with the host.
pub trait MediaClient: Send + Sync {
    /// Whether the server is currently reachable
    fn presence(&self) -> bool;

    /// Lightweight scan of library sections to detect pending changes
    fn scan_sections(&self);

    /// Whether the last scan found changes that need applying
    fn needs_update(&self) -> bool;

    /// Full update of library sections
    fn update_sections(&self);
}

/// Shared handle to a registered client.
pub type ClientHandle = Arc<dyn MediaClient>;

/// Registry of clients, keyed by server address.
pub trait ClientDirectory: Send + Sync {
    /// Resolve a client by address. `None` when it is no longer registered.
    fn find(&self, address: &str) -> Option<ClientHandle>;
}

/// Host application hooks invoked by the sync worker.
pub trait SyncHost: Send + Sync {
    /// Whether media is currently playing; UI refreshes are suppressed while it is
    fn playback_active(&self) -> bool;

    /// Drop any locally cached directory listings
    fn invalidate_directory_cache(&self);

    /// Ask the UI to refresh everything it shows
    fn refresh_all(&self);

    /// A classified change for one library item, in arrival order
    fn on_changeset(&self, _event: &ChangesetEvent) {}
}
