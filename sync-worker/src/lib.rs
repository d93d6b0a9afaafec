//! # sync-worker
//!
//! Keeps a host application's view of a remote media server current.
//!
//! Each [`SyncSession`] owns one background thread for one client. Locally
//! managed clients stream push notifications over a WebSocket; discovered
//! clients are polled on a long interval. Both paths end in the same update
//! step: re-resolve the client through the [`ClientDirectory`], apply pending
//! section updates, invalidate the host's directory cache and, unless media
//! is playing, ask the UI to refresh.
//!
//! ## Architecture
//!
//! ```text
//! start() → worker thread ─┬─ Polling:   timer → ClientDirectory → MediaClient → SyncHost
//!                          └─ Streaming: StreamTransport → decode → classify → SyncHost
//! stop()  → cancel + join
//! ```
//!
//! ## Features
//!
//! - `tls` (off by default): enables `wss://` notification streams through
//!   native-tls. Without it, clients with an `https` address fail to connect
//!   and the streaming run ends with a logged error.
//!
//! Errors never reach the caller of `start()`/`stop()`; they are logged
//! through `tracing` and end the current run.

mod config;
mod directory;
mod endpoint;
mod error;
pub mod logging;
mod session;
mod transport;
mod worker;

pub use config::SyncConfig;
pub use directory::{ClientDirectory, ClientHandle, MediaClient, SyncHost};
pub use endpoint::{notification_endpoint, stream_scheme};
pub use error::{Result, SyncError, TransportError};
pub use session::{ClientIdentity, Strategy, SyncSession, SyncState, SyncStats};
pub use transport::{StreamConnection, StreamEvent, StreamTransport, WebSocketTransport};

// Re-export the notification types hosts receive through `SyncHost`
pub use sync_notify::{ChangesetEvent, ChangesetType};
