//! # sync-notify
//!
//! Decoding and classification for a media server's real-time notification
//! stream.
//!
//! ```text
//! text frame → decode() → Notification → classify() → ChangesetEvent
//! ```
//!
//! Decoding never panics. Invalid JSON surfaces as [`DecodeError`]; legacy and
//! unrecognised frames surface as [`Decoded::Legacy`] and
//! [`Decoded::Unrecognized`] so the caller decides how loudly to log them.

mod classifier;
mod decoder;
mod error;
mod notification;

pub use classifier::{classify, requires_refresh, ChangesetEvent, ChangesetType};
pub use decoder::{decode, Decoded};
pub use error::{DecodeError, Result};
pub use notification::{
    Notification, NotificationKind, PlaySessionState, TimelineEntry, LEGACY_MARKER,
    NOTIFICATION_CONTAINER,
};
