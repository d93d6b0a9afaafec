//! Typed notification families delivered by the server's notification stream.
//!
//! Every frame on the stream carries at most one family. Only the timeline and
//! play-session families are decoded into records; the rest are observed by
//! kind so callers can see them in logs and statistics.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Root field marking the pre-container message format, which is not supported.
pub const LEGACY_MARKER: &str = "_elementType";

/// Root field wrapping every current notification.
pub const NOTIFICATION_CONTAINER: &str = "NotificationContainer";

/// Server-supplied discriminator inside the container, used only for logging.
pub const CONTAINER_TYPE: &str = "type";

/// The nine notification families a container may carry.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub enum NotificationKind {
    /// Library item lifecycle updates
    TimelineEntry,
    /// Server activity (scans, refreshes) progress
    Activity,
    /// Playback session state changes
    PlaySessionState,
    /// Server status messages
    Status,
    /// Generic progress messages
    Progress,
    /// Transcoder session updates
    TranscodeSession,
    /// Background processing queue events
    BackgroundProcessingQueue,
    /// Server software update notices
    AutoUpdate,
    /// Account changes
    AccountUpdate,
}

impl NotificationKind {
    /// All kinds in the order a container is inspected. The first present
    /// field wins; later ones are ignored.
    pub const PRIORITY: [NotificationKind; 9] = [
        NotificationKind::TimelineEntry,
        NotificationKind::Activity,
        NotificationKind::PlaySessionState,
        NotificationKind::Status,
        NotificationKind::Progress,
        NotificationKind::TranscodeSession,
        NotificationKind::BackgroundProcessingQueue,
        NotificationKind::AutoUpdate,
        NotificationKind::AccountUpdate,
    ];

    /// Field name of this kind inside the notification container.
    pub fn field_name(self) -> &'static str {
        match self {
            NotificationKind::TimelineEntry => "TimelineEntry",
            NotificationKind::Activity => "ActivityNotification",
            NotificationKind::PlaySessionState => "PlaySessionStateNotification",
            NotificationKind::Status => "StatusNotification",
            NotificationKind::Progress => "ProgressNotification",
            NotificationKind::TranscodeSession => "TranscodeSession",
            NotificationKind::BackgroundProcessingQueue => {
                "BackgroundProcessingQueueEventNotification"
            }
            NotificationKind::AutoUpdate => "AutoUpdateNotification",
            NotificationKind::AccountUpdate => "AccountUpdateNotification",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.field_name())
    }
}

/// One library item lifecycle update.
///
/// `media_type` and `state` are passed through exactly as the server sent
/// them. Their meaning varies between server versions, so no mapping is
/// attempted here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TimelineEntry {
    #[serde(rename = "itemID", default, deserialize_with = "lenient_string")]
    pub item_id: String,
    #[serde(rename = "sectionID", default, deserialize_with = "lenient_string")]
    pub section_id: String,
    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    pub media_type: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub state: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    /// Source that produced the item, e.g. the library plugin identifier
    #[serde(default, deserialize_with = "lenient_string")]
    pub identifier: String,
    #[serde(rename = "updatedAt", default, deserialize_with = "lenient_string")]
    pub updated_at: String,
}

/// One playback session state change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PlaySessionState {
    #[serde(default, deserialize_with = "lenient_string")]
    pub key: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub state: String,
    #[serde(rename = "sessionKey", default, deserialize_with = "lenient_string")]
    pub session_key: String,
}

/// A decoded notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// A library item lifecycle update
    Timeline(TimelineEntry),
    /// A playback session state change
    PlaySessionState(PlaySessionState),
    /// A recognised family that is not decoded further
    Observed(NotificationKind),
    /// A container holding none of the known families
    Unknown {
        /// The container's own `type` field, if it had one
        container_type: Option<String>,
    },
}

impl Notification {
    /// The family this notification belongs to, `None` for unknown containers.
    pub fn kind(&self) -> Option<NotificationKind> {
        match self {
            Notification::Timeline(_) => Some(NotificationKind::TimelineEntry),
            Notification::PlaySessionState(_) => Some(NotificationKind::PlaySessionState),
            Notification::Observed(kind) => Some(*kind),
            Notification::Unknown { .. } => None,
        }
    }
}

/// Accept strings, numbers, booleans and null where the server is
/// inconsistent about quoting. Null becomes the empty string.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_to_string(&Value::deserialize(deserializer)?))
}

pub(crate) fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}
