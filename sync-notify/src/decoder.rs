//! Notification decoder - converts raw stream frames to typed notifications
//!
//! A frame is either a legacy message (dropped), a notification container
//! holding one family, or something unrecognised (dropped). Bad timeline
//! entries are skipped rather than failing the whole frame; play session
//! elements always yield a record.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{DecodeError, Result};
use crate::notification::{
    value_to_string, Notification, NotificationKind, PlaySessionState, TimelineEntry,
    CONTAINER_TYPE, LEGACY_MARKER, NOTIFICATION_CONTAINER,
};

/// Outcome of decoding one well-formed frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// A notification container; may hold zero notifications when every
    /// entry was skipped
    Notifications(Vec<Notification>),
    /// A message in the unsupported legacy format
    Legacy,
    /// Well-formed JSON without a notification container
    Unrecognized,
}

impl Decoded {
    /// Notifications carried by this frame.
    pub fn notifications(&self) -> &[Notification] {
        match self {
            Decoded::Notifications(notifications) => notifications.as_slice(),
            Decoded::Legacy | Decoded::Unrecognized => &[],
        }
    }

    /// Consume the outcome, returning its notifications.
    pub fn into_notifications(self) -> Vec<Notification> {
        match self {
            Decoded::Notifications(notifications) => notifications,
            Decoded::Legacy | Decoded::Unrecognized => Vec::new(),
        }
    }
}

/// Decode one text frame from the notification stream.
///
/// Only invalid JSON or a non-object root is an error; every other shape is
/// reported through [`Decoded`].
pub fn decode(payload: &str) -> Result<Decoded> {
    let root: Value = serde_json::from_str(payload)?;
    let root = root.as_object().ok_or(DecodeError::NotAnObject)?;

    if root.contains_key(LEGACY_MARKER) {
        return Ok(Decoded::Legacy);
    }

    match root.get(NOTIFICATION_CONTAINER) {
        Some(Value::Object(container)) => Ok(Decoded::Notifications(decode_container(container))),
        _ => Ok(Decoded::Unrecognized),
    }
}

/// Decode the first known family present in a container.
fn decode_container(container: &Map<String, Value>) -> Vec<Notification> {
    let found = NotificationKind::PRIORITY
        .into_iter()
        .find_map(|kind| container.get(kind.field_name()).map(|payload| (kind, payload)));

    let Some((kind, payload)) = found else {
        let container_type = container
            .get(CONTAINER_TYPE)
            .map(value_to_string)
            .filter(|t| !t.is_empty());
        return vec![Notification::Unknown { container_type }];
    };

    match kind {
        NotificationKind::TimelineEntry => decode_timeline(payload),
        NotificationKind::PlaySessionState => decode_play_session_states(payload),
        observed => vec![Notification::Observed(observed)],
    }
}

/// Decode a timeline array. Null, empty and non-object entries are skipped.
fn decode_timeline(payload: &Value) -> Vec<Notification> {
    let Some(entries) = payload.as_array() else {
        return Vec::new();
    };

    entries
        .iter()
        .filter(|entry| is_present(entry))
        .filter_map(|entry| match TimelineEntry::deserialize(entry) {
            Ok(timeline) => {
                tracing::debug!(
                    section_id = %timeline.section_id,
                    item_id = %timeline.item_id,
                    media_type = %timeline.media_type,
                    state = %timeline.state,
                    title = %timeline.title,
                    identifier = %timeline.identifier,
                    "TimelineEntry"
                );
                Some(Notification::Timeline(timeline))
            }
            Err(e) => {
                tracing::debug!("Skipping undecodable timeline entry: {}", e);
                None
            }
        })
        .collect()
}

/// Decode a play session state array. Non-array payloads yield nothing.
///
/// Every element yields a record; null, empty or non-object elements give a
/// record with empty fields.
fn decode_play_session_states(payload: &Value) -> Vec<Notification> {
    let Some(items) = payload.as_array() else {
        return Vec::new();
    };

    items
        .iter()
        .map(|item| {
            let state = match item {
                Value::Object(_) => PlaySessionState::deserialize(item).unwrap_or_else(|e| {
                    tracing::debug!("Undecodable play session state, using empty record: {}", e);
                    PlaySessionState::default()
                }),
                _ => PlaySessionState::default(),
            };
            tracing::debug!(
                key = %state.key,
                session_key = %state.session_key,
                state = %state.state,
                "PlaySessionStateNotification"
            );
            Notification::PlaySessionState(state)
        })
        .collect()
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Object(map) => !map.is_empty(),
        _ => true,
    }
}
