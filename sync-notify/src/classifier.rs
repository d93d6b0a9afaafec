//! Change classification for decoded notifications.

use crate::notification::Notification;

/// The kind of change a notification implies for one library item.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Default)]
pub enum ChangesetType {
    /// The item was touched but no concrete intent is known
    #[default]
    None,
    Added,
    Changed,
    Removed,
}

/// A classified change intent for one library item.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ChangesetEvent {
    pub item_id: String,
    pub change_type: ChangesetType,
}

impl ChangesetEvent {
    pub fn new(item_id: impl Into<String>, change_type: ChangesetType) -> Self {
        Self {
            item_id: item_id.into(),
            change_type,
        }
    }
}

/// Classify a notification into zero or more changesets.
///
/// Only timeline entries name library items. Their state codes are not
/// mapped, so every timeline changeset is [`ChangesetType::None`].
pub fn classify(notification: &Notification) -> Vec<ChangesetEvent> {
    match notification {
        Notification::Timeline(entry) if !entry.item_id.is_empty() => {
            vec![ChangesetEvent::new(entry.item_id.clone(), ChangesetType::None)]
        }
        _ => Vec::new(),
    }
}

/// Whether the changesets warrant a full metadata refresh.
pub fn requires_refresh(events: &[ChangesetEvent]) -> bool {
    events
        .iter()
        .any(|event| event.change_type != ChangesetType::None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::{NotificationKind, PlaySessionState, TimelineEntry};

    fn timeline(item_id: &str, state: &str) -> Notification {
        Notification::Timeline(TimelineEntry {
            item_id: item_id.to_string(),
            state: state.to_string(),
            ..Default::default()
        })
    }

    #[test]
    fn test_timeline_yields_unmapped_changeset() {
        for state in ["0", "1", "2", "3", "4", "5", "6", "9"] {
            assert_eq!(
                classify(&timeline("42", state)),
                vec![ChangesetEvent::new("42", ChangesetType::None)]
            );
        }
    }

    #[test]
    fn test_timeline_without_item_id_yields_nothing() {
        assert!(classify(&timeline("", "5")).is_empty());
    }

    #[test]
    fn test_other_families_yield_nothing() {
        let notifications = [
            Notification::PlaySessionState(PlaySessionState::default()),
            Notification::Observed(NotificationKind::Activity),
            Notification::Observed(NotificationKind::Status),
            Notification::Unknown {
                container_type: None,
            },
        ];

        for notification in &notifications {
            assert!(classify(notification).is_empty(), "{:?}", notification);
        }
    }

    #[test]
    fn test_requires_refresh() {
        assert!(!requires_refresh(&[]));
        assert!(!requires_refresh(&[ChangesetEvent::new("1", ChangesetType::None)]));
        assert!(requires_refresh(&[
            ChangesetEvent::new("1", ChangesetType::None),
            ChangesetEvent::new("2", ChangesetType::Removed),
        ]));
    }
}
