//! Wire-level frames for the feed socket.
//!
//! Every frame is a JSON object tagged by `type`. The server opens with a
//! `snapshot`; later frames carry one change plus the fresh unread counts.

use serde::{Deserialize, Serialize};

use crate::domain::{
    EmailFeed, EmailMessage, Error, ErrorCode, FeedAction, FeedUpdate, NotificationFeed,
    NotificationItem, NotificationKey, NotificationSource,
};

/// Request sent by the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientFrame {
    MarkNotificationRead { source: NotificationSource, id: i64 },
    DeleteNotification { source: NotificationSource, id: i64 },
    MarkEmailRead { id: i64 },
    DeleteEmail { id: i64 },
}

impl From<ClientFrame> for FeedAction {
    fn from(frame: ClientFrame) -> Self {
        match frame {
            ClientFrame::MarkNotificationRead { source, id } => {
                Self::MarkNotificationRead(NotificationKey::new(source, id))
            }
            ClientFrame::DeleteNotification { source, id } => {
                Self::DeleteNotification(NotificationKey::new(source, id))
            }
            ClientFrame::MarkEmailRead { id } => Self::MarkEmailRead(id),
            ClientFrame::DeleteEmail { id } => Self::DeleteEmail(id),
        }
    }
}

/// Unread badges shown next to the bell and envelope icons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCounts {
    pub notifications: usize,
    pub emails: usize,
}

/// Both feeds as loaded when the socket opened.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename = "snapshot", rename_all = "camelCase")]
pub struct SnapshotFrame<'a> {
    pub notifications: &'a NotificationFeed,
    pub inbox: &'a EmailFeed,
}

/// A single change to one of the feeds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ChangeFrame {
    NotificationAdded { notification: NotificationItem },
    EmailAdded { email: EmailMessage },
    NotificationRead { source: NotificationSource, id: i64 },
    NotificationDeleted { source: NotificationSource, id: i64 },
    EmailRead { id: i64 },
    EmailDeleted { id: i64 },
}

impl From<FeedUpdate> for ChangeFrame {
    fn from(update: FeedUpdate) -> Self {
        match update {
            FeedUpdate::NotificationAdded(notification) => Self::NotificationAdded { notification },
            FeedUpdate::EmailAdded(email) => Self::EmailAdded { email },
            FeedUpdate::NotificationRead(key) => Self::NotificationRead {
                source: key.source,
                id: key.id,
            },
            FeedUpdate::NotificationDeleted(key) => Self::NotificationDeleted {
                source: key.source,
                id: key.id,
            },
            FeedUpdate::EmailRead(id) => Self::EmailRead { id },
            FeedUpdate::EmailDeleted(id) => Self::EmailDeleted { id },
        }
    }
}

/// Change frame as sent, with the counts after applying it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFrame {
    #[serde(flatten)]
    pub change: ChangeFrame,
    pub unread: UnreadCounts,
}

/// A client action the backend refused. The socket stays open.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename = "error", rename_all = "camelCase")]
pub struct ErrorFrame {
    pub code: ErrorCode,
    pub message: String,
}

impl From<&Error> for ErrorFrame {
    fn from(error: &Error) -> Self {
        Self {
            code: error.code(),
            message: error.message().to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rstest::rstest;
    use serde_json::{Value, json};

    use crate::domain::ReportNotification;

    #[rstest]
    #[case(
        json!({ "type": "markNotificationRead", "source": "patient", "id": 4 }),
        FeedAction::MarkNotificationRead(NotificationKey::new(NotificationSource::Patient, 4))
    )]
    #[case(
        json!({ "type": "deleteNotification", "source": "report", "id": 9 }),
        FeedAction::DeleteNotification(NotificationKey::new(NotificationSource::Report, 9))
    )]
    #[case(json!({ "type": "markEmailRead", "id": 2 }), FeedAction::MarkEmailRead(2))]
    #[case(json!({ "type": "deleteEmail", "id": 3 }), FeedAction::DeleteEmail(3))]
    fn client_frames_map_to_actions(#[case] raw: Value, #[case] expected: FeedAction) {
        let frame: ClientFrame = serde_json::from_value(raw).expect("client frame");
        assert_eq!(FeedAction::from(frame), expected);
    }

    #[rstest]
    #[case(json!({ "type": "markEmailRead" }))]
    #[case(json!({ "type": "archive", "id": 1 }))]
    #[case(json!({ "type": "markNotificationRead", "source": "doctor", "id": 1 }))]
    fn malformed_client_frames_are_rejected(#[case] raw: Value) {
        assert!(serde_json::from_value::<ClientFrame>(raw).is_err());
    }

    #[rstest]
    fn update_frames_carry_the_change_and_counts() {
        let notification = NotificationItem::Report(ReportNotification {
            id: 7,
            message: "New report filed".into(),
            created_at: Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).single().expect("time"),
            is_read: false,
        });
        let frame = UpdateFrame {
            change: FeedUpdate::NotificationAdded(notification).into(),
            unread: UnreadCounts {
                notifications: 1,
                emails: 0,
            },
        };
        let value = serde_json::to_value(&frame).expect("serialise");
        assert_eq!(value["type"], "notificationAdded");
        assert_eq!(value["notification"]["source"], "report");
        assert_eq!(value["notification"]["id"], 7);
        assert_eq!(value["unread"], json!({ "notifications": 1, "emails": 0 }));
    }

    #[rstest]
    fn read_frames_name_the_item() {
        let frame = ChangeFrame::from(FeedUpdate::NotificationRead(NotificationKey::new(
            NotificationSource::Patient,
            5,
        )));
        assert_eq!(
            serde_json::to_value(&frame).expect("serialise"),
            json!({ "type": "notificationRead", "source": "patient", "id": 5 })
        );
    }

    #[rstest]
    fn error_frames_use_the_api_error_code() {
        let frame = ErrorFrame::from(&Error::service_unavailable("backend down"));
        let value = serde_json::to_value(&frame).expect("serialise");
        assert_eq!(value["type"], "error");
        assert_eq!(value["code"], "service_unavailable");
        assert_eq!(value["message"], "backend down");
    }
}
