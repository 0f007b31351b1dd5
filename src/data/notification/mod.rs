use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub mod db;

use crate::resp::problem::{problems, Problem};

pub static NOTIFICATION_COLLECTION_NAME: &str = "notifications";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    #[default]
    InApp,
    Sms,
    Email,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    #[default]
    Pending,
    Sent,
    Failed,
}

/// A message addressed to a user, delivered in-app or through an external
/// channel. External delivery is recorded here but performed elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Notification {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub body: String,
    pub channel: NotificationChannel,
    pub status: DeliveryStatus,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default)]
    pub last_error: Option<String>,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub sent_at: Option<DateTime<Utc>>,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NotificationCreateData {
    pub user_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub channel: Option<NotificationChannel>,
}

impl NotificationCreateData {
    pub fn validate(&self) -> Result<(), Problem> {
        if self.title.trim().is_empty() {
            return Err(problems::validation(
                "title",
                "Notification title can't be empty.",
            ));
        }
        Ok(())
    }

    /// Every notification starts pending; delivery is recorded separately.
    pub fn into_notification(self) -> Notification {
        Notification {
            id: Uuid::new_v4(),
            user_id: self.user_id,
            title: self.title,
            body: self.body,
            channel: self.channel.unwrap_or_default(),
            status: DeliveryStatus::Pending,
            attempts: 0,
            last_error: None,
            is_read: false,
            sent_at: None,
            created: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct NotificationStatusUpdate {
    pub status: DeliveryStatus,
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_data(channel: Option<NotificationChannel>) -> NotificationCreateData {
        NotificationCreateData {
            user_id: Uuid::new_v4(),
            title: "Class rescheduled".to_string(),
            body: "Your IELTS class moved to 10:00.".to_string(),
            channel,
        }
    }

    #[test]
    fn channel_defaults_to_in_app() {
        let n = create_data(None).into_notification();
        assert_eq!(n.channel, NotificationChannel::InApp);
        assert!(!n.is_read);
    }

    #[test]
    fn notifications_start_pending() {
        let n = create_data(Some(NotificationChannel::Sms)).into_notification();
        assert_eq!(n.status, DeliveryStatus::Pending);
        assert!(n.sent_at.is_none());
        assert_eq!(n.attempts, 0);
    }

    #[test]
    fn empty_title_rejected() {
        let mut data = create_data(None);
        data.title = "  ".to_string();
        assert!(data.validate().is_err());
    }
}
