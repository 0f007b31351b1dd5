use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub mod db;

use crate::resp::problem::{problems, Problem};

pub static EVENT_COLLECTION_NAME: &str = "events";
pub static EVENT_REGISTRATION_COLLECTION_NAME: &str = "event_registrations";

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Event {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub event_type: Option<String>,
    pub start_date: DateTime<Utc>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub branch_id: Option<Uuid>,
    pub max_attendees: u32,
    #[serde(default)]
    pub registered_count: u32,
    pub is_active: bool,
    pub created: DateTime<Utc>,
}

impl Event {
    pub fn is_full(&self) -> bool {
        self.registered_count >= self.max_attendees
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventRegistration {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub registered_at: DateTime<Utc>,
}

impl EventRegistration {
    pub fn new(event_id: Uuid, user_id: Uuid) -> EventRegistration {
        EventRegistration {
            id: Uuid::new_v4(),
            event_id,
            user_id,
            registered_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct EventCreateData {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub event_type: Option<String>,
    pub start_date: DateTime<Utc>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub branch_id: Option<Uuid>,
    pub max_attendees: u32,
}

impl EventCreateData {
    pub fn validate(&self) -> Result<(), Problem> {
        if self.title.trim().is_empty() {
            return Err(problems::validation("title", "Event title can't be empty."));
        }
        if self.max_attendees == 0 {
            return Err(problems::validation(
                "max_attendees",
                "Event capacity must be at least 1.",
            ));
        }
        if let Some(end) = self.end_date {
            if end < self.start_date {
                return Err(problems::validation(
                    "end_date",
                    "Event can't end before it starts.",
                ));
            }
        }
        Ok(())
    }

    pub fn into_event(self) -> Event {
        Event {
            id: Uuid::new_v4(),
            title: self.title,
            description: self.description,
            event_type: self.event_type,
            start_date: self.start_date,
            end_date: self.end_date,
            location: self.location,
            branch_id: self.branch_id,
            max_attendees: self.max_attendees,
            registered_count: 0,
            is_active: true,
            created: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct EventUpdateData {
    pub title: Option<String>,
    pub description: Option<String>,
    pub event_type: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub max_attendees: Option<u32>,
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn create_data(max: u32) -> EventCreateData {
        EventCreateData {
            title: "Study Abroad Expo".to_string(),
            description: String::new(),
            event_type: Some("expo".to_string()),
            start_date: Utc::now() + Duration::days(7),
            end_date: None,
            location: Some("Main Hall".to_string()),
            branch_id: None,
            max_attendees: max,
        }
    }

    #[test]
    fn capacity_tracking() {
        let mut event = create_data(2).into_event();
        assert!(!event.is_full());

        event.registered_count = 2;
        assert!(event.is_full());
    }

    #[test]
    fn zero_capacity_rejected() {
        assert!(create_data(0).validate().is_err());
        assert!(create_data(10).validate().is_ok());
    }

    #[test]
    fn end_before_start_rejected() {
        let mut data = create_data(10);
        data.end_date = Some(data.start_date - Duration::hours(1));
        assert!(data.validate().is_err());
    }
}
