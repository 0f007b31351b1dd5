use bson::doc;
use mongodb::Database;
use rocket::futures::StreamExt;
use uuid::Uuid;

use crate::data::filter;
use crate::resp::problem::Problem;

use super::{
    Event, EventRegistration, EventUpdateData, EVENT_COLLECTION_NAME,
    EVENT_REGISTRATION_COLLECTION_NAME,
};

pub mod problem {
    use crate::resp::problem::Problem;
    use rocket::http::Status;

    #[inline]
    pub fn event_full() -> Problem {
        Problem::new_untyped(Status::BadRequest, "Event is full.")
    }

    #[inline]
    pub fn already_registered() -> Problem {
        Problem::new_untyped(Status::BadRequest, "User is already registered for this event.")
    }
}

pub trait EventDbExt {
    async fn get_event(&self, id: Uuid) -> Result<Option<Event>, Problem>;

    /// Lists events, optionally limited to those starting at or after `now`.
    async fn list_events(
        &self,
        upcoming_only: bool,
        include_inactive: bool,
    ) -> Result<Vec<Event>, Problem>;

    async fn create_event(&self, event: Event) -> Result<Event, Problem>;
    async fn update_event(
        &self,
        id: Uuid,
        update: EventUpdateData,
    ) -> Result<Option<Event>, Problem>;
    async fn delete_event(&self, id: Uuid) -> Result<Option<Event>, Problem>;

    /// Registers a user for an event, enforcing capacity and uniqueness.
    /// The capacity check and counter increment are separate operations, so
    /// concurrent registrations can briefly overshoot `max_attendees`.
    async fn register_for_event(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<EventRegistration, Problem>;

    async fn list_registrations(
        &self,
        event: Option<Uuid>,
        user: Option<Uuid>,
    ) -> Result<Vec<EventRegistration>, Problem>;

    async fn count_events(&self) -> Result<u64, Problem>;
    async fn count_registrations(&self, user: Option<Uuid>) -> Result<u64, Problem>;
}

impl EventDbExt for Database {
    async fn get_event(&self, id: Uuid) -> Result<Option<Event>, Problem> {
        self.collection(EVENT_COLLECTION_NAME)
            .find_one(filter::by_id(id), None)
            .await
            .map_err(Problem::from)
    }

    async fn list_events(
        &self,
        upcoming_only: bool,
        include_inactive: bool,
    ) -> Result<Vec<Event>, Problem> {
        let mut filter = bson::Document::new();
        if !include_inactive {
            filter.insert("is_active", true);
        }
        if upcoming_only {
            filter.insert(
                "start_date",
                doc! { "$gte": bson::to_bson(&chrono::Utc::now()).map_err(Problem::from)? },
            );
        }

        let mut cursor = self
            .collection::<Event>(EVENT_COLLECTION_NAME)
            .find(filter, None)
            .await
            .map_err(Problem::from)?;

        let mut events = vec![];
        while let Some(event) = cursor.next().await {
            match event {
                Ok(event) => events.push(event),
                Err(_) => tracing::warn!("Unable to deserialize Event document."),
            }
        }

        Ok(events)
    }

    async fn create_event(&self, event: Event) -> Result<Event, Problem> {
        self.collection::<Event>(EVENT_COLLECTION_NAME)
            .insert_one(&event, None)
            .await
            .map_err(Problem::from)?;

        Ok(event)
    }

    async fn update_event(
        &self,
        id: Uuid,
        update: EventUpdateData,
    ) -> Result<Option<Event>, Problem> {
        let mut set = bson::Document::new();
        if let Some(title) = update.title {
            set.insert("title", title);
        }
        if let Some(description) = update.description {
            set.insert("description", description);
        }
        if let Some(event_type) = update.event_type {
            set.insert("event_type", event_type);
        }
        if let Some(start) = update.start_date {
            set.insert("start_date", bson::to_bson(&start).map_err(Problem::from)?);
        }
        if let Some(end) = update.end_date {
            set.insert("end_date", bson::to_bson(&end).map_err(Problem::from)?);
        }
        if let Some(location) = update.location {
            set.insert("location", location);
        }
        if let Some(max) = update.max_attendees {
            set.insert("max_attendees", i64::from(max));
        }
        if let Some(active) = update.is_active {
            set.insert("is_active", active);
        }

        if set.is_empty() {
            return self.get_event(id).await;
        }

        let options = mongodb::options::FindOneAndUpdateOptions::builder()
            .return_document(mongodb::options::ReturnDocument::After)
            .build();

        self.collection(EVENT_COLLECTION_NAME)
            .find_one_and_update(filter::by_id(id), doc! { "$set": set }, options)
            .await
            .map_err(Problem::from)
    }

    async fn delete_event(&self, id: Uuid) -> Result<Option<Event>, Problem> {
        self.collection(EVENT_COLLECTION_NAME)
            .find_one_and_delete(filter::by_id(id), None)
            .await
            .map_err(Problem::from)
    }

    async fn register_for_event(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<EventRegistration, Problem> {
        let event = self
            .get_event(event_id)
            .await?
            .ok_or_else(|| crate::resp::problem::problems::not_found("Event", event_id))?;

        if event.is_full() {
            return Err(problem::event_full());
        }

        let existing = self
            .collection::<EventRegistration>(EVENT_REGISTRATION_COLLECTION_NAME)
            .find_one(
                doc! {
                    "event_id": event_id.to_string(),
                    "user_id": user_id.to_string(),
                },
                None,
            )
            .await
            .map_err(Problem::from)?;
        if existing.is_some() {
            return Err(problem::already_registered());
        }

        let registration = EventRegistration::new(event_id, user_id);
        self.collection::<EventRegistration>(EVENT_REGISTRATION_COLLECTION_NAME)
            .insert_one(&registration, None)
            .await
            .map_err(Problem::from)?;

        self.collection::<Event>(EVENT_COLLECTION_NAME)
            .update_one(
                filter::by_id(event_id),
                doc! { "$inc": { "registered_count": 1 } },
                None,
            )
            .await
            .map_err(Problem::from)?;

        Ok(registration)
    }

    async fn list_registrations(
        &self,
        event: Option<Uuid>,
        user: Option<Uuid>,
    ) -> Result<Vec<EventRegistration>, Problem> {
        let mut filter = bson::Document::new();
        if let Some(event) = event {
            filter.insert("event_id", event.to_string());
        }
        if let Some(user) = user {
            filter.insert("user_id", user.to_string());
        }

        let mut cursor = self
            .collection::<EventRegistration>(EVENT_REGISTRATION_COLLECTION_NAME)
            .find(filter, None)
            .await
            .map_err(Problem::from)?;

        let mut registrations = vec![];
        while let Some(registration) = cursor.next().await {
            match registration {
                Ok(registration) => registrations.push(registration),
                Err(_) => tracing::warn!("Unable to deserialize EventRegistration document."),
            }
        }

        Ok(registrations)
    }

    async fn count_events(&self) -> Result<u64, Problem> {
        self.collection::<Event>(EVENT_COLLECTION_NAME)
            .count_documents(None, None)
            .await
            .map_err(Problem::from)
    }

    async fn count_registrations(&self, user: Option<Uuid>) -> Result<u64, Problem> {
        let filter = user.map(|u| filter::by_ref("user_id", u));
        self.collection::<EventRegistration>(EVENT_REGISTRATION_COLLECTION_NAME)
            .count_documents(filter, None)
            .await
            .map_err(Problem::from)
    }
}
