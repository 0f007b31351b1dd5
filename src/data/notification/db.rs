use bson::doc;
use mongodb::Database;
use rocket::futures::StreamExt;
use uuid::Uuid;

use crate::data::filter;
use crate::resp::problem::Problem;

use super::{
    DeliveryStatus, Notification, NotificationStatusUpdate, NOTIFICATION_COLLECTION_NAME,
};

pub trait NotificationDbExt {
    async fn get_notification(&self, id: Uuid) -> Result<Option<Notification>, Problem>;
    async fn list_notifications(
        &self,
        user: Option<Uuid>,
        unread_only: bool,
    ) -> Result<Vec<Notification>, Problem>;
    async fn create_notification(
        &self,
        notification: Notification,
    ) -> Result<Notification, Problem>;

    /// Records a delivery attempt outcome. Successes stamp `sent_at` and
    /// clear the last error; failures bump `attempts` and keep the error
    /// message; re-queueing to pending touches only the status.
    async fn update_delivery_status(
        &self,
        id: Uuid,
        update: NotificationStatusUpdate,
    ) -> Result<Option<Notification>, Problem>;

    async fn mark_read(&self, id: Uuid) -> Result<Option<Notification>, Problem>;
    async fn delete_notification(&self, id: Uuid) -> Result<Option<Notification>, Problem>;
}

/// Update document for a delivery outcome. Only failures increment the
/// attempt counter.
fn delivery_change(update: NotificationStatusUpdate) -> Result<bson::Document, Problem> {
    let mut set = bson::Document::new();
    set.insert(
        "status",
        bson::to_bson(&update.status).map_err(Problem::from)?,
    );

    let mut change = bson::Document::new();
    match update.status {
        DeliveryStatus::Sent => {
            set.insert(
                "sent_at",
                bson::to_bson(&chrono::Utc::now()).map_err(Problem::from)?,
            );
            set.insert("last_error", bson::Bson::Null);
        }
        DeliveryStatus::Failed => {
            if let Some(error) = update.error {
                set.insert("last_error", error);
            }
            change.insert("$inc", doc! { "attempts": 1 });
        }
        DeliveryStatus::Pending => {}
    }
    change.insert("$set", set);

    Ok(change)
}

impl NotificationDbExt for Database {
    async fn get_notification(&self, id: Uuid) -> Result<Option<Notification>, Problem> {
        self.collection(NOTIFICATION_COLLECTION_NAME)
            .find_one(filter::by_id(id), None)
            .await
            .map_err(Problem::from)
    }

    async fn list_notifications(
        &self,
        user: Option<Uuid>,
        unread_only: bool,
    ) -> Result<Vec<Notification>, Problem> {
        let mut filter = bson::Document::new();
        if let Some(user) = user {
            filter.insert("user_id", user.to_string());
        }
        if unread_only {
            filter.insert("is_read", false);
        }

        let mut cursor = self
            .collection::<Notification>(NOTIFICATION_COLLECTION_NAME)
            .find(filter, None)
            .await
            .map_err(Problem::from)?;

        let mut notifications = vec![];
        while let Some(notification) = cursor.next().await {
            match notification {
                Ok(notification) => notifications.push(notification),
                Err(_) => tracing::warn!("Unable to deserialize Notification document."),
            }
        }

        Ok(notifications)
    }

    async fn create_notification(
        &self,
        notification: Notification,
    ) -> Result<Notification, Problem> {
        self.collection::<Notification>(NOTIFICATION_COLLECTION_NAME)
            .insert_one(&notification, None)
            .await
            .map_err(Problem::from)?;

        Ok(notification)
    }

    async fn update_delivery_status(
        &self,
        id: Uuid,
        update: NotificationStatusUpdate,
    ) -> Result<Option<Notification>, Problem> {
        let options = mongodb::options::FindOneAndUpdateOptions::builder()
            .return_document(mongodb::options::ReturnDocument::After)
            .build();

        self.collection(NOTIFICATION_COLLECTION_NAME)
            .find_one_and_update(filter::by_id(id), delivery_change(update)?, options)
            .await
            .map_err(Problem::from)
    }

    async fn mark_read(&self, id: Uuid) -> Result<Option<Notification>, Problem> {
        let options = mongodb::options::FindOneAndUpdateOptions::builder()
            .return_document(mongodb::options::ReturnDocument::After)
            .build();

        self.collection(NOTIFICATION_COLLECTION_NAME)
            .find_one_and_update(
                filter::by_id(id),
                doc! { "$set": { "is_read": true } },
                options,
            )
            .await
            .map_err(Problem::from)
    }

    async fn delete_notification(&self, id: Uuid) -> Result<Option<Notification>, Problem> {
        self.collection(NOTIFICATION_COLLECTION_NAME)
            .find_one_and_delete(filter::by_id(id), None)
            .await
            .map_err(Problem::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_outcome_increments_attempts() {
        let change = delivery_change(NotificationStatusUpdate {
            status: DeliveryStatus::Failed,
            error: Some("gateway timeout".to_string()),
        })
        .unwrap();

        assert_eq!(change.get_document("$inc").unwrap().get_i32("attempts"), Ok(1));
        let set = change.get_document("$set").unwrap();
        assert_eq!(set.get_str("last_error"), Ok("gateway timeout"));
    }

    #[test]
    fn sent_outcome_stamps_sent_at_without_counting() {
        let change = delivery_change(NotificationStatusUpdate {
            status: DeliveryStatus::Sent,
            error: None,
        })
        .unwrap();

        assert!(change.get_document("$inc").is_err());
        let set = change.get_document("$set").unwrap();
        assert!(set.contains_key("sent_at"));
        assert_eq!(set.get("last_error"), Some(&bson::Bson::Null));
    }

    #[test]
    fn requeue_touches_only_status() {
        let change = delivery_change(NotificationStatusUpdate {
            status: DeliveryStatus::Pending,
            error: None,
        })
        .unwrap();

        assert!(change.get_document("$inc").is_err());
        let set = change.get_document("$set").unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.contains_key("status"));
    }
}
