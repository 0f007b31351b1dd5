use bson::doc;
use mongodb::Database;
use rocket::futures::StreamExt;
use uuid::Uuid;

use crate::data::filter;
use crate::resp::problem::Problem;

use super::{Lead, LeadStatus, LeadUpdateData, LEAD_COLLECTION_NAME};

pub trait LeadDbExt {
    async fn get_lead(&self, id: Uuid) -> Result<Option<Lead>, Problem>;
    async fn list_leads(&self, status: Option<LeadStatus>) -> Result<Vec<Lead>, Problem>;
    async fn create_lead(&self, lead: Lead) -> Result<Lead, Problem>;
    async fn update_lead(&self, id: Uuid, update: LeadUpdateData)
        -> Result<Option<Lead>, Problem>;
    async fn delete_lead(&self, id: Uuid) -> Result<Option<Lead>, Problem>;
    async fn count_leads(&self, status: Option<LeadStatus>) -> Result<u64, Problem>;
}

impl LeadDbExt for Database {
    async fn get_lead(&self, id: Uuid) -> Result<Option<Lead>, Problem> {
        self.collection(LEAD_COLLECTION_NAME)
            .find_one(filter::by_id(id), None)
            .await
            .map_err(Problem::from)
    }

    async fn list_leads(&self, status: Option<LeadStatus>) -> Result<Vec<Lead>, Problem> {
        let mut filter = bson::Document::new();
        if let Some(status) = status {
            filter.insert("status", bson::to_bson(&status).map_err(Problem::from)?);
        }

        let mut cursor = self
            .collection::<Lead>(LEAD_COLLECTION_NAME)
            .find(filter, None)
            .await
            .map_err(Problem::from)?;

        let mut leads = vec![];
        while let Some(lead) = cursor.next().await {
            match lead {
                Ok(lead) => leads.push(lead),
                Err(_) => tracing::warn!("Unable to deserialize Lead document."),
            }
        }

        Ok(leads)
    }

    async fn create_lead(&self, lead: Lead) -> Result<Lead, Problem> {
        self.collection::<Lead>(LEAD_COLLECTION_NAME)
            .insert_one(&lead, None)
            .await
            .map_err(Problem::from)?;

        Ok(lead)
    }

    async fn update_lead(
        &self,
        id: Uuid,
        update: LeadUpdateData,
    ) -> Result<Option<Lead>, Problem> {
        let mut set = bson::Document::new();
        if let Some(status) = update.status {
            set.insert("status", bson::to_bson(&status).map_err(Problem::from)?);
        }
        if let Some(interest) = update.interest {
            set.insert("interest", interest);
        }
        if let Some(message) = update.message {
            set.insert("message", message);
        }

        if set.is_empty() {
            return self.get_lead(id).await;
        }

        let options = mongodb::options::FindOneAndUpdateOptions::builder()
            .return_document(mongodb::options::ReturnDocument::After)
            .build();

        self.collection(LEAD_COLLECTION_NAME)
            .find_one_and_update(filter::by_id(id), doc! { "$set": set }, options)
            .await
            .map_err(Problem::from)
    }

    async fn delete_lead(&self, id: Uuid) -> Result<Option<Lead>, Problem> {
        self.collection(LEAD_COLLECTION_NAME)
            .find_one_and_delete(filter::by_id(id), None)
            .await
            .map_err(Problem::from)
    }

    async fn count_leads(&self, status: Option<LeadStatus>) -> Result<u64, Problem> {
        let filter = match status {
            Some(status) => {
                Some(doc! { "status": bson::to_bson(&status).map_err(Problem::from)? })
            }
            None => None,
        };
        self.collection::<Lead>(LEAD_COLLECTION_NAME)
            .count_documents(filter, None)
            .await
            .map_err(Problem::from)
    }
}
