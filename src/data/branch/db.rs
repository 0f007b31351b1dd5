use bson::doc;
use mongodb::Database;
use rocket::futures::StreamExt;
use uuid::Uuid;

use crate::data::filter;
use crate::resp::problem::Problem;

use super::{Branch, BranchUpdateData, BRANCH_COLLECTION_NAME};

pub trait BranchDbExt {
    async fn get_branch(&self, id: Uuid) -> Result<Option<Branch>, Problem>;
    async fn list_branches(&self, include_inactive: bool) -> Result<Vec<Branch>, Problem>;
    async fn create_branch(&self, branch: Branch) -> Result<Branch, Problem>;
    async fn update_branch(
        &self,
        id: Uuid,
        update: BranchUpdateData,
    ) -> Result<Option<Branch>, Problem>;
    async fn delete_branch(&self, id: Uuid) -> Result<Option<Branch>, Problem>;
}

impl BranchDbExt for Database {
    async fn get_branch(&self, id: Uuid) -> Result<Option<Branch>, Problem> {
        self.collection(BRANCH_COLLECTION_NAME)
            .find_one(filter::by_id(id), None)
            .await
            .map_err(Problem::from)
    }

    async fn list_branches(&self, include_inactive: bool) -> Result<Vec<Branch>, Problem> {
        let filter = if include_inactive {
            None
        } else {
            Some(doc! { "is_active": true })
        };

        let mut cursor = self
            .collection::<Branch>(BRANCH_COLLECTION_NAME)
            .find(filter, None)
            .await
            .map_err(Problem::from)?;

        let mut branches = vec![];
        while let Some(branch) = cursor.next().await {
            match branch {
                Ok(branch) => branches.push(branch),
                Err(_) => tracing::warn!("Unable to deserialize Branch document."),
            }
        }

        Ok(branches)
    }

    async fn create_branch(&self, branch: Branch) -> Result<Branch, Problem> {
        self.collection::<Branch>(BRANCH_COLLECTION_NAME)
            .insert_one(&branch, None)
            .await
            .map_err(Problem::from)?;

        Ok(branch)
    }

    async fn update_branch(
        &self,
        id: Uuid,
        update: BranchUpdateData,
    ) -> Result<Option<Branch>, Problem> {
        let mut set = bson::Document::new();
        if let Some(name) = update.name {
            set.insert("name", name);
        }
        if let Some(address) = update.address {
            set.insert("address", address);
        }
        if let Some(city) = update.city {
            set.insert("city", city);
        }
        if let Some(phone) = update.phone {
            set.insert("phone", phone);
        }
        if let Some(active) = update.is_active {
            set.insert("is_active", active);
        }

        if set.is_empty() {
            return self.get_branch(id).await;
        }

        let options = mongodb::options::FindOneAndUpdateOptions::builder()
            .return_document(mongodb::options::ReturnDocument::After)
            .build();

        self.collection(BRANCH_COLLECTION_NAME)
            .find_one_and_update(filter::by_id(id), doc! { "$set": set }, options)
            .await
            .map_err(Problem::from)
    }

    async fn delete_branch(&self, id: Uuid) -> Result<Option<Branch>, Problem> {
        self.collection(BRANCH_COLLECTION_NAME)
            .find_one_and_delete(filter::by_id(id), None)
            .await
            .map_err(Problem::from)
    }
}
