use bson::doc;
use mongodb::Database;
use rocket::futures::StreamExt;
use uuid::Uuid;

use crate::data::filter;
use crate::resp::problem::Problem;

use super::{Category, CategoryUpdateData, CATEGORY_COLLECTION_NAME};

pub trait CategoryDbExt {
    async fn get_category(&self, id: Uuid) -> Result<Option<Category>, Problem>;
    async fn list_categories(&self, include_inactive: bool) -> Result<Vec<Category>, Problem>;
    async fn create_category(&self, category: Category) -> Result<Category, Problem>;
    async fn update_category(
        &self,
        id: Uuid,
        update: CategoryUpdateData,
    ) -> Result<Option<Category>, Problem>;
    async fn delete_category(&self, id: Uuid) -> Result<Option<Category>, Problem>;
}

impl CategoryDbExt for Database {
    async fn get_category(&self, id: Uuid) -> Result<Option<Category>, Problem> {
        self.collection(CATEGORY_COLLECTION_NAME)
            .find_one(filter::by_id(id), None)
            .await
            .map_err(Problem::from)
    }

    async fn list_categories(&self, include_inactive: bool) -> Result<Vec<Category>, Problem> {
        let filter = if include_inactive {
            None
        } else {
            Some(doc! { "is_active": true })
        };

        let mut cursor = self
            .collection::<Category>(CATEGORY_COLLECTION_NAME)
            .find(filter, None)
            .await
            .map_err(Problem::from)?;

        let mut categories = vec![];
        while let Some(category) = cursor.next().await {
            match category {
                Ok(category) => categories.push(category),
                Err(_) => tracing::warn!("Unable to deserialize Category document."),
            }
        }

        Ok(categories)
    }

    async fn create_category(&self, category: Category) -> Result<Category, Problem> {
        self.collection::<Category>(CATEGORY_COLLECTION_NAME)
            .insert_one(&category, None)
            .await
            .map_err(Problem::from)?;

        Ok(category)
    }

    async fn update_category(
        &self,
        id: Uuid,
        update: CategoryUpdateData,
    ) -> Result<Option<Category>, Problem> {
        let mut set = bson::Document::new();
        if let Some(name) = update.name {
            set.insert("name", name);
        }
        if let Some(description) = update.description {
            set.insert("description", description);
        }
        if let Some(active) = update.is_active {
            set.insert("is_active", active);
        }

        if set.is_empty() {
            return self.get_category(id).await;
        }

        let options = mongodb::options::FindOneAndUpdateOptions::builder()
            .return_document(mongodb::options::ReturnDocument::After)
            .build();

        self.collection(CATEGORY_COLLECTION_NAME)
            .find_one_and_update(filter::by_id(id), doc! { "$set": set }, options)
            .await
            .map_err(Problem::from)
    }

    async fn delete_category(&self, id: Uuid) -> Result<Option<Category>, Problem> {
        self.collection(CATEGORY_COLLECTION_NAME)
            .find_one_and_delete(filter::by_id(id), None)
            .await
            .map_err(Problem::from)
    }
}
