use bson::doc;
use mongodb::Database;
use rocket::futures::StreamExt;
use uuid::Uuid;

use crate::data::filter;
use crate::resp::problem::Problem;

use super::{
    InquiryStatus, InquiryUpdateData, ServiceUpdateData, StudyAbroadInquiry, StudyAbroadService,
    INQUIRY_COLLECTION_NAME, SERVICE_COLLECTION_NAME,
};

pub trait StudyAbroadDbExt {
    async fn get_service(&self, id: Uuid) -> Result<Option<StudyAbroadService>, Problem>;
    async fn find_service_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<StudyAbroadService>, Problem>;
    async fn list_services(
        &self,
        include_inactive: bool,
    ) -> Result<Vec<StudyAbroadService>, Problem>;
    async fn create_service(
        &self,
        service: StudyAbroadService,
    ) -> Result<StudyAbroadService, Problem>;
    async fn update_service(
        &self,
        id: Uuid,
        update: ServiceUpdateData,
    ) -> Result<Option<StudyAbroadService>, Problem>;
    async fn delete_service(&self, id: Uuid) -> Result<Option<StudyAbroadService>, Problem>;

    async fn get_inquiry(&self, id: Uuid) -> Result<Option<StudyAbroadInquiry>, Problem>;
    async fn list_inquiries(
        &self,
        status: Option<InquiryStatus>,
    ) -> Result<Vec<StudyAbroadInquiry>, Problem>;
    async fn create_inquiry(
        &self,
        inquiry: StudyAbroadInquiry,
    ) -> Result<StudyAbroadInquiry, Problem>;
    async fn update_inquiry(
        &self,
        id: Uuid,
        update: InquiryUpdateData,
    ) -> Result<Option<StudyAbroadInquiry>, Problem>;
    async fn delete_inquiry(&self, id: Uuid) -> Result<Option<StudyAbroadInquiry>, Problem>;
    async fn count_inquiries(&self, status: Option<InquiryStatus>) -> Result<u64, Problem>;
}

pub mod problem {
    use crate::resp::problem::Problem;
    use rocket::http::Status;

    #[inline]
    pub fn slug_taken(slug: &str) -> Problem {
        let mut problem = Problem::new_untyped(
            Status::BadRequest,
            "A service with this slug already exists.",
        );
        problem.insert_str("slug", slug);
        problem
    }
}

impl StudyAbroadDbExt for Database {
    async fn get_service(&self, id: Uuid) -> Result<Option<StudyAbroadService>, Problem> {
        self.collection(SERVICE_COLLECTION_NAME)
            .find_one(filter::by_id(id), None)
            .await
            .map_err(Problem::from)
    }

    async fn find_service_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<StudyAbroadService>, Problem> {
        self.collection(SERVICE_COLLECTION_NAME)
            .find_one(doc! { "slug": slug }, None)
            .await
            .map_err(Problem::from)
    }

    async fn list_services(
        &self,
        include_inactive: bool,
    ) -> Result<Vec<StudyAbroadService>, Problem> {
        let filter = if include_inactive {
            None
        } else {
            Some(doc! { "is_active": true })
        };

        let mut cursor = self
            .collection::<StudyAbroadService>(SERVICE_COLLECTION_NAME)
            .find(filter, None)
            .await
            .map_err(Problem::from)?;

        let mut services = vec![];
        while let Some(service) = cursor.next().await {
            match service {
                Ok(service) => services.push(service),
                Err(_) => tracing::warn!("Unable to deserialize StudyAbroadService document."),
            }
        }

        Ok(services)
    }

    async fn create_service(
        &self,
        service: StudyAbroadService,
    ) -> Result<StudyAbroadService, Problem> {
        if self.find_service_by_slug(&service.slug).await?.is_some() {
            return Err(problem::slug_taken(&service.slug));
        }

        self.collection::<StudyAbroadService>(SERVICE_COLLECTION_NAME)
            .insert_one(&service, None)
            .await
            .map_err(Problem::from)?;

        Ok(service)
    }

    async fn update_service(
        &self,
        id: Uuid,
        update: ServiceUpdateData,
    ) -> Result<Option<StudyAbroadService>, Problem> {
        let mut set = bson::Document::new();
        if let Some(title) = update.title {
            set.insert("title", title);
        }
        if let Some(service_type) = update.service_type {
            set.insert("service_type", service_type);
        }
        if let Some(description) = update.description {
            set.insert("description", description);
        }
        if let Some(features) = update.features {
            set.insert("features", features);
        }
        if let Some(countries) = update.countries {
            set.insert("countries", countries);
        }
        if let Some(steps) = update.process_steps {
            set.insert("process_steps", steps);
        }
        if let Some(benefits) = update.benefits {
            set.insert("benefits", benefits);
        }
        if let Some(active) = update.is_active {
            set.insert("is_active", active);
        }

        if set.is_empty() {
            return self.get_service(id).await;
        }

        let options = mongodb::options::FindOneAndUpdateOptions::builder()
            .return_document(mongodb::options::ReturnDocument::After)
            .build();

        self.collection(SERVICE_COLLECTION_NAME)
            .find_one_and_update(filter::by_id(id), doc! { "$set": set }, options)
            .await
            .map_err(Problem::from)
    }

    async fn delete_service(&self, id: Uuid) -> Result<Option<StudyAbroadService>, Problem> {
        self.collection(SERVICE_COLLECTION_NAME)
            .find_one_and_delete(filter::by_id(id), None)
            .await
            .map_err(Problem::from)
    }

    async fn get_inquiry(&self, id: Uuid) -> Result<Option<StudyAbroadInquiry>, Problem> {
        self.collection(INQUIRY_COLLECTION_NAME)
            .find_one(filter::by_id(id), None)
            .await
            .map_err(Problem::from)
    }

    async fn list_inquiries(
        &self,
        status: Option<InquiryStatus>,
    ) -> Result<Vec<StudyAbroadInquiry>, Problem> {
        let filter = match status {
            Some(status) => {
                Some(doc! { "status": bson::to_bson(&status).map_err(Problem::from)? })
            }
            None => None,
        };

        let mut cursor = self
            .collection::<StudyAbroadInquiry>(INQUIRY_COLLECTION_NAME)
            .find(filter, None)
            .await
            .map_err(Problem::from)?;

        let mut inquiries = vec![];
        while let Some(inquiry) = cursor.next().await {
            match inquiry {
                Ok(inquiry) => inquiries.push(inquiry),
                Err(_) => tracing::warn!("Unable to deserialize StudyAbroadInquiry document."),
            }
        }

        Ok(inquiries)
    }

    async fn create_inquiry(
        &self,
        inquiry: StudyAbroadInquiry,
    ) -> Result<StudyAbroadInquiry, Problem> {
        self.collection::<StudyAbroadInquiry>(INQUIRY_COLLECTION_NAME)
            .insert_one(&inquiry, None)
            .await
            .map_err(Problem::from)?;

        Ok(inquiry)
    }

    async fn update_inquiry(
        &self,
        id: Uuid,
        update: InquiryUpdateData,
    ) -> Result<Option<StudyAbroadInquiry>, Problem> {
        let mut set = bson::Document::new();
        if let Some(status) = update.status {
            set.insert("status", bson::to_bson(&status).map_err(Problem::from)?);
        }
        if let Some(priority) = update.priority {
            set.insert("priority", bson::to_bson(&priority).map_err(Problem::from)?);
        }
        if let Some(notes) = update.notes {
            set.insert("notes", notes);
        }

        if set.is_empty() {
            return self.get_inquiry(id).await;
        }
        set.insert(
            "updated",
            bson::to_bson(&chrono::Utc::now()).map_err(Problem::from)?,
        );

        let options = mongodb::options::FindOneAndUpdateOptions::builder()
            .return_document(mongodb::options::ReturnDocument::After)
            .build();

        self.collection(INQUIRY_COLLECTION_NAME)
            .find_one_and_update(filter::by_id(id), doc! { "$set": set }, options)
            .await
            .map_err(Problem::from)
    }

    async fn delete_inquiry(&self, id: Uuid) -> Result<Option<StudyAbroadInquiry>, Problem> {
        self.collection(INQUIRY_COLLECTION_NAME)
            .find_one_and_delete(filter::by_id(id), None)
            .await
            .map_err(Problem::from)
    }

    async fn count_inquiries(&self, status: Option<InquiryStatus>) -> Result<u64, Problem> {
        let filter = match status {
            Some(status) => {
                Some(doc! { "status": bson::to_bson(&status).map_err(Problem::from)? })
            }
            None => None,
        };
        self.collection::<StudyAbroadInquiry>(INQUIRY_COLLECTION_NAME)
            .count_documents(filter, None)
            .await
            .map_err(Problem::from)
    }
}
