use bson::doc;
use mongodb::Database;
use rocket::futures::StreamExt;
use uuid::Uuid;

use crate::data::filter;
use crate::resp::problem::Problem;

use super::{normalize_lectures, Course, CourseFilters, CourseUpdateData, COURSE_COLLECTION_NAME};

pub trait CourseDbExt {
    async fn get_course(&self, id: Uuid) -> Result<Option<Course>, Problem>;
    async fn list_courses(&self, filters: &CourseFilters) -> Result<Vec<Course>, Problem>;
    async fn create_course(&self, course: Course) -> Result<Course, Problem>;
    async fn update_course(
        &self,
        id: Uuid,
        update: CourseUpdateData,
    ) -> Result<Option<Course>, Problem>;
    async fn delete_course(&self, id: Uuid) -> Result<Option<Course>, Problem>;

    async fn increment_enrolled_count(&self, id: Uuid) -> Result<(), Problem>;
    async fn count_courses(&self) -> Result<u64, Problem>;
    async fn count_courses_by_instructor(&self, instructor: Uuid) -> Result<u64, Problem>;

    /// IDs of every course taught by an instructor.
    async fn list_course_ids_by_instructor(&self, instructor: Uuid)
        -> Result<Vec<Uuid>, Problem>;
}

impl CourseDbExt for Database {
    async fn get_course(&self, id: Uuid) -> Result<Option<Course>, Problem> {
        self.collection(COURSE_COLLECTION_NAME)
            .find_one(filter::by_id(id), None)
            .await
            .map_err(Problem::from)
    }

    async fn list_courses(&self, filters: &CourseFilters) -> Result<Vec<Course>, Problem> {
        let mut cursor = self
            .collection::<Course>(COURSE_COLLECTION_NAME)
            .find(filters.to_document(), None)
            .await
            .map_err(Problem::from)?;

        let mut courses = vec![];
        while let Some(course) = cursor.next().await {
            match course {
                Ok(course) => courses.push(course),
                Err(_) => tracing::warn!("Unable to deserialize Course document."),
            }
        }

        Ok(courses)
    }

    async fn create_course(&self, course: Course) -> Result<Course, Problem> {
        self.collection::<Course>(COURSE_COLLECTION_NAME)
            .insert_one(&course, None)
            .await
            .map_err(Problem::from)?;

        Ok(course)
    }

    async fn update_course(
        &self,
        id: Uuid,
        update: CourseUpdateData,
    ) -> Result<Option<Course>, Problem> {
        let mut set = bson::Document::new();
        if let Some(title) = update.title {
            set.insert("title", title);
        }
        if let Some(description) = update.description {
            set.insert("description", description);
        }
        if let Some(category) = update.category_id {
            set.insert("category_id", category.to_string());
        }
        if let Some(price) = update.price {
            set.insert("price", price);
        }
        if let Some(duration) = update.duration {
            set.insert("duration", duration);
        }
        if let Some(format) = update.format {
            set.insert("format", bson::to_bson(&format).map_err(Problem::from)?);
        }
        if let Some(featured) = update.is_featured {
            set.insert("is_featured", featured);
        }
        if let Some(active) = update.is_active {
            set.insert("is_active", active);
        }
        if let Some(mut lectures) = update.lectures {
            normalize_lectures(&mut lectures);
            set.insert(
                "lectures",
                bson::to_bson(&lectures).map_err(Problem::from)?,
            );
        }

        if set.is_empty() {
            return self.get_course(id).await;
        }

        let options = mongodb::options::FindOneAndUpdateOptions::builder()
            .return_document(mongodb::options::ReturnDocument::After)
            .build();

        self.collection(COURSE_COLLECTION_NAME)
            .find_one_and_update(filter::by_id(id), doc! { "$set": set }, options)
            .await
            .map_err(Problem::from)
    }

    async fn delete_course(&self, id: Uuid) -> Result<Option<Course>, Problem> {
        self.collection(COURSE_COLLECTION_NAME)
            .find_one_and_delete(filter::by_id(id), None)
            .await
            .map_err(Problem::from)
    }

    async fn increment_enrolled_count(&self, id: Uuid) -> Result<(), Problem> {
        self.collection::<Course>(COURSE_COLLECTION_NAME)
            .update_one(
                filter::by_id(id),
                doc! { "$inc": { "enrolled_count": 1 } },
                None,
            )
            .await
            .map_err(Problem::from)?;

        Ok(())
    }

    async fn count_courses(&self) -> Result<u64, Problem> {
        self.collection::<Course>(COURSE_COLLECTION_NAME)
            .count_documents(None, None)
            .await
            .map_err(Problem::from)
    }

    async fn count_courses_by_instructor(&self, instructor: Uuid) -> Result<u64, Problem> {
        self.collection::<Course>(COURSE_COLLECTION_NAME)
            .count_documents(filter::by_ref("instructor_id", instructor), None)
            .await
            .map_err(Problem::from)
    }

    async fn list_course_ids_by_instructor(
        &self,
        instructor: Uuid,
    ) -> Result<Vec<Uuid>, Problem> {
        let mut cursor = self
            .collection::<Course>(COURSE_COLLECTION_NAME)
            .find(filter::by_ref("instructor_id", instructor), None)
            .await
            .map_err(Problem::from)?;

        let mut ids = vec![];
        while let Some(course) = cursor.next().await {
            match course {
                Ok(course) => ids.push(course.id),
                Err(_) => tracing::warn!("Unable to deserialize Course document."),
            }
        }

        Ok(ids)
    }
}
