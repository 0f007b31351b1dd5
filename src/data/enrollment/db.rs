use bson::doc;
use mongodb::Database;
use rocket::futures::StreamExt;
use uuid::Uuid;

use crate::data::filter;
use crate::resp::problem::Problem;

use super::{Enrollment, EnrollmentUpdateData, ENROLLMENT_COLLECTION_NAME};

pub mod problem {
    use crate::resp::problem::Problem;
    use rocket::http::Status;

    #[inline]
    pub fn already_enrolled() -> Problem {
        Problem::new_untyped(
            Status::BadRequest,
            "User is already enrolled in this course.",
        )
    }
}

pub trait EnrollmentDbExt {
    async fn get_enrollment(&self, id: Uuid) -> Result<Option<Enrollment>, Problem>;

    /// The active enrollment for a (user, course) pair, if one exists.
    async fn find_active_enrollment(
        &self,
        user: Uuid,
        course: Uuid,
    ) -> Result<Option<Enrollment>, Problem>;

    async fn list_enrollments(
        &self,
        user: Option<Uuid>,
        course: Option<Uuid>,
    ) -> Result<Vec<Enrollment>, Problem>;

    /// Inserts a new enrollment after re-checking the uniqueness invariant.
    /// The check and insert are separate operations, so concurrent duplicate
    /// requests can still race; the losing request leaves a duplicate row.
    async fn create_enrollment(&self, enrollment: Enrollment) -> Result<Enrollment, Problem>;

    async fn update_enrollment(
        &self,
        id: Uuid,
        update: EnrollmentUpdateData,
    ) -> Result<Option<Enrollment>, Problem>;

    async fn count_enrollments(&self, user: Option<Uuid>) -> Result<u64, Problem>;

    /// Enrollments across a set of courses, for instructor dashboards.
    async fn count_enrollments_in_courses(&self, courses: &[Uuid]) -> Result<u64, Problem>;
}

impl EnrollmentDbExt for Database {
    async fn get_enrollment(&self, id: Uuid) -> Result<Option<Enrollment>, Problem> {
        self.collection(ENROLLMENT_COLLECTION_NAME)
            .find_one(filter::by_id(id), None)
            .await
            .map_err(Problem::from)
    }

    async fn find_active_enrollment(
        &self,
        user: Uuid,
        course: Uuid,
    ) -> Result<Option<Enrollment>, Problem> {
        self.collection(ENROLLMENT_COLLECTION_NAME)
            .find_one(
                doc! {
                    "user_id": user.to_string(),
                    "course_id": course.to_string(),
                    "is_active": true,
                },
                None,
            )
            .await
            .map_err(Problem::from)
    }

    async fn list_enrollments(
        &self,
        user: Option<Uuid>,
        course: Option<Uuid>,
    ) -> Result<Vec<Enrollment>, Problem> {
        let mut filter = bson::Document::new();
        if let Some(user) = user {
            filter.insert("user_id", user.to_string());
        }
        if let Some(course) = course {
            filter.insert("course_id", course.to_string());
        }

        let mut cursor = self
            .collection::<Enrollment>(ENROLLMENT_COLLECTION_NAME)
            .find(filter, None)
            .await
            .map_err(Problem::from)?;

        let mut enrollments = vec![];
        while let Some(enrollment) = cursor.next().await {
            match enrollment {
                Ok(enrollment) => enrollments.push(enrollment),
                Err(_) => tracing::warn!("Unable to deserialize Enrollment document."),
            }
        }

        Ok(enrollments)
    }

    async fn create_enrollment(&self, enrollment: Enrollment) -> Result<Enrollment, Problem> {
        if self
            .find_active_enrollment(enrollment.user_id, enrollment.course_id)
            .await?
            .is_some()
        {
            return Err(problem::already_enrolled());
        }

        self.collection::<Enrollment>(ENROLLMENT_COLLECTION_NAME)
            .insert_one(&enrollment, None)
            .await
            .map_err(Problem::from)?;

        Ok(enrollment)
    }

    async fn update_enrollment(
        &self,
        id: Uuid,
        update: EnrollmentUpdateData,
    ) -> Result<Option<Enrollment>, Problem> {
        let mut set = bson::Document::new();
        if let Some(progress) = update.progress {
            set.insert("progress", i32::from(progress));
        }
        if let Some(active) = update.is_active {
            set.insert("is_active", active);
        }
        if update.completes() {
            set.insert(
                "completed_at",
                bson::to_bson(&chrono::Utc::now()).map_err(Problem::from)?,
            );
        }

        if set.is_empty() {
            return self.get_enrollment(id).await;
        }

        let options = mongodb::options::FindOneAndUpdateOptions::builder()
            .return_document(mongodb::options::ReturnDocument::After)
            .build();

        self.collection(ENROLLMENT_COLLECTION_NAME)
            .find_one_and_update(filter::by_id(id), doc! { "$set": set }, options)
            .await
            .map_err(Problem::from)
    }

    async fn count_enrollments(&self, user: Option<Uuid>) -> Result<u64, Problem> {
        let filter = user.map(|u| filter::by_ref("user_id", u));
        self.collection::<Enrollment>(ENROLLMENT_COLLECTION_NAME)
            .count_documents(filter, None)
            .await
            .map_err(Problem::from)
    }

    async fn count_enrollments_in_courses(&self, courses: &[Uuid]) -> Result<u64, Problem> {
        if courses.is_empty() {
            return Ok(0);
        }

        let ids: Vec<String> = courses.iter().map(Uuid::to_string).collect();
        self.collection::<Enrollment>(ENROLLMENT_COLLECTION_NAME)
            .count_documents(doc! { "course_id": { "$in": ids } }, None)
            .await
            .map_err(Problem::from)
    }
}
