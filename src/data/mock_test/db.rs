use bson::doc;
use mongodb::Database;
use rocket::futures::StreamExt;
use uuid::Uuid;

use crate::data::filter;
use crate::resp::problem::Problem;

use super::{
    AttemptUpdateData, MockTest, MockTestAttempt, MockTestUpdateData, ATTEMPT_COLLECTION_NAME,
    MOCK_TEST_COLLECTION_NAME,
};

pub trait MockTestDbExt {
    async fn get_mock_test(&self, id: Uuid) -> Result<Option<MockTest>, Problem>;
    async fn list_mock_tests(&self, include_inactive: bool) -> Result<Vec<MockTest>, Problem>;
    async fn create_mock_test(&self, test: MockTest) -> Result<MockTest, Problem>;
    async fn update_mock_test(
        &self,
        id: Uuid,
        update: MockTestUpdateData,
    ) -> Result<Option<MockTest>, Problem>;
    async fn delete_mock_test(&self, id: Uuid) -> Result<Option<MockTest>, Problem>;

    async fn get_attempt(&self, id: Uuid) -> Result<Option<MockTestAttempt>, Problem>;
    async fn list_attempts(
        &self,
        user: Option<Uuid>,
        test: Option<Uuid>,
    ) -> Result<Vec<MockTestAttempt>, Problem>;
    async fn create_attempt(&self, attempt: MockTestAttempt)
        -> Result<MockTestAttempt, Problem>;

    /// Applies an attempt update. Completion always stamps `completed_at` and
    /// stores the score exactly as provided.
    async fn update_attempt(
        &self,
        id: Uuid,
        update: AttemptUpdateData,
    ) -> Result<Option<MockTestAttempt>, Problem>;

    async fn count_attempts(&self, user: Option<Uuid>) -> Result<u64, Problem>;
}

impl MockTestDbExt for Database {
    async fn get_mock_test(&self, id: Uuid) -> Result<Option<MockTest>, Problem> {
        self.collection(MOCK_TEST_COLLECTION_NAME)
            .find_one(filter::by_id(id), None)
            .await
            .map_err(Problem::from)
    }

    async fn list_mock_tests(&self, include_inactive: bool) -> Result<Vec<MockTest>, Problem> {
        let filter = if include_inactive {
            None
        } else {
            Some(doc! { "is_active": true })
        };

        let mut cursor = self
            .collection::<MockTest>(MOCK_TEST_COLLECTION_NAME)
            .find(filter, None)
            .await
            .map_err(Problem::from)?;

        let mut tests = vec![];
        while let Some(test) = cursor.next().await {
            match test {
                Ok(test) => tests.push(test),
                Err(_) => tracing::warn!("Unable to deserialize MockTest document."),
            }
        }

        Ok(tests)
    }

    async fn create_mock_test(&self, test: MockTest) -> Result<MockTest, Problem> {
        self.collection::<MockTest>(MOCK_TEST_COLLECTION_NAME)
            .insert_one(&test, None)
            .await
            .map_err(Problem::from)?;

        Ok(test)
    }

    async fn update_mock_test(
        &self,
        id: Uuid,
        update: MockTestUpdateData,
    ) -> Result<Option<MockTest>, Problem> {
        let mut set = bson::Document::new();
        if let Some(title) = update.title {
            set.insert("title", title);
        }
        if let Some(description) = update.description {
            set.insert("description", description);
        }
        if let Some(duration) = update.duration_minutes {
            set.insert("duration_minutes", i64::from(duration));
        }
        if let Some(active) = update.is_active {
            set.insert("is_active", active);
        }

        if set.is_empty() {
            return self.get_mock_test(id).await;
        }

        let options = mongodb::options::FindOneAndUpdateOptions::builder()
            .return_document(mongodb::options::ReturnDocument::After)
            .build();

        self.collection(MOCK_TEST_COLLECTION_NAME)
            .find_one_and_update(filter::by_id(id), doc! { "$set": set }, options)
            .await
            .map_err(Problem::from)
    }

    async fn delete_mock_test(&self, id: Uuid) -> Result<Option<MockTest>, Problem> {
        self.collection(MOCK_TEST_COLLECTION_NAME)
            .find_one_and_delete(filter::by_id(id), None)
            .await
            .map_err(Problem::from)
    }

    async fn get_attempt(&self, id: Uuid) -> Result<Option<MockTestAttempt>, Problem> {
        self.collection(ATTEMPT_COLLECTION_NAME)
            .find_one(filter::by_id(id), None)
            .await
            .map_err(Problem::from)
    }

    async fn list_attempts(
        &self,
        user: Option<Uuid>,
        test: Option<Uuid>,
    ) -> Result<Vec<MockTestAttempt>, Problem> {
        let mut filter = bson::Document::new();
        if let Some(user) = user {
            filter.insert("user_id", user.to_string());
        }
        if let Some(test) = test {
            filter.insert("test_id", test.to_string());
        }

        let mut cursor = self
            .collection::<MockTestAttempt>(ATTEMPT_COLLECTION_NAME)
            .find(filter, None)
            .await
            .map_err(Problem::from)?;

        let mut attempts = vec![];
        while let Some(attempt) = cursor.next().await {
            match attempt {
                Ok(attempt) => attempts.push(attempt),
                Err(_) => tracing::warn!("Unable to deserialize MockTestAttempt document."),
            }
        }

        Ok(attempts)
    }

    async fn create_attempt(
        &self,
        attempt: MockTestAttempt,
    ) -> Result<MockTestAttempt, Problem> {
        self.collection::<MockTestAttempt>(ATTEMPT_COLLECTION_NAME)
            .insert_one(&attempt, None)
            .await
            .map_err(Problem::from)?;

        Ok(attempt)
    }

    async fn update_attempt(
        &self,
        id: Uuid,
        update: AttemptUpdateData,
    ) -> Result<Option<MockTestAttempt>, Problem> {
        let mut set = bson::Document::new();
        if let Some(answers) = update.answers {
            set.insert(
                "answers",
                bson::to_bson(&answers).map_err(Problem::from)?,
            );
        }
        if let Some(score) = update.score {
            set.insert("score", i64::from(score));
        }
        if let Some(time_spent) = update.time_spent_seconds {
            set.insert("time_spent_seconds", i64::from(time_spent));
        }
        if let Some(completed) = update.is_completed {
            set.insert("is_completed", completed);
            if completed {
                set.insert(
                    "completed_at",
                    bson::to_bson(&chrono::Utc::now()).map_err(Problem::from)?,
                );
            }
        }

        if set.is_empty() {
            return self.get_attempt(id).await;
        }

        let options = mongodb::options::FindOneAndUpdateOptions::builder()
            .return_document(mongodb::options::ReturnDocument::After)
            .build();

        self.collection(ATTEMPT_COLLECTION_NAME)
            .find_one_and_update(filter::by_id(id), doc! { "$set": set }, options)
            .await
            .map_err(Problem::from)
    }

    async fn count_attempts(&self, user: Option<Uuid>) -> Result<u64, Problem> {
        let filter = user.map(|u| filter::by_ref("user_id", u));
        self.collection::<MockTestAttempt>(ATTEMPT_COLLECTION_NAME)
            .count_documents(filter, None)
            .await
            .map_err(Problem::from)
    }
}
