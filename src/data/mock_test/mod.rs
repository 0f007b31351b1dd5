use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;
use uuid::Uuid;

pub mod db;

use crate::resp::problem::{problems, Problem};

pub static MOCK_TEST_COLLECTION_NAME: &str = "mock_tests";
pub static ATTEMPT_COLLECTION_NAME: &str = "mock_test_attempts";

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Question {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub text: String,
    pub options: Vec<String>,
    pub correct_option: u8,
    pub marks: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MockTest {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    pub duration_minutes: u32,
    pub total_questions: u32,
    pub total_marks: u32,
    pub passing_marks: u32,
    #[serde(default)]
    pub questions: Vec<Question>,
    pub is_active: bool,
    pub created: DateTime<Utc>,
}

/// A user's single run through a mock test.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MockTestAttempt {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub test_id: Uuid,
    pub user_id: Uuid,
    /// Question id (string form) to chosen option index.
    #[serde(default)]
    pub answers: HashMap<String, u8>,
    #[serde(default)]
    pub score: Option<u32>,
    #[serde(default)]
    pub time_spent_seconds: Option<u32>,
    pub is_completed: bool,
    pub started: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl MockTestAttempt {
    pub fn new(test_id: Uuid, user_id: Uuid) -> MockTestAttempt {
        MockTestAttempt {
            id: Uuid::new_v4(),
            test_id,
            user_id,
            answers: HashMap::new(),
            score: None,
            time_spent_seconds: None,
            is_completed: false,
            started: Utc::now(),
            completed_at: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct MockTestCreateData {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    pub duration_minutes: u32,
    pub total_questions: u32,
    pub total_marks: u32,
    pub passing_marks: u32,
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl MockTestCreateData {
    pub fn validate(&self) -> Result<(), Problem> {
        if self.title.trim().is_empty() {
            return Err(problems::validation("title", "Test title can't be empty."));
        }
        if self.passing_marks > self.total_marks {
            return Err(problems::validation(
                "passing_marks",
                "Passing marks can't exceed total marks.",
            ));
        }
        if !self.questions.is_empty() && self.questions.len() as u32 != self.total_questions {
            return Err(problems::validation(
                "total_questions",
                "Question count doesn't match total_questions.",
            ));
        }
        for question in &self.questions {
            if usize::from(question.correct_option) >= question.options.len() {
                return Err(problems::validation(
                    "questions",
                    "Correct option index out of range.",
                ));
            }
        }
        Ok(())
    }

    pub fn into_mock_test(self) -> MockTest {
        MockTest {
            id: Uuid::new_v4(),
            title: self.title,
            description: self.description,
            category_id: self.category_id,
            duration_minutes: self.duration_minutes,
            total_questions: self.total_questions,
            total_marks: self.total_marks,
            passing_marks: self.passing_marks,
            questions: self.questions,
            is_active: true,
            created: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct MockTestUpdateData {
    pub title: Option<String>,
    pub description: Option<String>,
    pub duration_minutes: Option<u32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct AttemptUpdateData {
    #[serde(default)]
    pub answers: Option<HashMap<String, u8>>,
    pub score: Option<u32>,
    pub time_spent_seconds: Option<u32>,
    pub is_completed: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_data(passing: u32, total: u32) -> MockTestCreateData {
        MockTestCreateData {
            title: "IELTS Reading Mock".to_string(),
            description: String::new(),
            category_id: None,
            duration_minutes: 60,
            total_questions: 0,
            total_marks: total,
            passing_marks: passing,
            questions: vec![],
        }
    }

    #[test]
    fn passing_marks_bounded_by_total() {
        assert!(create_data(40, 100).validate().is_ok());
        assert!(create_data(100, 100).validate().is_ok());
        assert!(create_data(101, 100).validate().is_err());
    }

    #[test]
    fn question_count_must_match_when_supplied() {
        let mut data = create_data(40, 100);
        data.total_questions = 2;
        data.questions = vec![Question {
            id: Uuid::new_v4(),
            text: "2 + 2?".to_string(),
            options: vec!["3".to_string(), "4".to_string()],
            correct_option: 1,
            marks: 1,
        }];
        assert!(data.validate().is_err());

        data.total_questions = 1;
        assert!(data.validate().is_ok());
    }

    #[test]
    fn correct_option_must_be_in_range() {
        let mut data = create_data(1, 1);
        data.total_questions = 1;
        data.questions = vec![Question {
            id: Uuid::new_v4(),
            text: "2 + 2?".to_string(),
            options: vec!["4".to_string()],
            correct_option: 3,
            marks: 1,
        }];
        assert!(data.validate().is_err());
    }

    #[test]
    fn fresh_attempt_is_incomplete() {
        let attempt = MockTestAttempt::new(Uuid::new_v4(), Uuid::new_v4());
        assert!(!attempt.is_completed);
        assert!(attempt.completed_at.is_none());
        assert!(attempt.answers.is_empty());
    }
}
