use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub mod db;

use crate::resp::problem::{problems, Problem};

pub static ENROLLMENT_COLLECTION_NAME: &str = "enrollments";

/// Association between a user and a course tracking progress. At most one
/// active enrollment may exist per (user, course) pair.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Enrollment {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub progress: u8,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created: DateTime<Utc>,
}

impl Enrollment {
    pub fn new(user_id: Uuid, course_id: Uuid) -> Enrollment {
        Enrollment {
            id: Uuid::new_v4(),
            user_id,
            course_id,
            progress: 0,
            completed_at: None,
            is_active: true,
            created: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct EnrollmentCreateData {
    pub course_id: Uuid,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct EnrollmentUpdateData {
    pub progress: Option<u8>,
    pub completed: Option<bool>,
    pub is_active: Option<bool>,
}

impl EnrollmentUpdateData {
    pub fn validate(&self) -> Result<(), Problem> {
        if let Some(progress) = self.progress {
            if progress > 100 {
                return Err(problems::validation(
                    "progress",
                    "Progress must be between 0 and 100.",
                ));
            }
        }
        Ok(())
    }

    /// Whether this update marks the enrollment as finished, either
    /// explicitly or by reaching full progress.
    pub fn completes(&self) -> bool {
        self.completed == Some(true) || self.progress == Some(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_enrollment_starts_at_zero_progress() {
        let enrollment = Enrollment::new(Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(enrollment.progress, 0);
        assert!(enrollment.is_active);
        assert!(enrollment.completed_at.is_none());
    }

    #[test]
    fn progress_bounds_are_validated() {
        let over = EnrollmentUpdateData {
            progress: Some(101),
            ..Default::default()
        };
        assert!(over.validate().is_err());

        let ok = EnrollmentUpdateData {
            progress: Some(100),
            ..Default::default()
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn completion_detection() {
        assert!(EnrollmentUpdateData {
            completed: Some(true),
            ..Default::default()
        }
        .completes());
        assert!(EnrollmentUpdateData {
            progress: Some(100),
            ..Default::default()
        }
        .completes());
        assert!(!EnrollmentUpdateData {
            progress: Some(50),
            ..Default::default()
        }
        .completes());
    }
}
