use chrono::{DateTime, Utc};
use rocket::FromFormField;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub mod db;

use crate::resp::problem::{problems, Problem};
use crate::util::slugify;

pub static SERVICE_COLLECTION_NAME: &str = "study_abroad_services";
pub static INQUIRY_COLLECTION_NAME: &str = "study_abroad_inquiries";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default, FromFormField,
)]
#[serde(rename_all = "snake_case")]
pub enum InquiryStatus {
    #[default]
    New,
    Contacted,
    #[field(value = "in_progress")]
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

/// A consulting service from the study-abroad catalog, addressable by slug.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StudyAbroadService {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub service_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub countries: Vec<String>,
    #[serde(default)]
    pub process_steps: Vec<String>,
    #[serde(default)]
    pub benefits: Vec<String>,
    pub is_active: bool,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StudyAbroadInquiry {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub service_id: Option<Uuid>,
    #[serde(default)]
    pub message: String,
    pub status: InquiryStatus,
    pub priority: Priority,
    #[serde(default)]
    pub notes: Option<String>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ServiceCreateData {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub service_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub countries: Vec<String>,
    #[serde(default)]
    pub process_steps: Vec<String>,
    #[serde(default)]
    pub benefits: Vec<String>,
}

impl ServiceCreateData {
    pub fn validate(&self) -> Result<(), Problem> {
        if self.title.trim().is_empty() {
            return Err(problems::validation("title", "Title can't be empty."));
        }
        Ok(())
    }

    /// Missing slugs are derived from the title.
    pub fn into_service(self) -> StudyAbroadService {
        let slug = match self.slug {
            Some(slug) if !slug.trim().is_empty() => slugify(&slug),
            _ => slugify(&self.title),
        };
        StudyAbroadService {
            id: Uuid::new_v4(),
            title: self.title,
            slug,
            service_type: self.service_type,
            description: self.description,
            features: self.features,
            countries: self.countries,
            process_steps: self.process_steps,
            benefits: self.benefits,
            is_active: true,
            created: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ServiceUpdateData {
    pub title: Option<String>,
    pub service_type: Option<String>,
    pub description: Option<String>,
    pub features: Option<Vec<String>>,
    pub countries: Option<Vec<String>>,
    pub process_steps: Option<Vec<String>>,
    pub benefits: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct InquiryCreateData {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub service_id: Option<Uuid>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub priority: Option<Priority>,
}

impl InquiryCreateData {
    pub fn validate(&self) -> Result<(), Problem> {
        if self.name.trim().is_empty() {
            return Err(problems::validation("name", "Name can't be empty."));
        }
        if !self.email.contains('@') {
            return Err(problems::validation("email", "Email address is invalid."));
        }
        Ok(())
    }

    pub fn into_inquiry(self) -> StudyAbroadInquiry {
        let now = Utc::now();
        StudyAbroadInquiry {
            id: Uuid::new_v4(),
            name: self.name,
            email: self.email,
            phone: self.phone,
            service_id: self.service_id,
            message: self.message,
            status: InquiryStatus::New,
            priority: self.priority.unwrap_or_default(),
            notes: None,
            created: now,
            updated: now,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct InquiryUpdateData {
    pub status: Option<InquiryStatus>,
    pub priority: Option<Priority>,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service_data(title: &str, slug: Option<&str>) -> ServiceCreateData {
        ServiceCreateData {
            title: title.to_string(),
            slug: slug.map(str::to_string),
            service_type: "counseling".to_string(),
            description: String::new(),
            features: vec![],
            countries: vec![],
            process_steps: vec![],
            benefits: vec![],
        }
    }

    #[test]
    fn slug_derived_from_title() {
        let service = service_data("University Admission Support", None).into_service();
        assert_eq!(service.slug, "university-admission-support");
    }

    #[test]
    fn explicit_slug_normalized() {
        let service = service_data("Visa Guidance", Some("Visa Help Desk")).into_service();
        assert_eq!(service.slug, "visa-help-desk");
    }

    #[test]
    fn inquiry_defaults() {
        let inquiry = InquiryCreateData {
            name: "Bikash Shrestha".to_string(),
            email: "bikash@example.com".to_string(),
            phone: None,
            service_id: None,
            message: "Interested in Canadian universities.".to_string(),
            priority: None,
        }
        .into_inquiry();
        assert_eq!(inquiry.status, InquiryStatus::New);
        assert_eq!(inquiry.priority, Priority::Medium);
        assert!(inquiry.notes.is_none());
        assert_eq!(inquiry.created, inquiry.updated);
    }

    #[test]
    fn inquiry_status_serializes_snake_case() {
        let json = serde_json::to_string(&InquiryStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }
}
