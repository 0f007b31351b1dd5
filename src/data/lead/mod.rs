use chrono::{DateTime, Utc};
use rocket::FromFormField;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub mod db;

use crate::resp::problem::{problems, Problem};

pub static LEAD_COLLECTION_NAME: &str = "leads";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default, FromFormField,
)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    #[default]
    New,
    Contacted,
    Qualified,
    Closed,
}

/// A prospective student captured from a contact form or counselor intake.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Lead {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub interest: String,
    #[serde(default)]
    pub message: Option<String>,
    pub source: String,
    pub status: LeadStatus,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LeadCreateData {
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub interest: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

impl LeadCreateData {
    pub fn validate(&self) -> Result<(), Problem> {
        if self.full_name.trim().is_empty() {
            return Err(problems::validation("full_name", "Lead name can't be empty."));
        }
        if !self.email.contains('@') {
            return Err(problems::validation("email", "Email address is invalid."));
        }
        Ok(())
    }

    pub fn into_lead(self) -> Lead {
        Lead {
            id: Uuid::new_v4(),
            full_name: self.full_name,
            email: self.email,
            phone: self.phone,
            interest: self.interest,
            message: self.message,
            source: self.source.unwrap_or_else(|| "website".to_string()),
            status: LeadStatus::New,
            created: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct LeadUpdateData {
    pub status: Option<LeadStatus>,
    pub interest: Option<String>,
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_data() -> LeadCreateData {
        LeadCreateData {
            full_name: "Asha Gurung".to_string(),
            email: "asha@example.com".to_string(),
            phone: "9800000000".to_string(),
            interest: "IELTS preparation".to_string(),
            message: None,
            source: None,
        }
    }

    #[test]
    fn defaults_applied_on_creation() {
        let lead = create_data().into_lead();
        assert_eq!(lead.status, LeadStatus::New);
        assert_eq!(lead.source, "website");
    }

    #[test]
    fn explicit_source_preserved() {
        let mut data = create_data();
        data.source = Some("walk_in".to_string());
        assert_eq!(data.into_lead().source, "walk_in");
    }

    #[test]
    fn invalid_email_rejected() {
        let mut data = create_data();
        data.email = "not-an-email".to_string();
        assert!(data.validate().is_err());
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&LeadStatus::Qualified).unwrap();
        assert_eq!(json, "\"qualified\"");
    }
}
