use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub mod db;

use crate::resp::problem::{problems, Problem};

pub static CATEGORY_COLLECTION_NAME: &str = "categories";

/// Static reference data grouping courses and mock tests.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub is_active: bool,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CategoryCreateData {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl CategoryCreateData {
    pub fn validate(&self) -> Result<(), Problem> {
        if self.name.trim().is_empty() {
            return Err(problems::validation("name", "Category name can't be empty."));
        }
        Ok(())
    }

    pub fn into_category(self) -> Category {
        Category {
            id: Uuid::new_v4(),
            name: self.name,
            description: self.description,
            is_active: true,
            created: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CategoryUpdateData {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_defaults_to_active() {
        let category = CategoryCreateData {
            name: "IELTS".to_string(),
            description: String::new(),
        }
        .into_category();

        assert!(category.is_active);
    }

    #[test]
    fn empty_name_is_rejected() {
        let data = CategoryCreateData {
            name: "   ".to_string(),
            description: String::new(),
        };
        assert!(data.validate().is_err());
    }
}
