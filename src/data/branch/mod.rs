use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub mod db;

use crate::resp::problem::{problems, Problem};

pub static BRANCH_COLLECTION_NAME: &str = "branches";

/// Physical location reference data.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Branch {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub city: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub is_active: bool,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct BranchCreateData {
    pub name: String,
    pub address: String,
    pub city: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl BranchCreateData {
    pub fn validate(&self) -> Result<(), Problem> {
        if self.name.trim().is_empty() {
            return Err(problems::validation("name", "Branch name can't be empty."));
        }
        if self.city.trim().is_empty() {
            return Err(problems::validation("city", "Branch city can't be empty."));
        }
        Ok(())
    }

    pub fn into_branch(self) -> Branch {
        Branch {
            id: Uuid::new_v4(),
            name: self.name,
            address: self.address,
            city: self.city,
            phone: self.phone,
            is_active: true,
            created: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct BranchUpdateData {
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub phone: Option<String>,
    pub is_active: Option<bool>,
}
