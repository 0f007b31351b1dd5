use bson::{doc, Document};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub mod db;

use crate::data::filter;
use crate::resp::problem::{problems, Problem};

pub static COURSE_COLLECTION_NAME: &str = "courses";

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CourseFormat {
    Online,
    InPerson,
    Hybrid,
}

/// An ordered content unit within a course. The first lecture of every course
/// is access-free regardless of what the client submits.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Lecture {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub title: String,
    pub duration_minutes: u32,
    pub order: u32,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub is_free: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Course {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category_id: Uuid,
    pub instructor_id: Uuid,
    pub price: f64,
    pub duration: String,
    pub format: CourseFormat,
    #[serde(default)]
    pub is_featured: bool,
    pub is_active: bool,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub enrolled_count: u32,
    #[serde(default)]
    pub lectures: Vec<Lecture>,
    pub created: DateTime<Utc>,
}

/// Sorts lectures by their order field and marks the first one free.
pub fn normalize_lectures(lectures: &mut [Lecture]) {
    lectures.sort_by_key(|l| l.order);
    if let Some(first) = lectures.first_mut() {
        first.is_free = true;
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CourseCreateData {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category_id: Uuid,
    pub instructor_id: Uuid,
    pub price: f64,
    pub duration: String,
    pub format: CourseFormat,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub lectures: Vec<Lecture>,
}

impl CourseCreateData {
    pub fn validate(&self) -> Result<(), Problem> {
        if self.title.trim().is_empty() {
            return Err(problems::validation("title", "Course title can't be empty."));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(problems::validation("price", "Price must be non-negative."));
        }
        Ok(())
    }

    pub fn into_course(self) -> Course {
        let mut lectures = self.lectures;
        normalize_lectures(&mut lectures);

        Course {
            id: Uuid::new_v4(),
            title: self.title,
            description: self.description,
            category_id: self.category_id,
            instructor_id: self.instructor_id,
            price: self.price,
            duration: self.duration,
            format: self.format,
            is_featured: self.is_featured,
            is_active: true,
            rating: 0.0,
            enrolled_count: 0,
            lectures,
            created: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CourseUpdateData {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub price: Option<f64>,
    pub duration: Option<String>,
    pub format: Option<CourseFormat>,
    pub is_featured: Option<bool>,
    pub is_active: Option<bool>,
    pub lectures: Option<Vec<Lecture>>,
}

impl CourseUpdateData {
    pub fn validate(&self) -> Result<(), Problem> {
        if let Some(price) = self.price {
            if !price.is_finite() || price < 0.0 {
                return Err(problems::validation("price", "Price must be non-negative."));
            }
        }
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err(problems::validation("title", "Course title can't be empty."));
            }
        }
        Ok(())
    }
}

/// Optional list predicates; combined conjunctively into one filter document.
#[derive(Debug, Clone, Default)]
pub struct CourseFilters {
    pub category: Option<Uuid>,
    pub search: Option<String>,
    pub featured: Option<bool>,
    pub free: Option<bool>,
    pub include_inactive: bool,
}

impl CourseFilters {
    pub fn to_document(&self) -> Document {
        let mut clauses: Vec<Document> = vec![];

        if !self.include_inactive {
            clauses.push(doc! { "is_active": true });
        }
        if let Some(category) = self.category {
            clauses.push(doc! { "category_id": category.to_string() });
        }
        if let Some(featured) = self.featured {
            clauses.push(doc! { "is_featured": featured });
        }
        if let Some(free) = self.free {
            if free {
                clauses.push(doc! { "price": 0.0 });
            } else {
                clauses.push(doc! { "price": { "$gt": 0.0 } });
            }
        }
        if let Some(term) = self.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            clauses.push(filter::ci_contains(&["title", "description"], term));
        }

        match clauses.len() {
            0 => Document::new(),
            1 => clauses.into_iter().next().expect("one clause"),
            _ => doc! { "$and": clauses },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lecture(title: &str, order: u32) -> Lecture {
        Lecture {
            id: Uuid::new_v4(),
            title: title.to_string(),
            duration_minutes: 30,
            order,
            video_url: None,
            is_free: false,
        }
    }

    #[test]
    fn first_lecture_is_always_free() {
        let data = CourseCreateData {
            title: "IELTS Preparation".to_string(),
            description: String::new(),
            category_id: Uuid::new_v4(),
            instructor_id: Uuid::new_v4(),
            price: 99.0,
            duration: "8 weeks".to_string(),
            format: CourseFormat::Online,
            is_featured: false,
            lectures: vec![lecture("Writing", 2), lecture("Intro", 1)],
        };

        let course = data.into_course();

        assert_eq!(course.lectures[0].title, "Intro");
        assert!(course.lectures[0].is_free);
        assert!(!course.lectures[1].is_free);
        assert_eq!(course.enrolled_count, 0);
        assert!(course.is_active);
    }

    #[test]
    fn featured_filter_only_matches_featured() {
        let filters = CourseFilters {
            featured: Some(true),
            ..Default::default()
        };
        let doc = filters.to_document();
        let clauses = doc.get_array("$and").unwrap();
        assert!(clauses
            .iter()
            .any(|c| c.as_document().unwrap().get_bool("is_featured") == Ok(true)));
    }

    #[test]
    fn search_filter_builds_ci_regex() {
        let filters = CourseFilters {
            search: Some("ielts".to_string()),
            include_inactive: true,
            ..Default::default()
        };
        let doc = filters.to_document();
        let or = doc.get_array("$or").unwrap();
        assert_eq!(or.len(), 2);
    }

    #[test]
    fn negative_price_rejected() {
        let data = CourseCreateData {
            title: "Bad".to_string(),
            description: String::new(),
            category_id: Uuid::new_v4(),
            instructor_id: Uuid::new_v4(),
            price: -5.0,
            duration: "1 week".to_string(),
            format: CourseFormat::Hybrid,
            is_featured: false,
            lectures: vec![],
        };
        assert!(data.validate().is_err());
    }
}
