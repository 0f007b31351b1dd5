use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize, ToSchema, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    None,
    Student,
    Parent,
    Instructor,
    Admin,
}

impl Role {
    /// Indicates whether a user with this role can create and edit catalog
    /// content (courses, mock tests, events).
    pub fn can_manage_content(self) -> bool {
        self >= Role::Instructor
    }

    /// Indicates whether a user with this role has full administrative access
    /// (user management, leads, study-abroad services and inquiries).
    pub fn is_admin(self) -> bool {
        self >= Role::Admin
    }

    /// Indicates whether this is an authenticated member role.
    pub fn is_member(self) -> bool {
        self >= Role::Student
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::None => write!(f, "none"),
            Role::Student => write!(f, "student"),
            Role::Parent => write!(f, "parent"),
            Role::Instructor => write!(f, "instructor"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_ordering_matches_capabilities() {
        assert!(Role::Admin > Role::Instructor);
        assert!(Role::Instructor > Role::Parent);
        assert!(Role::Parent > Role::Student);
        assert!(Role::Student > Role::None);

        assert!(Role::Admin.can_manage_content());
        assert!(Role::Instructor.can_manage_content());
        assert!(!Role::Student.can_manage_content());

        assert!(Role::Admin.is_admin());
        assert!(!Role::Instructor.is_admin());

        assert!(Role::Student.is_member());
        assert!(!Role::None.is_member());
    }

    #[test]
    fn role_serializes_to_snake_case() {
        assert_eq!(
            serde_json::to_string(&Role::Instructor).unwrap(),
            "\"instructor\""
        );
        let parsed: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(parsed, Role::Admin);
    }
}
