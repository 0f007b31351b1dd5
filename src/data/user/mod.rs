use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use utoipa::ToSchema;
use uuid::Uuid;

pub mod db;

use crate::role::Role;
use crate::security::Salt;

pub static USER_COLLECTION_NAME: &str = "user";

const BCRYPT_COST: u32 = 12;

/// Bcrypt over a sha256 pre-hash of the password, with the deployment salt.
/// Deterministic for a given salt, so stored and submitted credentials are
/// compared by equality.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct PasswordHash(String);

impl PasswordHash {
    pub fn new(password: impl AsRef<str>, salt: &Salt) -> PasswordHash {
        let mut sha = Sha256::new();
        Digest::update(&mut sha, password.as_ref().as_bytes());
        let digest = sha.finalize();

        let parts = bcrypt::hash_with_salt(digest.as_slice(), BCRYPT_COST, *salt)
            .expect("bcrypt cost and salt must be valid");

        PasswordHash(parts.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub pw_hash: PasswordHash,
    pub user_role: Role,
    pub is_active: bool,
    pub created: DateTime<Utc>,
}

impl User {
    pub fn new(
        email: impl ToString,
        username: impl ToString,
        password: impl AsRef<str>,
        salt: &Salt,
    ) -> User {
        let pw_hash = PasswordHash::new(password, salt);

        let id = Uuid::new_v5(&Uuid::NAMESPACE_OID, username.to_string().as_bytes());
        tracing::info!("Creating a new user with UUID: {}", id);

        User {
            id,
            email: email.to_string(),
            username: username.to_string(),
            pw_hash,
            user_role: Role::Student,
            is_active: true,
            created: Utc::now(),
        }
    }
}

/// Public view of a [`User`]; never exposes the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub user_role: Role,
    pub is_active: bool,
    pub created: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id,
            email: user.email,
            username: user.username,
            user_role: user.user_role,
            is_active: user.is_active,
            created: user.created,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_is_deterministic_per_salt() {
        let salt: Salt = [7u8; 16];
        let a = PasswordHash::new("s3cret_pass", &salt);
        let b = PasswordHash::new("s3cret_pass", &salt);
        let c = PasswordHash::new("other_pass1", &salt);

        assert_eq!(a, b);
        assert_ne!(a, c);

        let other_salt: Salt = [9u8; 16];
        assert_ne!(a, PasswordHash::new("s3cret_pass", &other_salt));
    }

    #[test]
    fn new_user_defaults() {
        let salt: Salt = [1u8; 16];
        let user = User::new("jane@example.com", "jane_doe", "password123", &salt);

        assert_eq!(user.user_role, Role::Student);
        assert!(user.is_active);
        assert_eq!(
            user.id,
            Uuid::new_v5(&Uuid::NAMESPACE_OID, "jane_doe".as_bytes())
        );
    }

    #[test]
    fn response_hides_password_hash() {
        let salt: Salt = [1u8; 16];
        let user = User::new("jane@example.com", "jane_doe", "password123", &salt);
        let response = UserResponse::from(user);

        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("pw_hash").is_none());
        assert_eq!(json["username"], "jane_doe");
    }
}
