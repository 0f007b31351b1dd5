use mongodb::Database;
use rocket::futures::StreamExt;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::data::filter;
use crate::resp::problem::Problem;
use crate::role::Role;
use crate::security::Salt;

use super::{PasswordHash, User, USER_COLLECTION_NAME};

pub mod problem {
    use crate::resp::problem::Problem;
    use rocket::http::Status;
    use uuid::Uuid;

    #[inline]
    pub fn bad_email(email: impl ToString, detail: impl ToString) -> Problem {
        Problem::new_untyped(Status::BadRequest, "Bad email.")
            .insert_str("email", email)
            .detail(detail)
            .to_owned()
    }

    #[inline]
    pub fn bad_username(username: impl ToString, detail: impl ToString) -> Problem {
        Problem::new_untyped(Status::BadRequest, "Bad username.")
            .insert_str("username", username)
            .detail(detail)
            .to_owned()
    }

    #[inline]
    pub fn bad_password(detail: impl ToString) -> Problem {
        Problem::new_untyped(Status::BadRequest, "Bad password.")
            .detail(detail)
            .to_owned()
    }

    #[inline]
    pub fn not_found(id: Uuid) -> Problem {
        Problem::new_untyped(Status::NotFound, "User doesn't exist.")
            .insert_str("id", id)
            .clone()
    }

    #[inline]
    pub fn bad_login(is_email: bool) -> Problem {
        Problem::new_untyped(
            Status::Unauthorized,
            if is_email {
                "Bad email or password."
            } else {
                "Bad username or password."
            },
        )
    }

    #[inline]
    pub fn inactive() -> Problem {
        Problem::new_untyped(Status::Forbidden, "Account is deactivated.")
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UserSignupData {
    #[schema(format = "email")]
    pub email: String,
    pub username: String,
    #[schema(format = "password")]
    pub password: String,
}

impl UserSignupData {
    pub fn validate(&self) -> Result<(), Problem> {
        if !self.email.contains('@') {
            return Err(problem::bad_email(
                &self.email,
                "Not a valid e-mail address.",
            ));
        }

        if self.username.len() < 5 {
            return Err(problem::bad_username(
                &self.username,
                "Username must be at least 5 characters (bytes) long.",
            ));
        }

        if self.username.len() > 32 {
            return Err(problem::bad_username(
                &self.username,
                "Username can't be longer than 32 characters (bytes).",
            ));
        }

        if self.password.len() < 8 {
            return Err(problem::bad_password(
                "Password must be at least 8 characters (bytes) long.",
            ));
        }

        if self.password.len() > 1024 {
            return Err(problem::bad_password(
                "Passwords longer than 1024 characters aren't supported.",
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UserLoginData {
    /// Username or email address.
    pub identifier: String,
    #[schema(format = "password")]
    pub password: String,
}

impl UserLoginData {
    pub fn is_email(&self) -> bool {
        self.identifier.contains('@')
    }

    pub fn validate(&self, is_email: bool) -> Result<(), Problem> {
        if self.identifier.len() < 5
            || self.identifier.len() > 64
            || self.password.len() < 8
            || self.password.len() > 1024
        {
            return Err(problem::bad_login(is_email));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UserUpdateData {
    pub user_role: Option<Role>,
    pub is_active: Option<bool>,
}

pub trait UserDbExt {
    async fn create_user(
        &self,
        signup: UserSignupData,
        admin_names: impl AsRef<[String]>,
        salt: &Salt,
    ) -> Result<User, Problem>;

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, Problem>;
    async fn list_users(
        &self,
        options: mongodb::options::FindOptions,
    ) -> Result<Vec<User>, Problem>;

    async fn find_user_by_email(&self, email: impl AsRef<str>) -> Result<Option<User>, Problem>;
    async fn find_user_by_username(
        &self,
        username: impl AsRef<str>,
    ) -> Result<Option<User>, Problem>;

    async fn update_user(&self, id: Uuid, update: UserUpdateData) -> Result<Option<User>, Problem>;
    async fn delete_user(&self, id: Uuid) -> Result<Option<User>, Problem>;
    async fn count_users(&self) -> Result<u64, Problem>;
}

impl UserDbExt for Database {
    async fn create_user(
        &self,
        signup: UserSignupData,
        admin_names: impl AsRef<[String]>,
        salt: &Salt,
    ) -> Result<User, Problem> {
        if self.find_user_by_email(&signup.email).await?.is_some() {
            return Err(problem::bad_email(
                &signup.email,
                "Email already registered.",
            ));
        }

        if self
            .find_user_by_username(&signup.username)
            .await?
            .is_some()
        {
            return Err(problem::bad_username(
                &signup.username,
                "Username already used.",
            ));
        }

        let mut user = User::new(&signup.email, &signup.username, &signup.password, salt);

        if admin_names.as_ref().contains(&user.username) {
            user.user_role = Role::Admin;
        }

        self.collection::<User>(USER_COLLECTION_NAME)
            .insert_one(&user, None)
            .await
            .map_err(Problem::from)?;

        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, Problem> {
        self.collection(USER_COLLECTION_NAME)
            .find_one(filter::by_id(id), None)
            .await
            .map_err(Problem::from)
    }

    async fn list_users(
        &self,
        options: mongodb::options::FindOptions,
    ) -> Result<Vec<User>, Problem> {
        let mut cursor = self
            .collection::<User>(USER_COLLECTION_NAME)
            .find(None, options)
            .await
            .map_err(Problem::from)?;

        let mut users = vec![];
        while let Some(user) = cursor.next().await {
            match user {
                Ok(user) => users.push(user),
                Err(_) => tracing::warn!("Unable to deserialize User document."),
            }
        }

        Ok(users)
    }

    async fn find_user_by_email(&self, email: impl AsRef<str>) -> Result<Option<User>, Problem> {
        self.collection(USER_COLLECTION_NAME)
            .find_one(bson::doc! { "email": email.as_ref() }, None)
            .await
            .map_err(Problem::from)
    }

    async fn find_user_by_username(
        &self,
        username: impl AsRef<str>,
    ) -> Result<Option<User>, Problem> {
        self.collection(USER_COLLECTION_NAME)
            .find_one(bson::doc! { "username": username.as_ref() }, None)
            .await
            .map_err(Problem::from)
    }

    async fn update_user(&self, id: Uuid, update: UserUpdateData) -> Result<Option<User>, Problem> {
        let mut set = bson::Document::new();
        if let Some(role) = update.user_role {
            set.insert("user_role", bson::to_bson(&role).map_err(Problem::from)?);
        }
        if let Some(active) = update.is_active {
            set.insert("is_active", active);
        }

        if set.is_empty() {
            return self.get_user(id).await;
        }

        let options = mongodb::options::FindOneAndUpdateOptions::builder()
            .return_document(mongodb::options::ReturnDocument::After)
            .build();

        self.collection(USER_COLLECTION_NAME)
            .find_one_and_update(filter::by_id(id), bson::doc! { "$set": set }, options)
            .await
            .map_err(Problem::from)
    }

    async fn delete_user(&self, id: Uuid) -> Result<Option<User>, Problem> {
        self.collection(USER_COLLECTION_NAME)
            .find_one_and_delete(filter::by_id(id), None)
            .await
            .map_err(Problem::from)
    }

    async fn count_users(&self) -> Result<u64, Problem> {
        self.collection::<User>(USER_COLLECTION_NAME)
            .count_documents(None, None)
            .await
            .map_err(Problem::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(email: &str, username: &str, password: &str) -> UserSignupData {
        UserSignupData {
            email: email.to_string(),
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn signup_validation_rules() {
        assert!(signup("jane@example.com", "jane_doe", "longenough").validate().is_ok());

        // missing @
        assert!(signup("janeexample.com", "jane_doe", "longenough").validate().is_err());
        // username too short
        assert!(signup("jane@example.com", "jd", "longenough").validate().is_err());
        // username too long
        let long_name = "a".repeat(33);
        assert!(signup("jane@example.com", &long_name, "longenough").validate().is_err());
        // password too short
        assert!(signup("jane@example.com", "jane_doe", "short").validate().is_err());
    }

    #[test]
    fn login_identifier_detection() {
        let by_email = UserLoginData {
            identifier: "jane@example.com".to_string(),
            password: "longenough".to_string(),
        };
        let by_username = UserLoginData {
            identifier: "jane_doe".to_string(),
            password: "longenough".to_string(),
        };

        assert!(by_email.is_email());
        assert!(!by_username.is_email());
        assert!(by_email.validate(true).is_ok());
        assert!(by_username.validate(false).is_ok());
    }
}
