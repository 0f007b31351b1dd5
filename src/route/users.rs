use mongodb::Database;
use rocket::serde::json::Json;
use rocket::State;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::Config;
use crate::data::user::db::problem as user_problem;
use crate::data::user::db::{UserDbExt, UserLoginData, UserSignupData, UserUpdateData};
use crate::data::user::{PasswordHash, User, UserResponse};
use crate::middleware::paging::PageState;
use crate::resp::jwt::{AdminUser, UserRoleToken};
use crate::resp::problem::{problems, Problem};
use crate::security::Security;

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

impl AuthResponse {
    fn issue(user: User, security: &Security) -> Result<AuthResponse, Problem> {
        let token = UserRoleToken::new(&user)
            .encode_jwt(&security.jwt_keys.private)
            .map_err(Problem::from)?;

        Ok(AuthResponse {
            token,
            user: UserResponse::from(user),
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

/// Create an account
#[utoipa::path(
    request_body = UserSignupData,
    responses(
        (status = 200, description = "Account created; token issued", body = AuthResponse),
        (status = 400, description = "Invalid signup data or identifier taken", body = Problem),
    )
)]
#[post("/auth/register", format = "application/json", data = "<signup>")]
#[tracing::instrument(skip(db, security))]
pub async fn auth_register(
    signup: Json<UserSignupData>,
    db: &State<Database>,
    config: &State<Config>,
    security: &State<Security>,
) -> Result<Json<AuthResponse>, Problem> {
    signup.validate()?;

    let user = db
        .create_user(signup.into_inner(), &config.admin_usernames, &security.salt)
        .await?;

    Ok(Json(AuthResponse::issue(user, security)?))
}

/// Log in with username or email
#[utoipa::path(
    request_body = UserLoginData,
    responses(
        (status = 200, description = "Authenticated; token issued", body = AuthResponse),
        (status = 401, description = "Bad credentials", body = Problem),
        (status = 403, description = "Account is deactivated", body = Problem),
    )
)]
#[post("/auth/login", format = "application/json", data = "<login>")]
#[tracing::instrument(skip(db, security))]
pub async fn auth_login(
    login: Json<UserLoginData>,
    db: &State<Database>,
    security: &State<Security>,
) -> Result<Json<AuthResponse>, Problem> {
    let is_email = login.is_email();
    login.validate(is_email)?;

    let user = match is_email {
        true => db.find_user_by_email(&login.identifier).await,
        false => db.find_user_by_username(&login.identifier).await,
    }?
    .ok_or_else(|| user_problem::bad_login(is_email))?;

    if user.pw_hash != PasswordHash::new(&login.password, &security.salt) {
        return Err(user_problem::bad_login(is_email));
    }

    if !user.is_active {
        return Err(user_problem::inactive());
    }

    Ok(Json(AuthResponse::issue(user, security)?))
}

/// Check token validity and return the authenticated user
#[utoipa::path(
    responses(
        (status = 200, description = "Token is valid", body = UserResponse),
        (status = 401, description = "Missing/expired token", body = Problem),
    ),
    security(("jwt" = []))
)]
#[get("/auth/verify")]
#[tracing::instrument(skip(db))]
pub async fn auth_verify(
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<UserResponse>, Problem> {
    let user = db
        .get_user(auth.user)
        .await?
        .ok_or_else(|| user_problem::not_found(auth.user))?;

    Ok(Json(UserResponse::from(user)))
}

/// Exchange a valid token for a fresh one
#[utoipa::path(
    responses(
        (status = 200, description = "New token with a fresh validity window", body = TokenResponse),
        (status = 401, description = "Missing/expired token", body = Problem),
    ),
    security(("jwt" = []))
)]
#[post("/auth/refresh")]
#[tracing::instrument(skip(security))]
pub async fn auth_refresh(
    auth: UserRoleToken,
    security: &State<Security>,
) -> Result<Json<TokenResponse>, Problem> {
    let refreshed = auth.refreshed();
    let token = refreshed
        .encode_jwt(&security.jwt_keys.private)
        .map_err(Problem::from)?;

    Ok(Json(TokenResponse {
        token,
        expires_at: refreshed.expires_at(),
    }))
}

/// List users (admin)
#[utoipa::path(
    responses(
        (status = 200, description = "Page of users", body = Vec<UserResponse>),
        (status = 403, description = "Admin access required", body = Problem),
    ),
    security(("jwt" = []))
)]
#[get("/users")]
#[tracing::instrument(skip(db))]
pub async fn user_list(
    _admin: AdminUser,
    page: PageState,
    db: &State<Database>,
) -> Result<Json<Vec<UserResponse>>, Problem> {
    let users = db.list_users(page.find_options()).await?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Get a single user
#[utoipa::path(
    params(("id", description = "user ID")),
    responses(
        (status = 200, description = "User information", body = UserResponse),
        (status = 403, description = "Not own account and not admin", body = Problem),
        (status = 404, description = "Queried user doesn't exist"),
    ),
    security(("jwt" = []))
)]
#[get("/users/<id>")]
#[tracing::instrument(skip(db))]
pub async fn user_get(
    id: Uuid,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Option<Json<UserResponse>>, Problem> {
    if auth.user != id && !auth.role.is_admin() {
        return Err(problems::access_denied());
    }

    Ok(db.get_user(id).await?.map(|u| Json(UserResponse::from(u))))
}

/// Change a user's role or active flag (admin)
#[utoipa::path(request_body = UserUpdateData, security(("jwt" = [])))]
#[put("/users/<id>", format = "application/json", data = "<update>")]
#[tracing::instrument(skip(db))]
pub async fn user_update(
    id: Uuid,
    update: Json<UserUpdateData>,
    _admin: AdminUser,
    db: &State<Database>,
) -> Result<Json<UserResponse>, Problem> {
    let user = db
        .update_user(id, update.into_inner())
        .await?
        .ok_or_else(|| user_problem::not_found(id))?;

    Ok(Json(UserResponse::from(user)))
}

/// Delete an account; users may remove themselves, admins anyone
#[utoipa::path(
    params(("id", description = "user ID")),
    responses(
        (status = 200, description = "ID of the deleted user"),
        (status = 403, description = "Not own account and not admin", body = Problem),
        (status = 404, description = "Queried user doesn't exist", body = Problem),
    ),
    security(("jwt" = []))
)]
#[delete("/users/<id>")]
#[tracing::instrument(skip(db))]
pub async fn user_delete(
    id: Uuid,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<String, Problem> {
    if auth.user != id && !auth.role.is_admin() {
        return Err(problems::access_denied());
    }

    match db.delete_user(id).await? {
        Some(removed) => Ok(removed.id.to_string()),
        None => Err(user_problem::not_found(id)),
    }
}
