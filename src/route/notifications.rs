use mongodb::Database;
use rocket::serde::json::Json;
use rocket::State;
use uuid::Uuid;

use crate::data::notification::db::NotificationDbExt;
use crate::data::notification::{
    Notification, NotificationCreateData, NotificationStatusUpdate,
};
use crate::resp::jwt::{AdminUser, UserRoleToken};
use crate::resp::problem::{problems, Problem};

/// List notifications; users see their own, staff may query any user's
#[utoipa::path(
    params(
        ("user" = Option<Uuid>, Query, description = "staff only"),
        ("unread" = Option<bool>, Query, description = "only unread notifications"),
    ),
    responses((status = 200, body = Vec<Notification>)),
    security(("jwt" = []))
)]
#[get("/notifications?<user>&<unread>")]
#[tracing::instrument(skip(db))]
pub async fn notification_list(
    user: Option<Uuid>,
    unread: Option<bool>,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<Vec<Notification>>, Problem> {
    let user = if auth.role.can_manage_content() {
        user
    } else {
        Some(auth.user)
    };

    Ok(Json(db.list_notifications(user, unread.unwrap_or(false)).await?))
}

/// Queue a notification for a user (admin)
#[utoipa::path(
    request_body = NotificationCreateData,
    responses(
        (status = 200, description = "Stored notification", body = Notification),
        (status = 400, description = "Empty title", body = Problem),
    ),
    security(("jwt" = []))
)]
#[post("/notifications", format = "application/json", data = "<create>")]
#[tracing::instrument(skip(db))]
pub async fn notification_create(
    create: Json<NotificationCreateData>,
    _admin: AdminUser,
    db: &State<Database>,
) -> Result<Json<Notification>, Problem> {
    create.validate()?;

    Ok(Json(
        db.create_notification(create.into_inner().into_notification())
            .await?,
    ))
}

/// Record a delivery attempt outcome (admin)
#[utoipa::path(request_body = NotificationStatusUpdate, security(("jwt" = [])))]
#[put("/notifications/<id>/status", format = "application/json", data = "<update>")]
#[tracing::instrument(skip(db))]
pub async fn notification_status(
    id: Uuid,
    update: Json<NotificationStatusUpdate>,
    _admin: AdminUser,
    db: &State<Database>,
) -> Result<Json<Notification>, Problem> {
    let notification = db
        .update_delivery_status(id, update.into_inner())
        .await?
        .ok_or_else(|| problems::not_found("Notification", id))?;

    Ok(Json(notification))
}

/// Mark a notification as read
#[utoipa::path(
    params(("id", description = "notification ID")),
    responses(
        (status = 200, description = "Updated notification", body = Notification),
        (status = 403, description = "Not the recipient", body = Problem),
        (status = 404, description = "Queried notification doesn't exist", body = Problem),
    ),
    security(("jwt" = []))
)]
#[post("/notifications/<id>/read")]
#[tracing::instrument(skip(db))]
pub async fn notification_read(
    id: Uuid,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<Notification>, Problem> {
    let existing = db
        .get_notification(id)
        .await?
        .ok_or_else(|| problems::not_found("Notification", id))?;
    if existing.user_id != auth.user && !auth.role.can_manage_content() {
        return Err(problems::access_denied());
    }

    let notification = db
        .mark_read(id)
        .await?
        .ok_or_else(|| problems::not_found("Notification", id))?;

    Ok(Json(notification))
}

/// Delete a notification; recipients may remove their own
#[utoipa::path(security(("jwt" = [])))]
#[delete("/notifications/<id>")]
#[tracing::instrument(skip(db))]
pub async fn notification_delete(
    id: Uuid,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<String, Problem> {
    let existing = db
        .get_notification(id)
        .await?
        .ok_or_else(|| problems::not_found("Notification", id))?;
    if existing.user_id != auth.user && !auth.role.can_manage_content() {
        return Err(problems::access_denied());
    }

    match db.delete_notification(id).await? {
        Some(removed) => Ok(removed.id.to_string()),
        None => Err(problems::not_found("Notification", id)),
    }
}
