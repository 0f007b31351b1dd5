use mongodb::Database;
use rocket::serde::json::Json;
use rocket::State;
use uuid::Uuid;

use crate::data::event::db::EventDbExt;
use crate::data::event::{Event, EventCreateData, EventRegistration, EventUpdateData};
use crate::resp::jwt::{StaffUser, UserRoleToken};
use crate::resp::problem::{problems, Problem};

/// Browse events
#[utoipa::path(
    params(
        ("upcoming" = Option<bool>, Query, description = "only events that haven't started"),
        ("include_inactive" = Option<bool>, Query, description = "staff only"),
    ),
    responses((status = 200, body = Vec<Event>))
)]
#[get("/events?<upcoming>&<include_inactive>")]
#[tracing::instrument(skip(db))]
pub async fn event_list(
    upcoming: Option<bool>,
    include_inactive: Option<bool>,
    staff: Option<StaffUser>,
    db: &State<Database>,
) -> Result<Json<Vec<Event>>, Problem> {
    let include_inactive = include_inactive.unwrap_or(false) && staff.is_some();

    Ok(Json(
        db.list_events(upcoming.unwrap_or(false), include_inactive).await?,
    ))
}

#[utoipa::path(params(("id", description = "event ID")))]
#[get("/events/<id>")]
#[tracing::instrument(skip(db))]
pub async fn event_get(id: Uuid, db: &State<Database>) -> Result<Option<Json<Event>>, Problem> {
    Ok(db.get_event(id).await?.map(Json))
}

/// Create an event (staff)
#[utoipa::path(request_body = EventCreateData, security(("jwt" = [])))]
#[post("/events", format = "application/json", data = "<create>")]
#[tracing::instrument(skip(db))]
pub async fn event_create(
    create: Json<EventCreateData>,
    _staff: StaffUser,
    db: &State<Database>,
) -> Result<Json<Event>, Problem> {
    create.validate()?;

    Ok(Json(db.create_event(create.into_inner().into_event()).await?))
}

/// Update an event (staff)
#[utoipa::path(request_body = EventUpdateData, security(("jwt" = [])))]
#[put("/events/<id>", format = "application/json", data = "<update>")]
#[tracing::instrument(skip(db))]
pub async fn event_update(
    id: Uuid,
    update: Json<EventUpdateData>,
    _staff: StaffUser,
    db: &State<Database>,
) -> Result<Json<Event>, Problem> {
    let event = db
        .update_event(id, update.into_inner())
        .await?
        .ok_or_else(|| problems::not_found("Event", id))?;

    Ok(Json(event))
}

/// Delete an event (staff)
#[utoipa::path(security(("jwt" = [])))]
#[delete("/events/<id>")]
#[tracing::instrument(skip(db))]
pub async fn event_delete(
    id: Uuid,
    _staff: StaffUser,
    db: &State<Database>,
) -> Result<String, Problem> {
    match db.delete_event(id).await? {
        Some(removed) => Ok(removed.id.to_string()),
        None => Err(problems::not_found("Event", id)),
    }
}

/// Register the authenticated user for an event
#[utoipa::path(
    params(("id", description = "event ID")),
    responses(
        (status = 200, description = "Registration record", body = EventRegistration),
        (status = 400, description = "Event full or already registered", body = Problem),
        (status = 404, description = "Queried event doesn't exist", body = Problem),
    ),
    security(("jwt" = []))
)]
#[post("/events/<id>/register")]
#[tracing::instrument(skip(db))]
pub async fn event_register(
    id: Uuid,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<EventRegistration>, Problem> {
    Ok(Json(db.register_for_event(id, auth.user).await?))
}

/// List registrations for an event (staff)
#[utoipa::path(
    params(("id", description = "event ID")),
    responses((status = 200, body = Vec<EventRegistration>)),
    security(("jwt" = []))
)]
#[get("/events/<id>/registrations")]
#[tracing::instrument(skip(db))]
pub async fn event_registrations(
    id: Uuid,
    _staff: StaffUser,
    db: &State<Database>,
) -> Result<Json<Vec<EventRegistration>>, Problem> {
    Ok(Json(db.list_registrations(Some(id), None).await?))
}
