use mongodb::Database;
use rocket::serde::json::Json;
use rocket::State;
use uuid::Uuid;

use crate::data::lead::db::LeadDbExt;
use crate::data::lead::{Lead, LeadCreateData, LeadStatus, LeadUpdateData};
use crate::resp::jwt::AdminUser;
use crate::resp::problem::{problems, Problem};

/// Capture a contact-form lead; no authentication required
#[utoipa::path(
    request_body = LeadCreateData,
    responses(
        (status = 200, description = "Stored lead with defaults applied", body = Lead),
        (status = 400, description = "Missing name or invalid email", body = Problem),
    )
)]
#[post("/leads", format = "application/json", data = "<create>")]
#[tracing::instrument(skip(db))]
pub async fn lead_create(
    create: Json<LeadCreateData>,
    db: &State<Database>,
) -> Result<Json<Lead>, Problem> {
    create.validate()?;

    Ok(Json(db.create_lead(create.into_inner().into_lead()).await?))
}

/// List captured leads (admin)
#[utoipa::path(
    params(("status" = Option<LeadStatus>, Query, description = "limit to one status")),
    responses(
        (status = 200, body = Vec<Lead>),
        (status = 403, description = "Admin access required", body = Problem),
    ),
    security(("jwt" = []))
)]
#[get("/leads?<status>")]
#[tracing::instrument(skip(db))]
pub async fn lead_list(
    status: Option<LeadStatus>,
    _admin: AdminUser,
    db: &State<Database>,
) -> Result<Json<Vec<Lead>>, Problem> {
    Ok(Json(db.list_leads(status).await?))
}

#[utoipa::path(params(("id", description = "lead ID")), security(("jwt" = [])))]
#[get("/leads/<id>")]
#[tracing::instrument(skip(db))]
pub async fn lead_get(
    id: Uuid,
    _admin: AdminUser,
    db: &State<Database>,
) -> Result<Option<Json<Lead>>, Problem> {
    Ok(db.get_lead(id).await?.map(Json))
}

/// Update lead status or details (admin)
#[utoipa::path(request_body = LeadUpdateData, security(("jwt" = [])))]
#[put("/leads/<id>", format = "application/json", data = "<update>")]
#[tracing::instrument(skip(db))]
pub async fn lead_update(
    id: Uuid,
    update: Json<LeadUpdateData>,
    _admin: AdminUser,
    db: &State<Database>,
) -> Result<Json<Lead>, Problem> {
    let lead = db
        .update_lead(id, update.into_inner())
        .await?
        .ok_or_else(|| problems::not_found("Lead", id))?;

    Ok(Json(lead))
}

/// Delete a lead (admin)
#[utoipa::path(security(("jwt" = [])))]
#[delete("/leads/<id>")]
#[tracing::instrument(skip(db))]
pub async fn lead_delete(
    id: Uuid,
    _admin: AdminUser,
    db: &State<Database>,
) -> Result<String, Problem> {
    match db.delete_lead(id).await? {
        Some(removed) => Ok(removed.id.to_string()),
        None => Err(problems::not_found("Lead", id)),
    }
}
