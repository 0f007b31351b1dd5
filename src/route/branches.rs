use mongodb::Database;
use rocket::serde::json::Json;
use rocket::State;
use uuid::Uuid;

use crate::data::branch::db::BranchDbExt;
use crate::data::branch::{Branch, BranchCreateData, BranchUpdateData};
use crate::resp::jwt::StaffUser;
use crate::resp::problem::{problems, Problem};

/// List branch offices
#[utoipa::path(responses((status = 200, body = Vec<Branch>)))]
#[get("/branches?<include_inactive>")]
#[tracing::instrument(skip(db))]
pub async fn branch_list(
    include_inactive: Option<bool>,
    staff: Option<StaffUser>,
    db: &State<Database>,
) -> Result<Json<Vec<Branch>>, Problem> {
    let include_inactive = include_inactive.unwrap_or(false) && staff.is_some();

    Ok(Json(db.list_branches(include_inactive).await?))
}

#[utoipa::path(params(("id", description = "branch ID")))]
#[get("/branches/<id>")]
#[tracing::instrument(skip(db))]
pub async fn branch_get(id: Uuid, db: &State<Database>) -> Result<Option<Json<Branch>>, Problem> {
    Ok(db.get_branch(id).await?.map(Json))
}

/// Create a branch (staff)
#[utoipa::path(request_body = BranchCreateData, security(("jwt" = [])))]
#[post("/branches", format = "application/json", data = "<create>")]
#[tracing::instrument(skip(db))]
pub async fn branch_create(
    create: Json<BranchCreateData>,
    _staff: StaffUser,
    db: &State<Database>,
) -> Result<Json<Branch>, Problem> {
    create.validate()?;

    Ok(Json(db.create_branch(create.into_inner().into_branch()).await?))
}

/// Update a branch (staff)
#[utoipa::path(request_body = BranchUpdateData, security(("jwt" = [])))]
#[put("/branches/<id>", format = "application/json", data = "<update>")]
#[tracing::instrument(skip(db))]
pub async fn branch_update(
    id: Uuid,
    update: Json<BranchUpdateData>,
    _staff: StaffUser,
    db: &State<Database>,
) -> Result<Json<Branch>, Problem> {
    let branch = db
        .update_branch(id, update.into_inner())
        .await?
        .ok_or_else(|| problems::not_found("Branch", id))?;

    Ok(Json(branch))
}

/// Delete a branch (staff)
#[utoipa::path(security(("jwt" = [])))]
#[delete("/branches/<id>")]
#[tracing::instrument(skip(db))]
pub async fn branch_delete(
    id: Uuid,
    _staff: StaffUser,
    db: &State<Database>,
) -> Result<String, Problem> {
    match db.delete_branch(id).await? {
        Some(removed) => Ok(removed.id.to_string()),
        None => Err(problems::not_found("Branch", id)),
    }
}
