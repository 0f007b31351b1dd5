use mongodb::Database;
use rocket::serde::json::Json;
use rocket::State;
use uuid::Uuid;

use crate::data::category::db::CategoryDbExt;
use crate::data::category::{Category, CategoryCreateData, CategoryUpdateData};
use crate::resp::jwt::StaffUser;
use crate::resp::problem::{problems, Problem};

/// List course categories
#[utoipa::path(responses((status = 200, body = Vec<Category>)))]
#[get("/categories?<include_inactive>")]
#[tracing::instrument(skip(db))]
pub async fn category_list(
    include_inactive: Option<bool>,
    staff: Option<StaffUser>,
    db: &State<Database>,
) -> Result<Json<Vec<Category>>, Problem> {
    let include_inactive = include_inactive.unwrap_or(false) && staff.is_some();

    Ok(Json(db.list_categories(include_inactive).await?))
}

#[utoipa::path(params(("id", description = "category ID")))]
#[get("/categories/<id>")]
#[tracing::instrument(skip(db))]
pub async fn category_get(
    id: Uuid,
    db: &State<Database>,
) -> Result<Option<Json<Category>>, Problem> {
    Ok(db.get_category(id).await?.map(Json))
}

/// Create a category (staff)
#[utoipa::path(request_body = CategoryCreateData, security(("jwt" = [])))]
#[post("/categories", format = "application/json", data = "<create>")]
#[tracing::instrument(skip(db))]
pub async fn category_create(
    create: Json<CategoryCreateData>,
    _staff: StaffUser,
    db: &State<Database>,
) -> Result<Json<Category>, Problem> {
    create.validate()?;

    Ok(Json(
        db.create_category(create.into_inner().into_category()).await?,
    ))
}

/// Update a category (staff)
#[utoipa::path(request_body = CategoryUpdateData, security(("jwt" = [])))]
#[put("/categories/<id>", format = "application/json", data = "<update>")]
#[tracing::instrument(skip(db))]
pub async fn category_update(
    id: Uuid,
    update: Json<CategoryUpdateData>,
    _staff: StaffUser,
    db: &State<Database>,
) -> Result<Json<Category>, Problem> {
    let category = db
        .update_category(id, update.into_inner())
        .await?
        .ok_or_else(|| problems::not_found("Category", id))?;

    Ok(Json(category))
}

/// Delete a category (staff)
#[utoipa::path(security(("jwt" = [])))]
#[delete("/categories/<id>")]
#[tracing::instrument(skip(db))]
pub async fn category_delete(
    id: Uuid,
    _staff: StaffUser,
    db: &State<Database>,
) -> Result<String, Problem> {
    match db.delete_category(id).await? {
        Some(removed) => Ok(removed.id.to_string()),
        None => Err(problems::not_found("Category", id)),
    }
}
