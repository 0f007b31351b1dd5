use mongodb::Database;
use rocket::serde::json::Json;
use rocket::State;
use uuid::Uuid;

use crate::data::course::db::CourseDbExt;
use crate::data::course::{Course, CourseCreateData, CourseFilters, CourseUpdateData};
use crate::resp::jwt::StaffUser;
use crate::resp::problem::{problems, Problem};

/// Browse the course catalog
#[utoipa::path(
    params(
        ("category" = Option<Uuid>, Query, description = "only courses in this category"),
        ("search" = Option<String>, Query, description = "case-insensitive title/description match"),
        ("featured" = Option<bool>, Query, description = "only featured courses"),
        ("free" = Option<bool>, Query, description = "only courses with a zero price"),
        ("include_inactive" = Option<bool>, Query, description = "staff only"),
    ),
    responses(
        (status = 200, description = "Matching courses", body = Vec<Course>),
    )
)]
#[get("/courses?<category>&<search>&<featured>&<free>&<include_inactive>")]
#[tracing::instrument(skip(db))]
pub async fn course_list(
    category: Option<Uuid>,
    search: Option<String>,
    featured: Option<bool>,
    free: Option<bool>,
    include_inactive: Option<bool>,
    staff: Option<StaffUser>,
    db: &State<Database>,
) -> Result<Json<Vec<Course>>, Problem> {
    let filters = CourseFilters {
        category,
        search,
        featured,
        free,
        // Inactive courses stay hidden from the public catalog.
        include_inactive: include_inactive.unwrap_or(false) && staff.is_some(),
    };

    Ok(Json(db.list_courses(&filters).await?))
}

/// Get course details with the lecture list
#[utoipa::path(
    params(("id", description = "course ID")),
    responses(
        (status = 200, description = "Course with nested lectures", body = Course),
        (status = 404, description = "Queried course doesn't exist"),
    )
)]
#[get("/courses/<id>")]
#[tracing::instrument(skip(db))]
pub async fn course_get(id: Uuid, db: &State<Database>) -> Result<Option<Json<Course>>, Problem> {
    Ok(db.get_course(id).await?.map(Json))
}

/// Create a course (staff)
#[utoipa::path(request_body = CourseCreateData, security(("jwt" = [])))]
#[post("/courses", format = "application/json", data = "<create>")]
#[tracing::instrument(skip(db))]
pub async fn course_create(
    create: Json<CourseCreateData>,
    _staff: StaffUser,
    db: &State<Database>,
) -> Result<Json<Course>, Problem> {
    create.validate()?;

    Ok(Json(db.create_course(create.into_inner().into_course()).await?))
}

/// Update a course (staff)
#[utoipa::path(request_body = CourseUpdateData, security(("jwt" = [])))]
#[put("/courses/<id>", format = "application/json", data = "<update>")]
#[tracing::instrument(skip(db))]
pub async fn course_update(
    id: Uuid,
    update: Json<CourseUpdateData>,
    _staff: StaffUser,
    db: &State<Database>,
) -> Result<Json<Course>, Problem> {
    update.validate()?;

    let course = db
        .update_course(id, update.into_inner())
        .await?
        .ok_or_else(|| problems::not_found("Course", id))?;

    Ok(Json(course))
}

/// Delete a course (staff)
#[utoipa::path(security(("jwt" = [])))]
#[delete("/courses/<id>")]
#[tracing::instrument(skip(db))]
pub async fn course_delete(
    id: Uuid,
    _staff: StaffUser,
    db: &State<Database>,
) -> Result<String, Problem> {
    match db.delete_course(id).await? {
        Some(removed) => Ok(removed.id.to_string()),
        None => Err(problems::not_found("Course", id)),
    }
}
