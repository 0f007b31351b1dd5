use mongodb::Database;
use rocket::serde::json::Json;
use rocket::State;
use uuid::Uuid;

use crate::data::study_abroad::db::StudyAbroadDbExt;
use crate::data::study_abroad::{
    InquiryCreateData, InquiryStatus, InquiryUpdateData, ServiceCreateData, ServiceUpdateData,
    StudyAbroadInquiry, StudyAbroadService,
};
use crate::resp::jwt::{AdminUser, StaffUser};
use crate::resp::problem::{problems, Problem};

/// List study-abroad catalog services
#[utoipa::path(responses((status = 200, body = Vec<StudyAbroadService>)))]
#[get("/study-abroad-services?<include_inactive>")]
#[tracing::instrument(skip(db))]
pub async fn service_list(
    include_inactive: Option<bool>,
    staff: Option<StaffUser>,
    db: &State<Database>,
) -> Result<Json<Vec<StudyAbroadService>>, Problem> {
    let include_inactive = include_inactive.unwrap_or(false) && staff.is_some();

    Ok(Json(db.list_services(include_inactive).await?))
}

#[utoipa::path(params(("id", description = "service ID")))]
#[get("/study-abroad-services/<id>")]
#[tracing::instrument(skip(db))]
pub async fn service_get(
    id: Uuid,
    db: &State<Database>,
) -> Result<Option<Json<StudyAbroadService>>, Problem> {
    Ok(db.get_service(id).await?.map(Json))
}

/// Look a service up by its URL slug
#[utoipa::path(
    params(("slug", description = "URL-safe service identifier")),
    responses(
        (status = 200, description = "Matching service", body = StudyAbroadService),
        (status = 404, description = "No service with this slug"),
    )
)]
#[get("/study-abroad-services/slug/<slug>")]
#[tracing::instrument(skip(db))]
pub async fn service_get_by_slug(
    slug: &str,
    db: &State<Database>,
) -> Result<Option<Json<StudyAbroadService>>, Problem> {
    Ok(db.find_service_by_slug(slug).await?.map(Json))
}

/// Create a service (admin)
#[utoipa::path(
    request_body = ServiceCreateData,
    responses(
        (status = 200, description = "Created service with derived slug", body = StudyAbroadService),
        (status = 400, description = "Empty title or slug collision", body = Problem),
    ),
    security(("jwt" = []))
)]
#[post("/study-abroad-services", format = "application/json", data = "<create>")]
#[tracing::instrument(skip(db))]
pub async fn service_create(
    create: Json<ServiceCreateData>,
    _admin: AdminUser,
    db: &State<Database>,
) -> Result<Json<StudyAbroadService>, Problem> {
    create.validate()?;

    let service = create.into_inner().into_service();
    if service.slug.is_empty() {
        return Err(problems::validation(
            "slug",
            "Title doesn't reduce to a usable slug.",
        ));
    }

    Ok(Json(db.create_service(service).await?))
}

/// Update a service (admin)
#[utoipa::path(request_body = ServiceUpdateData, security(("jwt" = [])))]
#[put("/study-abroad-services/<id>", format = "application/json", data = "<update>")]
#[tracing::instrument(skip(db))]
pub async fn service_update(
    id: Uuid,
    update: Json<ServiceUpdateData>,
    _admin: AdminUser,
    db: &State<Database>,
) -> Result<Json<StudyAbroadService>, Problem> {
    let service = db
        .update_service(id, update.into_inner())
        .await?
        .ok_or_else(|| problems::not_found("Service", id))?;

    Ok(Json(service))
}

/// Delete a service (admin)
#[utoipa::path(security(("jwt" = [])))]
#[delete("/study-abroad-services/<id>")]
#[tracing::instrument(skip(db))]
pub async fn service_delete(
    id: Uuid,
    _admin: AdminUser,
    db: &State<Database>,
) -> Result<String, Problem> {
    match db.delete_service(id).await? {
        Some(removed) => Ok(removed.id.to_string()),
        None => Err(problems::not_found("Service", id)),
    }
}

/// Submit a study-abroad inquiry; no authentication required
#[utoipa::path(
    request_body = InquiryCreateData,
    responses(
        (status = 200, description = "Stored inquiry", body = StudyAbroadInquiry),
        (status = 400, description = "Missing name or invalid email", body = Problem),
    )
)]
#[post("/study-abroad-inquiries", format = "application/json", data = "<create>")]
#[tracing::instrument(skip(db))]
pub async fn inquiry_create(
    create: Json<InquiryCreateData>,
    db: &State<Database>,
) -> Result<Json<StudyAbroadInquiry>, Problem> {
    create.validate()?;

    Ok(Json(db.create_inquiry(create.into_inner().into_inquiry()).await?))
}

/// List inquiries (admin)
#[utoipa::path(
    params(("status" = Option<InquiryStatus>, Query, description = "limit to one status")),
    responses(
        (status = 200, body = Vec<StudyAbroadInquiry>),
        (status = 403, description = "Admin access required", body = Problem),
    ),
    security(("jwt" = []))
)]
#[get("/study-abroad-inquiries?<status>")]
#[tracing::instrument(skip(db))]
pub async fn inquiry_list(
    status: Option<InquiryStatus>,
    _admin: AdminUser,
    db: &State<Database>,
) -> Result<Json<Vec<StudyAbroadInquiry>>, Problem> {
    Ok(Json(db.list_inquiries(status).await?))
}

#[utoipa::path(params(("id", description = "inquiry ID")), security(("jwt" = [])))]
#[get("/study-abroad-inquiries/<id>")]
#[tracing::instrument(skip(db))]
pub async fn inquiry_get(
    id: Uuid,
    _admin: AdminUser,
    db: &State<Database>,
) -> Result<Option<Json<StudyAbroadInquiry>>, Problem> {
    Ok(db.get_inquiry(id).await?.map(Json))
}

/// Move an inquiry through its workflow (admin)
#[utoipa::path(request_body = InquiryUpdateData, security(("jwt" = [])))]
#[put("/study-abroad-inquiries/<id>", format = "application/json", data = "<update>")]
#[tracing::instrument(skip(db))]
pub async fn inquiry_update(
    id: Uuid,
    update: Json<InquiryUpdateData>,
    _admin: AdminUser,
    db: &State<Database>,
) -> Result<Json<StudyAbroadInquiry>, Problem> {
    let inquiry = db
        .update_inquiry(id, update.into_inner())
        .await?
        .ok_or_else(|| problems::not_found("Inquiry", id))?;

    Ok(Json(inquiry))
}

/// Delete an inquiry (admin)
#[utoipa::path(security(("jwt" = [])))]
#[delete("/study-abroad-inquiries/<id>")]
#[tracing::instrument(skip(db))]
pub async fn inquiry_delete(
    id: Uuid,
    _admin: AdminUser,
    db: &State<Database>,
) -> Result<String, Problem> {
    match db.delete_inquiry(id).await? {
        Some(removed) => Ok(removed.id.to_string()),
        None => Err(problems::not_found("Inquiry", id)),
    }
}
