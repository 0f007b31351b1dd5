use mongodb::Database;
use rocket::serde::json::Json;
use rocket::State;
use uuid::Uuid;

use crate::data::course::db::CourseDbExt;
use crate::data::enrollment::db::EnrollmentDbExt;
use crate::data::enrollment::{Enrollment, EnrollmentCreateData, EnrollmentUpdateData};
use crate::resp::jwt::UserRoleToken;
use crate::resp::problem::{problems, Problem};

/// Enroll the authenticated user in a course
#[utoipa::path(
    request_body = EnrollmentCreateData,
    responses(
        (status = 200, description = "Created enrollment", body = Enrollment),
        (status = 400, description = "Already enrolled or course unavailable", body = Problem),
        (status = 404, description = "Course doesn't exist", body = Problem),
    ),
    security(("jwt" = []))
)]
#[post("/enrollments", format = "application/json", data = "<create>")]
#[tracing::instrument(skip(db))]
pub async fn enrollment_create(
    create: Json<EnrollmentCreateData>,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<Enrollment>, Problem> {
    let course_id = create.course_id;

    let course = db
        .get_course(course_id)
        .await?
        .ok_or_else(|| problems::not_found("Course", course_id))?;
    if !course.is_active {
        return Err(problems::validation(
            "course_id",
            "Course isn't open for enrollment.",
        ));
    }

    let enrollment = db
        .create_enrollment(Enrollment::new(auth.user, course_id))
        .await?;
    db.increment_enrolled_count(course_id).await?;

    Ok(Json(enrollment))
}

/// List enrollments; students see only their own
#[utoipa::path(
    params(
        ("user" = Option<Uuid>, Query, description = "staff only"),
        ("course" = Option<Uuid>, Query, description = "limit to one course"),
    ),
    responses((status = 200, body = Vec<Enrollment>)),
    security(("jwt" = []))
)]
#[get("/enrollments?<user>&<course>")]
#[tracing::instrument(skip(db))]
pub async fn enrollment_list(
    user: Option<Uuid>,
    course: Option<Uuid>,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<Vec<Enrollment>>, Problem> {
    let user = if auth.role.can_manage_content() {
        user
    } else {
        Some(auth.user)
    };

    Ok(Json(db.list_enrollments(user, course).await?))
}

#[utoipa::path(params(("id", description = "enrollment ID")), security(("jwt" = [])))]
#[get("/enrollments/<id>")]
#[tracing::instrument(skip(db))]
pub async fn enrollment_get(
    id: Uuid,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Option<Json<Enrollment>>, Problem> {
    let enrollment = match db.get_enrollment(id).await? {
        Some(it) => it,
        None => return Ok(None),
    };

    if enrollment.user_id != auth.user && !auth.role.can_manage_content() {
        return Err(problems::access_denied());
    }

    Ok(Some(Json(enrollment)))
}

/// Update progress or completion on an enrollment
#[utoipa::path(
    request_body = EnrollmentUpdateData,
    responses(
        (status = 200, description = "Updated enrollment", body = Enrollment),
        (status = 400, description = "Progress out of bounds", body = Problem),
        (status = 403, description = "Not own enrollment and not staff", body = Problem),
        (status = 404, description = "Queried enrollment doesn't exist", body = Problem),
    ),
    security(("jwt" = []))
)]
#[put("/enrollments/<id>", format = "application/json", data = "<update>")]
#[tracing::instrument(skip(db))]
pub async fn enrollment_update(
    id: Uuid,
    update: Json<EnrollmentUpdateData>,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<Enrollment>, Problem> {
    update.validate()?;

    let existing = db
        .get_enrollment(id)
        .await?
        .ok_or_else(|| problems::not_found("Enrollment", id))?;
    if existing.user_id != auth.user && !auth.role.can_manage_content() {
        return Err(problems::access_denied());
    }

    let enrollment = db
        .update_enrollment(id, update.into_inner())
        .await?
        .ok_or_else(|| problems::not_found("Enrollment", id))?;

    Ok(Json(enrollment))
}
