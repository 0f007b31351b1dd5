use mongodb::Database;
use rocket::serde::json::Json;
use rocket::State;
use serde::Serialize;
use utoipa::ToSchema;

use crate::data::course::db::CourseDbExt;
use crate::data::enrollment::db::EnrollmentDbExt;
use crate::data::event::db::EventDbExt;
use crate::data::lead::db::LeadDbExt;
use crate::data::mock_test::db::MockTestDbExt;
use crate::data::study_abroad::db::StudyAbroadDbExt;
use crate::data::user::db::UserDbExt;
use crate::resp::jwt::UserRoleToken;
use crate::resp::problem::Problem;
use crate::role::Role;

/// Aggregate counts scoped to what the caller is allowed to see. Admins get
/// platform-wide numbers, instructors their own teaching footprint, everyone
/// else their own activity.
#[derive(Debug, Default, Serialize, ToSchema)]
pub struct DashboardStats {
    pub enrollments: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub courses: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leads: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_leads: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inquiries: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mock_test_attempts: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_registrations: Option<u64>,
}

#[utoipa::path(
    responses(
        (status = 200, description = "Role-dependent aggregate counts", body = DashboardStats),
        (status = 401, description = "Missing/expired token", body = Problem),
    ),
    security(("jwt" = []))
)]
#[get("/dashboard/stats")]
#[tracing::instrument(skip(db))]
pub async fn dashboard_stats(
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<DashboardStats>, Problem> {
    use crate::data::lead::LeadStatus;

    let mut stats = DashboardStats::default();

    match auth.role {
        Role::Admin => {
            stats.users = Some(db.count_users().await?);
            stats.courses = Some(db.count_courses().await?);
            stats.enrollments = db.count_enrollments(None).await?;
            stats.events = Some(db.count_events().await?);
            stats.leads = Some(db.count_leads(None).await?);
            stats.new_leads = Some(db.count_leads(Some(LeadStatus::New)).await?);
            stats.inquiries = Some(db.count_inquiries(None).await?);
        }
        Role::Instructor => {
            stats.courses = Some(db.count_courses_by_instructor(auth.user).await?);
            let own_courses = db.list_course_ids_by_instructor(auth.user).await?;
            stats.enrollments = db.count_enrollments_in_courses(&own_courses).await?;
        }
        _ => {
            stats.enrollments = db.count_enrollments(Some(auth.user)).await?;
            stats.mock_test_attempts = Some(db.count_attempts(Some(auth.user)).await?);
            stats.event_registrations = Some(db.count_registrations(Some(auth.user)).await?);
        }
    }

    Ok(Json(stats))
}
