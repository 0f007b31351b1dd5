use chrono::{DateTime, Utc};
use mongodb::Database;
use rocket::serde::json::Json;
use rocket::State;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::data::mock_test::db::MockTestDbExt;
use crate::data::mock_test::{
    AttemptUpdateData, MockTest, MockTestAttempt, MockTestCreateData, MockTestUpdateData, Question,
};
use crate::resp::jwt::{StaffUser, UserRoleToken};
use crate::resp::problem::{problems, Problem};

/// Test question as shown to a candidate; the correct option never leaves
/// the server through read endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct QuestionView {
    pub id: Uuid,
    pub text: String,
    pub options: Vec<String>,
    pub marks: u32,
}

impl From<Question> for QuestionView {
    fn from(q: Question) -> Self {
        QuestionView {
            id: q.id,
            text: q.text,
            options: q.options,
            marks: q.marks,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MockTestView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category_id: Option<Uuid>,
    pub duration_minutes: u32,
    pub total_questions: u32,
    pub total_marks: u32,
    pub passing_marks: u32,
    pub questions: Vec<QuestionView>,
    pub is_active: bool,
    pub created: DateTime<Utc>,
}

impl From<MockTest> for MockTestView {
    fn from(test: MockTest) -> Self {
        MockTestView {
            id: test.id,
            title: test.title,
            description: test.description,
            category_id: test.category_id,
            duration_minutes: test.duration_minutes,
            total_questions: test.total_questions,
            total_marks: test.total_marks,
            passing_marks: test.passing_marks,
            questions: test.questions.into_iter().map(QuestionView::from).collect(),
            is_active: test.is_active,
            created: test.created,
        }
    }
}

/// List available mock tests
#[utoipa::path(responses((status = 200, body = Vec<MockTestView>)))]
#[get("/mock-tests?<include_inactive>")]
#[tracing::instrument(skip(db))]
pub async fn test_list(
    include_inactive: Option<bool>,
    staff: Option<StaffUser>,
    db: &State<Database>,
) -> Result<Json<Vec<MockTestView>>, Problem> {
    let include_inactive = include_inactive.unwrap_or(false) && staff.is_some();
    let tests = db.list_mock_tests(include_inactive).await?;

    Ok(Json(tests.into_iter().map(MockTestView::from).collect()))
}

#[utoipa::path(params(("id", description = "mock test ID")))]
#[get("/mock-tests/<id>")]
#[tracing::instrument(skip(db))]
pub async fn test_get(
    id: Uuid,
    db: &State<Database>,
) -> Result<Option<Json<MockTestView>>, Problem> {
    Ok(db.get_mock_test(id).await?.map(|t| Json(MockTestView::from(t))))
}

/// Create a mock test with its question bank (staff)
#[utoipa::path(
    request_body = MockTestCreateData,
    responses(
        (status = 200, description = "Created test, answers included", body = MockTest),
        (status = 400, description = "Inconsistent marks or question data", body = Problem),
    ),
    security(("jwt" = []))
)]
#[post("/mock-tests", format = "application/json", data = "<create>")]
#[tracing::instrument(skip(db))]
pub async fn test_create(
    create: Json<MockTestCreateData>,
    _staff: StaffUser,
    db: &State<Database>,
) -> Result<Json<MockTest>, Problem> {
    create.validate()?;

    Ok(Json(
        db.create_mock_test(create.into_inner().into_mock_test()).await?,
    ))
}

/// Update mock test metadata (staff)
#[utoipa::path(request_body = MockTestUpdateData, security(("jwt" = [])))]
#[put("/mock-tests/<id>", format = "application/json", data = "<update>")]
#[tracing::instrument(skip(db))]
pub async fn test_update(
    id: Uuid,
    update: Json<MockTestUpdateData>,
    _staff: StaffUser,
    db: &State<Database>,
) -> Result<Json<MockTest>, Problem> {
    let test = db
        .update_mock_test(id, update.into_inner())
        .await?
        .ok_or_else(|| problems::not_found("Mock test", id))?;

    Ok(Json(test))
}

/// Delete a mock test (staff)
#[utoipa::path(security(("jwt" = [])))]
#[delete("/mock-tests/<id>")]
#[tracing::instrument(skip(db))]
pub async fn test_delete(
    id: Uuid,
    _staff: StaffUser,
    db: &State<Database>,
) -> Result<String, Problem> {
    match db.delete_mock_test(id).await? {
        Some(removed) => Ok(removed.id.to_string()),
        None => Err(problems::not_found("Mock test", id)),
    }
}

/// Start an attempt at a mock test
#[utoipa::path(
    params(("id", description = "mock test ID")),
    responses(
        (status = 200, description = "Fresh attempt", body = MockTestAttempt),
        (status = 400, description = "Test isn't active", body = Problem),
        (status = 404, description = "Queried test doesn't exist", body = Problem),
    ),
    security(("jwt" = []))
)]
#[post("/mock-tests/<id>/start")]
#[tracing::instrument(skip(db))]
pub async fn attempt_start(
    id: Uuid,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<MockTestAttempt>, Problem> {
    let test = db
        .get_mock_test(id)
        .await?
        .ok_or_else(|| problems::not_found("Mock test", id))?;
    if !test.is_active {
        return Err(problems::validation("id", "Mock test isn't active."));
    }

    let attempt = db
        .create_attempt(MockTestAttempt::new(id, auth.user))
        .await?;

    Ok(Json(attempt))
}

/// List attempts; students see only their own
#[utoipa::path(
    params(
        ("user" = Option<Uuid>, Query, description = "staff only"),
        ("test" = Option<Uuid>, Query, description = "limit to one test"),
    ),
    responses((status = 200, body = Vec<MockTestAttempt>)),
    security(("jwt" = []))
)]
#[get("/mock-test-attempts?<user>&<test>")]
#[tracing::instrument(skip(db))]
pub async fn attempt_list(
    user: Option<Uuid>,
    test: Option<Uuid>,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<Vec<MockTestAttempt>>, Problem> {
    let user = if auth.role.can_manage_content() {
        user
    } else {
        Some(auth.user)
    };

    Ok(Json(db.list_attempts(user, test).await?))
}

/// Record answers, score and completion on an attempt
#[utoipa::path(
    request_body = AttemptUpdateData,
    responses(
        (status = 200, description = "Updated attempt", body = MockTestAttempt),
        (status = 403, description = "Not own attempt and not staff", body = Problem),
        (status = 404, description = "Queried attempt doesn't exist", body = Problem),
    ),
    security(("jwt" = []))
)]
#[put("/mock-test-attempts/<id>", format = "application/json", data = "<update>")]
#[tracing::instrument(skip(db))]
pub async fn attempt_update(
    id: Uuid,
    update: Json<AttemptUpdateData>,
    auth: UserRoleToken,
    db: &State<Database>,
) -> Result<Json<MockTestAttempt>, Problem> {
    let existing = db
        .get_attempt(id)
        .await?
        .ok_or_else(|| problems::not_found("Attempt", id))?;
    if existing.user_id != auth.user && !auth.role.can_manage_content() {
        return Err(problems::access_denied());
    }

    let attempt = db
        .update_attempt(id, update.into_inner())
        .await?
        .ok_or_else(|| problems::not_found("Attempt", id))?;

    Ok(Json(attempt))
}
