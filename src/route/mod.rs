use std::collections::BTreeMap;

use rocket::{Build, Catcher, Request, Rocket, Route};

pub mod branches;
pub mod categories;
pub mod courses;
pub mod dashboard;
pub mod enrollments;
pub mod events;
pub mod leads;
pub mod mock_tests;
pub mod notifications;
pub mod study_abroad;
pub mod users;

use branches::*;
use categories::*;
use courses::*;
use dashboard::*;
use enrollments::*;
use events::*;
use leads::*;
use mock_tests::*;
use notifications::*;
use study_abroad::*;
use users::*;

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    data::{
        branch::{Branch, BranchCreateData, BranchUpdateData},
        category::{Category, CategoryCreateData, CategoryUpdateData},
        course::{Course, CourseCreateData, CourseFormat, CourseUpdateData, Lecture},
        enrollment::{Enrollment, EnrollmentCreateData, EnrollmentUpdateData},
        event::{Event, EventCreateData, EventRegistration, EventUpdateData},
        lead::{Lead, LeadCreateData, LeadStatus, LeadUpdateData},
        mock_test::{
            AttemptUpdateData, MockTest, MockTestAttempt, MockTestCreateData, MockTestUpdateData,
            Question,
        },
        notification::{
            DeliveryStatus, Notification, NotificationChannel, NotificationCreateData,
            NotificationStatusUpdate,
        },
        study_abroad::{
            InquiryCreateData, InquiryStatus, InquiryUpdateData, Priority, ServiceCreateData,
            ServiceUpdateData, StudyAbroadInquiry, StudyAbroadService,
        },
        user::db::{UserLoginData, UserSignupData, UserUpdateData},
        user::UserResponse,
    },
    resp::{
        jwt::{self, doc::JWTAuth},
        problem::{problems, Problem},
    },
    role::Role,
};

// Guard failures abort the request before any handler runs; these catchers
// turn them back into the problem documents the guards built.
#[catch(401)]
fn unauthorized(req: &Request) -> Problem {
    jwt::stashed_problem(req)
        .unwrap_or_else(|| jwt::auth_problem("No valid bearer token in Authorization header."))
}

#[catch(403)]
fn forbidden(req: &Request) -> Problem {
    jwt::stashed_problem(req).unwrap_or_else(problems::access_denied)
}

pub fn api_catchers() -> Vec<Catcher> {
    catchers![unauthorized, forbidden]
}

#[derive(OpenApi)]
#[openapi(
    paths(
        users::auth_register,
        users::auth_login,
        users::auth_verify,
        users::auth_refresh,
        users::user_list,
        users::user_get,
        users::user_update,
        users::user_delete,
        courses::course_list,
        courses::course_get,
        courses::course_create,
        courses::course_update,
        courses::course_delete,
        categories::category_list,
        categories::category_get,
        categories::category_create,
        categories::category_update,
        categories::category_delete,
        branches::branch_list,
        branches::branch_get,
        branches::branch_create,
        branches::branch_update,
        branches::branch_delete,
        enrollments::enrollment_create,
        enrollments::enrollment_list,
        enrollments::enrollment_get,
        enrollments::enrollment_update,
        mock_tests::test_list,
        mock_tests::test_get,
        mock_tests::test_create,
        mock_tests::test_update,
        mock_tests::test_delete,
        mock_tests::attempt_start,
        mock_tests::attempt_list,
        mock_tests::attempt_update,
        events::event_list,
        events::event_get,
        events::event_create,
        events::event_update,
        events::event_delete,
        events::event_register,
        events::event_registrations,
        leads::lead_create,
        leads::lead_list,
        leads::lead_get,
        leads::lead_update,
        leads::lead_delete,
        study_abroad::service_list,
        study_abroad::service_get,
        study_abroad::service_get_by_slug,
        study_abroad::service_create,
        study_abroad::service_update,
        study_abroad::service_delete,
        study_abroad::inquiry_create,
        study_abroad::inquiry_list,
        study_abroad::inquiry_get,
        study_abroad::inquiry_update,
        study_abroad::inquiry_delete,
        notifications::notification_list,
        notifications::notification_create,
        notifications::notification_status,
        notifications::notification_read,
        notifications::notification_delete,
        dashboard::dashboard_stats,
    ),
    components(schemas(
        Role,
        Problem,
        UserResponse,
        UserSignupData,
        UserLoginData,
        UserUpdateData,
        users::AuthResponse,
        users::TokenResponse,
        Category,
        CategoryCreateData,
        CategoryUpdateData,
        Branch,
        BranchCreateData,
        BranchUpdateData,
        Course,
        CourseFormat,
        Lecture,
        CourseCreateData,
        CourseUpdateData,
        Enrollment,
        EnrollmentCreateData,
        EnrollmentUpdateData,
        MockTest,
        Question,
        MockTestAttempt,
        MockTestCreateData,
        MockTestUpdateData,
        AttemptUpdateData,
        mock_tests::MockTestView,
        mock_tests::QuestionView,
        Event,
        EventRegistration,
        EventCreateData,
        EventUpdateData,
        Lead,
        LeadStatus,
        LeadCreateData,
        LeadUpdateData,
        StudyAbroadService,
        StudyAbroadInquiry,
        InquiryStatus,
        Priority,
        ServiceCreateData,
        ServiceUpdateData,
        InquiryCreateData,
        InquiryUpdateData,
        Notification,
        NotificationChannel,
        DeliveryStatus,
        NotificationCreateData,
        NotificationStatusUpdate,
        dashboard::DashboardStats,
    )),
    modifiers(&JWTAuth, &API_PREFIX)
)]
pub struct ApiDoc;

pub struct PathPrefix(pub &'static str);
static API_PREFIX: PathPrefix = PathPrefix("/api");

impl utoipa::Modify for PathPrefix {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let mut new_paths = BTreeMap::new();

        for (path, item) in std::mem::take(&mut openapi.paths.paths) {
            new_paths.insert(self.0.to_string() + path.as_ref(), item);
        }

        openapi.paths.paths = new_paths;
    }
}

pub fn api() -> Vec<Route> {
    routes![
        auth_register,
        auth_login,
        auth_verify,
        auth_refresh,
        user_list,
        user_get,
        user_update,
        user_delete,
        course_list,
        course_get,
        course_create,
        course_update,
        course_delete,
        category_list,
        category_get,
        category_create,
        category_update,
        category_delete,
        branch_list,
        branch_get,
        branch_create,
        branch_update,
        branch_delete,
        enrollment_create,
        enrollment_list,
        enrollment_get,
        enrollment_update,
        test_list,
        test_get,
        test_create,
        test_update,
        test_delete,
        attempt_start,
        attempt_list,
        attempt_update,
        event_list,
        event_get,
        event_create,
        event_update,
        event_delete,
        event_register,
        event_registrations,
        lead_create,
        lead_list,
        lead_get,
        lead_update,
        lead_delete,
        service_list,
        service_get,
        service_get_by_slug,
        service_create,
        service_update,
        service_delete,
        inquiry_create,
        inquiry_list,
        inquiry_get,
        inquiry_update,
        inquiry_delete,
        notification_list,
        notification_create,
        notification_status,
        notification_read,
        notification_delete,
        dashboard_stats,
    ]
}

pub fn mount_api(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket
        .mount("/api", api())
        .register("/api", api_catchers())
        .mount(
            "/",
            SwaggerUi::new("/swagger/<_..>").url("/api/openapi.json", ApiDoc::openapi()),
        )
}

#[cfg(all(test, feature = "generate-security"))]
mod tests {
    use super::*;

    use mongodb::options::{ClientOptions, ServerAddress};
    use rocket::http::{ContentType, Header, Status};
    use rocket::local::blocking::Client;
    use rsa::pkcs1::{EncodeRsaPrivateKey, LineEnding};
    use rsa::pkcs8::EncodePublicKey;

    use crate::config::Config;
    use crate::data::user::User;
    use crate::resp::jwt::UserRoleToken;
    use crate::security::{KeySet, Security};

    fn test_security() -> Security {
        let mut rng = rand::thread_rng();
        let sk = rsa::RsaPrivateKey::new(&mut rng, 2048).expect("unable to generate RSA key");

        let private = sk
            .to_pkcs1_pem(LineEnding::LF)
            .expect("unable to encode private key")
            .to_string()
            .into_bytes();
        let public = sk
            .to_public_key()
            .to_public_key_der()
            .expect("unable to encode public key")
            .to_pem("PUBLIC KEY", LineEnding::LF)
            .expect("unable to encode public key pem")
            .into_bytes();

        Security {
            salt: rand::random(),
            jwt_keys: KeySet { public, private },
        }
    }

    // None of these requests reach the database; the handle only has to
    // exist in managed state.
    fn test_client() -> (Client, Security) {
        let security = test_security();
        // mongodb spawns its monitoring task on the current Tokio runtime,
        // which plain `#[test]` functions do not provide.
        let rt = Box::leak(Box::new(
            tokio::runtime::Runtime::new().expect("runtime must build"),
        ));
        let _guard = rt.enter();
        let options = ClientOptions::builder()
            .hosts(vec![ServerAddress::Tcp {
                host: "localhost".to_string(),
                port: Some(27017),
            }])
            .build();
        let db = mongodb::Client::with_options(options)
            .expect("client options must be valid")
            .database("edupath_test");

        let rocket = mount_api(
            rocket::build()
                .manage(Config::default())
                .manage(security.clone())
                .manage(db),
        );

        (
            Client::untracked(rocket).expect("rocket must build"),
            security,
        )
    }

    fn bearer(user: &User, security: &Security) -> Header<'static> {
        let token = UserRoleToken::new(user)
            .encode_jwt(&security.jwt_keys.private)
            .expect("token must encode");
        Header::new("Authorization", format!("Bearer {token}"))
    }

    #[test]
    fn unauthenticated_inquiry_list_is_admin_gated() {
        let (client, _) = test_client();

        let response = client.get("/api/study-abroad-inquiries").dispatch();

        assert_eq!(response.status(), Status::Forbidden);
        assert_eq!(
            response.content_type(),
            Some(ContentType::new("application", "problem+json"))
        );
        let body = response.into_string().expect("body must be readable");
        assert!(body.contains("Admin access required."));
    }

    #[test]
    fn missing_token_renders_auth_problem() {
        let (client, _) = test_client();

        let response = client.post("/api/auth/refresh").dispatch();

        assert_eq!(response.status(), Status::Unauthorized);
        assert_eq!(
            response.content_type(),
            Some(ContentType::new("application", "problem+json"))
        );
        let body = response.into_string().expect("body must be readable");
        assert!(body.contains("Unable to authorize user."));
    }

    #[test]
    fn issued_token_refreshes_over_http() {
        let (client, security) = test_client();
        let user = User::new("amit@example.com", "amit_k", "password123", &security.salt);

        let response = client
            .post("/api/auth/refresh")
            .header(bearer(&user, &security))
            .dispatch();

        assert_eq!(response.status(), Status::Ok);
        let body: serde_json::Value =
            serde_json::from_str(&response.into_string().expect("body must be readable"))
                .expect("body must be JSON");
        assert!(body["token"].is_string());
        assert!(body["expires_at"].is_string());
    }

    #[test]
    fn student_token_cannot_manage_content() {
        let (client, security) = test_client();
        let user = User::new("amit@example.com", "amit_k", "password123", &security.salt);

        let response = client
            .post("/api/courses")
            .header(ContentType::JSON)
            .header(bearer(&user, &security))
            .body("{}")
            .dispatch();

        assert_eq!(response.status(), Status::Forbidden);
        let body = response.into_string().expect("body must be readable");
        assert!(body.contains("Access denied."));
    }
}
