use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rocket::http::Status;
use rocket::request::{self, FromRequest, Request};
use serde::{Deserialize, Serialize};

use crate::data::user::User;
use crate::resp::problem::{problems, Problem};
use crate::role::Role;
use crate::security::Security;
use crate::util::date_time_as_unix_seconds;
use rocket::outcome::Outcome::{Error, Success};
use uuid::Uuid;

pub static AUTH_HEADER_NAME: &str = "Authorization";
pub static BEARER_PREFIX: &str = "Bearer ";

/// Access tokens expire after 24 hours; clients re-authenticate or refresh.
pub const TOKEN_VALIDITY_HOURS: i64 = 24;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRoleToken {
    #[serde(with = "date_time_as_unix_seconds")]
    iat: DateTime<Utc>,
    #[serde(with = "date_time_as_unix_seconds")]
    exp: DateTime<Utc>,
    pub user: Uuid,
    pub role: Role,
}

impl UserRoleToken {
    pub fn new(user: &User) -> UserRoleToken {
        let now = Utc::now();
        UserRoleToken {
            iat: now,
            exp: now + Duration::hours(TOKEN_VALIDITY_HOURS),
            user: user.id,
            role: user.user_role,
        }
    }

    /// New token for the same user and role with a fresh validity window.
    pub fn refreshed(&self) -> UserRoleToken {
        let now = Utc::now();
        UserRoleToken {
            iat: now,
            exp: now + Duration::hours(TOKEN_VALIDITY_HOURS),
            user: self.user,
            role: self.role,
        }
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.iat
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.exp
    }

    pub fn encode_jwt(
        &self,
        private_key: impl AsRef<[u8]>,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let header = Header::new(Algorithm::PS256);
        let key = EncodingKey::from_rsa_pem(private_key.as_ref())?;

        encode(&header, &self, &key)
    }
}

pub fn auth_problem(detail: impl ToString) -> Problem {
    Problem::new_untyped(Status::Unauthorized, "Unable to authorize user.")
        .detail(detail)
        .clone()
}

/// Guard failures stash their problem here; the 401/403 catchers render it so
/// clients get problem+json instead of Rocket's default error page.
struct GuardProblem(Mutex<Option<Problem>>);

fn stash_problem(req: &Request<'_>, problem: Problem) {
    let cell = req.local_cache(|| GuardProblem(Mutex::new(None)));
    if let Ok(mut slot) = cell.0.lock() {
        *slot = Some(problem);
    }
}

pub fn stashed_problem(req: &Request<'_>) -> Option<Problem> {
    let cell = req.local_cache(|| GuardProblem(Mutex::new(None)));
    cell.0.lock().ok().and_then(|mut slot| slot.take())
}

/// Pulls the bearer token out of an `Authorization` header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

pub fn extract_claims(
    auth_header: Option<&str>,
    public_key: impl AsRef<[u8]>,
) -> Result<UserRoleToken, Problem> {
    let token = auth_header
        .and_then(bearer_token)
        .ok_or_else(|| auth_problem("No bearer token in Authorization header."))?;
    tracing::debug!("extracted bearer token from request headers");

    let key = DecodingKey::from_rsa_pem(public_key.as_ref()).map_err(Problem::from)?;

    match decode::<UserRoleToken>(token, &key, &Validation::new(Algorithm::PS256))
    .map(|data| data.claims)
    {
        Ok(it) => {
            tracing::debug!("decoded user role token for user: {}", it.user);

            Ok(it)
        }
        Err(e) => Err(Problem::from(e)),
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for UserRoleToken {
    type Error = Problem;

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let security: &Security = req
            .rocket()
            .state()
            .expect("Security must be in managed state");

        tracing::trace!("extracting user role token from request headers");
        let header = req.headers().get_one(AUTH_HEADER_NAME);
        let claims: UserRoleToken = match extract_claims(header, &security.jwt_keys.public) {
            Ok(it) => it,
            Err(e) => {
                tracing::debug!("unable to extract claims from headers");
                stash_problem(req, e.clone());
                return Error((Status::Unauthorized, e));
            }
        };

        Success(claims)
    }
}

/// Request guard for content-management endpoints; passes for instructors and
/// admins, fails with 403 otherwise.
#[derive(Debug, Clone)]
pub struct StaffUser(pub UserRoleToken);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for StaffUser {
    type Error = Problem;

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        match UserRoleToken::from_request(req).await {
            Success(token) if token.role.can_manage_content() => Success(StaffUser(token)),
            _ => {
                let problem = problems::access_denied();
                stash_problem(req, problem.clone());
                Error((Status::Forbidden, problem))
            }
        }
    }
}

/// Request guard for admin-only endpoints.
#[derive(Debug, Clone)]
pub struct AdminUser(pub UserRoleToken);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminUser {
    type Error = Problem;

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        match UserRoleToken::from_request(req).await {
            Success(token) if token.role.is_admin() => Success(AdminUser(token)),
            _ => {
                let problem = problems::admin_required();
                stash_problem(req, problem.clone());
                Error((Status::Forbidden, problem))
            }
        }
    }
}

pub mod doc {
    use utoipa::openapi::security::*;

    #[derive(Clone, Copy)]
    pub struct JWTAuth;

    impl From<JWTAuth> for SecurityScheme {
        fn from(_: JWTAuth) -> SecurityScheme {
            let mut http = Http::new(HttpAuthScheme::Bearer);
            http.bearer_format = Some("JWT".to_string());
            SecurityScheme::Http(http)
        }
    }

    impl utoipa::Modify for JWTAuth {
        fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
            let c = openapi
                .components
                .as_mut()
                .expect("OpenApi must have components");
            c.add_security_scheme("jwt", *self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::SubsecRound;
    use rsa::pkcs1::{EncodeRsaPrivateKey, LineEnding};
    use rsa::pkcs8::EncodePublicKey;

    fn test_keys() -> (Vec<u8>, Vec<u8>) {
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

        (private, public)
    }

    #[test]
    fn bearer_header_parsing() {
        assert_eq!(bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Basic dXNlcjpwYXNz"), None);
        assert_eq!(bearer_token(""), None);
    }

    #[test]
    fn jwt_round_trip_preserves_claims() {
        let (private, public) = test_keys();

        let mut now = Utc::now();
        now = now.round_subsecs(0);

        let user = Uuid::new_v4();
        let urt = UserRoleToken {
            iat: now,
            exp: now + Duration::hours(TOKEN_VALIDITY_HOURS),
            user,
            role: Role::Admin,
        };

        let token = urt.encode_jwt(&private).expect("encoding should work");

        let header = format!("Bearer {token}");
        let decoded = extract_claims(Some(header.as_str()), &public).expect("decoding should work");

        assert_eq!(now, decoded.iat);
        assert_eq!(now + Duration::hours(24), decoded.exp);
        assert_eq!(user, decoded.user);
        assert_eq!(decoded.role, Role::Admin);
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let (private, public) = test_keys();

        let past = Utc::now() - Duration::hours(48);
        let urt = UserRoleToken {
            iat: past,
            exp: past + Duration::hours(TOKEN_VALIDITY_HOURS),
            user: Uuid::new_v4(),
            role: Role::Student,
        };

        let token = urt.encode_jwt(&private).expect("encoding should work");
        let header = format!("Bearer {token}");

        let err =
            extract_claims(Some(header.as_str()), &public).expect_err("token should be expired");
        assert_eq!(err.status, Status::Unauthorized);
    }
}
