/// HTTP middleware for the social API
///
/// Validates a Bearer JWT on every `/api/v1` request and injects the
/// resolved requester identity into request extensions. Token issuance,
/// refresh and revocation are handled by the external identity
/// collaborator; this service only verifies.
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{error::ErrorUnauthorized, Error, FromRequest, HttpMessage, HttpRequest};
use futures::future::LocalBoxFuture;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};
use std::rc::Rc;
use uuid::Uuid;

static JWT_KEYS: OnceCell<JwtKeys> = OnceCell::new();

struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

/// Claims carried by the identity collaborator's tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Requester user id
    pub sub: String,
    /// Expiry as unix seconds
    pub exp: i64,
}

/// Install the shared JWT secret. Called once at startup; later calls are
/// no-ops so tests can initialize freely.
pub fn init_jwt_secret(secret: &str) {
    let _ = JWT_KEYS.set(JwtKeys {
        encoding: EncodingKey::from_secret(secret.as_bytes()),
        decoding: DecodingKey::from_secret(secret.as_bytes()),
    });
}

fn keys() -> Result<&'static JwtKeys, Error> {
    JWT_KEYS
        .get()
        .ok_or_else(|| ErrorUnauthorized("JWT secret not configured"))
}

/// Validate a bearer token and return the requester id.
pub fn validate_token(token: &str) -> Result<Uuid, Error> {
    let data = decode::<Claims>(token, &keys()?.decoding, &Validation::default())
        .map_err(|_| ErrorUnauthorized("Invalid or expired token"))?;
    Uuid::parse_str(&data.claims.sub).map_err(|_| ErrorUnauthorized("Invalid user ID"))
}

/// Sign a token for the given user. Issuance belongs to the identity
/// collaborator; this helper exists for tests and local tooling.
pub fn sign_token(user_id: Uuid, ttl_secs: i64) -> Result<String, Error> {
    let claims = Claims {
        sub: user_id.to_string(),
        exp: chrono::Utc::now().timestamp() + ttl_secs,
    };
    encode(&Header::default(), &claims, &keys()?.encoding)
        .map_err(|e| ErrorUnauthorized(e.to_string()))
}

/// Extracted requester identity stored in request extensions after auth.
#[derive(Debug, Clone)]
pub struct UserId(pub Uuid);

/// Actix middleware that validates a Bearer token.
pub struct JwtAuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for JwtAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtAuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct JwtAuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        Box::pin(async move {
            let auth_header = req
                .headers()
                .get("Authorization")
                .and_then(|h| h.to_str().ok())
                .ok_or_else(|| ErrorUnauthorized("Missing Authorization header"))?;

            let token = auth_header
                .strip_prefix("Bearer ")
                .ok_or_else(|| ErrorUnauthorized("Invalid Authorization scheme"))?;

            let user_id = validate_token(token)?;

            req.extensions_mut().insert(UserId(user_id));

            service.call(req).await
        })
    }
}

impl FromRequest for UserId {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<UserId>()
                .cloned()
                .ok_or_else(|| ErrorUnauthorized("User ID missing")),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_signed_token() {
        init_jwt_secret("unit-test-secret");
        let user_id = Uuid::new_v4();
        let token = sign_token(user_id, 60).expect("sign");
        assert_eq!(validate_token(&token).expect("validate"), user_id);
    }

    #[test]
    fn rejects_garbage_tokens() {
        init_jwt_secret("unit-test-secret");
        assert!(validate_token("not-a-token").is_err());
    }

    #[test]
    fn rejects_expired_tokens() {
        init_jwt_secret("unit-test-secret");
        let token = sign_token(Uuid::new_v4(), -120).expect("sign");
        assert!(validate_token(&token).is_err());
    }
}
