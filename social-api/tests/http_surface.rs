//! HTTP-surface tests that need no live database: the auth gate around
//! /api/v1, the shared-token gate on the job-runner callback, and the
//! liveness probe. Database-backed behavior is covered by the scoped
//! queries and the unit tests over the visibility predicates.

use actix_web::{http::StatusCode, test, web, App, HttpResponse};
use social_api::config::{
    AppConfig, AuthConfig, Config, CorsConfig, DatabaseConfig, JobRunnerConfig,
};
use social_api::handlers::jobs as job_handlers;
use social_api::middleware::{self, JwtAuthMiddleware, UserId};
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

const TEST_SECRET: &str = "integration-test-secret";
const TEST_JOB_TOKEN: &str = "integration-job-token";

fn test_config() -> Config {
    Config {
        app: AppConfig {
            env: "test".into(),
            host: "127.0.0.1".into(),
            port: 0,
        },
        cors: CorsConfig {
            allowed_origins: "http://localhost:3000".into(),
        },
        database: DatabaseConfig {
            url: "postgresql://localhost/unused".into(),
            max_connections: 1,
        },
        auth: AuthConfig {
            jwt_secret: TEST_SECRET.into(),
        },
        job_runner: JobRunnerConfig {
            url: "http://localhost:8090".into(),
            callback_token: TEST_JOB_TOKEN.into(),
        },
    }
}

async fn whoami(user_id: UserId) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "user_id": user_id.0 }))
}

#[actix_web::test]
async fn requests_without_a_token_are_rejected() {
    middleware::init_jwt_secret(TEST_SECRET);

    let app = test::init_service(
        App::new().service(
            web::scope("/api/v1")
                .wrap(JwtAuthMiddleware)
                .route("/whoami", web::get().to(whoami)),
        ),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/v1/whoami").to_request();
    let err = test::try_call_service(&app, req).await.unwrap_err();
    assert_eq!(
        err.as_response_error().status_code(),
        StatusCode::UNAUTHORIZED
    );
}

#[actix_web::test]
async fn basic_auth_scheme_is_rejected() {
    middleware::init_jwt_secret(TEST_SECRET);

    let app = test::init_service(
        App::new().service(
            web::scope("/api/v1")
                .wrap(JwtAuthMiddleware)
                .route("/whoami", web::get().to(whoami)),
        ),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/v1/whoami")
        .insert_header(("Authorization", "Basic dXNlcjpwYXNz"))
        .to_request();
    let err = test::try_call_service(&app, req).await.unwrap_err();
    assert_eq!(
        err.as_response_error().status_code(),
        StatusCode::UNAUTHORIZED
    );
}

#[actix_web::test]
async fn valid_token_resolves_the_requester_identity() {
    middleware::init_jwt_secret(TEST_SECRET);
    let user_id = Uuid::new_v4();
    let token = middleware::sign_token(user_id, 60).expect("sign");

    let app = test::init_service(
        App::new().service(
            web::scope("/api/v1")
                .wrap(JwtAuthMiddleware)
                .route("/whoami", web::get().to(whoami)),
        ),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/v1/whoami")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["user_id"], serde_json::json!(user_id));
}

#[actix_web::test]
async fn job_callback_rejects_bad_tokens_before_touching_the_store() {
    // Lazy pool: never connects unless a query runs, which the token gate
    // must prevent.
    let pool = PgPoolOptions::new()
        .connect_lazy("postgresql://localhost/unused")
        .expect("lazy pool");

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(pool))
            .app_data(web::Data::new(test_config()))
            .route(
                "/internal/jobs/publish-post",
                web::post().to(job_handlers::publish_post),
            ),
    )
    .await;

    let payload = serde_json::json!({
        "post_id": Uuid::new_v4(),
        "publish_at": chrono::Utc::now(),
    });

    // Missing token
    let req = test::TestRequest::post()
        .uri("/internal/jobs/publish-post")
        .set_json(&payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // Wrong token
    let req = test::TestRequest::post()
        .uri("/internal/jobs/publish-post")
        .insert_header((job_handlers::JOB_TOKEN_HEADER, "wrong-token"))
        .set_json(&payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn liveness_needs_no_dependencies() {
    async fn liveness() -> HttpResponse {
        HttpResponse::Ok().json(serde_json::json!({"alive": true}))
    }

    let app = test::init_service(
        App::new().route("/api/v1/health/live", web::get().to(liveness)),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/v1/health/live")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
}
