/// Internal callback route for the deferred-job runner
///
/// The runner authenticates with the shared callback token rather than a
/// user JWT; the route lives outside the `/api/v1` auth scope.
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::jobs::PublishPostArgs;
use crate::services::PostService;
use actix_web::{web, HttpRequest, HttpResponse};
use sqlx::PgPool;

pub const JOB_TOKEN_HEADER: &str = "X-Job-Token";

/// Fired by the job runner at (or after) the scheduled time, at-least-once.
/// Flips the post visible and re-stamps `created_at` with the requested
/// publish time; a repeat delivery is a no-op success.
pub async fn publish_post(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http_req: HttpRequest,
    args: web::Json<PublishPostArgs>,
) -> Result<HttpResponse> {
    let presented = http_req
        .headers()
        .get(JOB_TOKEN_HEADER)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing job token".to_string()))?;

    if presented != config.job_runner.callback_token {
        return Err(AppError::Unauthorized("Invalid job token".to_string()));
    }

    let service = PostService::new((**pool).clone());
    let published = service
        .publish_scheduled(args.post_id, args.publish_at)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "published": published })))
}
