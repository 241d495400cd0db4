/// Comment handlers - HTTP endpoints for comment operations
use crate::error::Result;
use crate::middleware::UserId;
use crate::services::CommentService;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize)]
pub struct ListCommentsQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(length(min = 1, message = "text must not be empty"))]
    pub text: String,
}

/// List comments of a readable post, newest first
pub async fn list_comments(
    pool: web::Data<PgPool>,
    user_id: UserId,
    post_id: web::Path<Uuid>,
    query: web::Query<ListCommentsQuery>,
) -> Result<HttpResponse> {
    let service = CommentService::new((**pool).clone());
    let (limit, offset) = super::page(query.limit, query.offset);
    let comments = service
        .list_for_post(*post_id, user_id.0, limit, offset)
        .await?;

    Ok(HttpResponse::Ok().json(comments))
}

/// Comment on a readable post
pub async fn create_comment(
    pool: web::Data<PgPool>,
    user_id: UserId,
    post_id: web::Path<Uuid>,
    req: web::Json<CreateCommentRequest>,
) -> Result<HttpResponse> {
    req.validate()?;

    let service = CommentService::new((**pool).clone());
    let comment = service.create(*post_id, user_id.0, &req.text).await?;

    Ok(HttpResponse::Created().json(comment))
}

/// Get a single comment, scoped through its parent post
pub async fn get_comment(
    pool: web::Data<PgPool>,
    user_id: UserId,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let service = CommentService::new((**pool).clone());
    let comment = service.get(post_id, comment_id, user_id.0).await?;

    Ok(HttpResponse::Ok().json(comment))
}

/// Delete a comment (author only)
pub async fn delete_comment(
    pool: web::Data<PgPool>,
    user_id: UserId,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let service = CommentService::new((**pool).clone());
    service.delete(post_id, comment_id, user_id.0).await?;

    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comment_text_must_not_be_empty() {
        let req = CreateCommentRequest {
            text: String::new(),
        };
        assert!(req.validate().is_err());

        let req = CreateCommentRequest {
            text: "hello".into(),
        };
        assert!(req.validate().is_ok());
    }
}
