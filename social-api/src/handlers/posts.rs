/// Post handlers - HTTP endpoints for post operations
use crate::error::Result;
use crate::jobs::DeferredJobClient;
use crate::middleware::UserId;
use crate::models::{Comment, Like, Post, PostWithCounts};
use crate::services::posts::{PostDetailRecord, PostPatch};
use crate::services::PostService;
use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize)]
pub struct ListPostsQuery {
    pub hashtag: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePostRequest {
    #[validate(length(min = 1, message = "content must not be empty"))]
    pub content: String,
    pub image: Option<String>,
    #[validate(length(max = 100, message = "hashtag too long"))]
    pub hashtag: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePostRequest {
    #[validate(length(min = 1, message = "content must not be empty"))]
    pub content: Option<String>,
    pub image: Option<String>,
    #[validate(length(max = 100, message = "hashtag too long"))]
    pub hashtag: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SchedulePostRequest {
    #[validate(length(min = 1, message = "content must not be empty"))]
    pub content: String,
    pub image: Option<String>,
    #[validate(length(max = 100, message = "hashtag too long"))]
    pub hashtag: Option<String>,
    /// UTC publish time; must be in the future
    pub publish_at: DateTime<Utc>,
}

/// List shape - engagement counts, no embedded collections
#[derive(Debug, Serialize)]
pub struct PostListItem {
    pub id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub image: Option<String>,
    pub hashtag: Option<String>,
    pub created_at: DateTime<Utc>,
    pub likes_count: i64,
    pub comments_count: i64,
}

impl From<PostWithCounts> for PostListItem {
    fn from(p: PostWithCounts) -> Self {
        Self {
            id: p.id,
            author_id: p.author_id,
            content: p.content,
            image: p.image,
            hashtag: p.hashtag,
            created_at: p.created_at,
            likes_count: p.likes_count,
            comments_count: p.comments_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LikeView {
    pub id: Uuid,
    pub user_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct CommentView {
    pub id: Uuid,
    pub author_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl From<Like> for LikeView {
    fn from(l: Like) -> Self {
        Self {
            id: l.id,
            user_id: l.user_id,
        }
    }
}

impl From<Comment> for CommentView {
    fn from(c: Comment) -> Self {
        Self {
            id: c.id,
            author_id: c.author_id,
            text: c.text,
            created_at: c.created_at,
        }
    }
}

/// Detail shape - full like and comment lists
#[derive(Debug, Serialize)]
pub struct PostDetail {
    pub id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub image: Option<String>,
    pub hashtag: Option<String>,
    pub created_at: DateTime<Utc>,
    pub likes: Vec<LikeView>,
    pub comments: Vec<CommentView>,
}

impl From<PostDetailRecord> for PostDetail {
    fn from(record: PostDetailRecord) -> Self {
        Self {
            id: record.post.id,
            author_id: record.post.author_id,
            content: record.post.content,
            image: record.post.image,
            hashtag: record.post.hashtag,
            created_at: record.post.created_at,
            likes: record.likes.into_iter().map(LikeView::from).collect(),
            comments: record.comments.into_iter().map(CommentView::from).collect(),
        }
    }
}

/// Create-result shape
#[derive(Debug, Serialize)]
pub struct PostCreated {
    pub id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub image: Option<String>,
    pub hashtag: Option<String>,
    pub is_displayed: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Post> for PostCreated {
    fn from(p: Post) -> Self {
        Self {
            id: p.id,
            author_id: p.author_id,
            content: p.content,
            image: p.image,
            hashtag: p.hashtag,
            is_displayed: p.is_displayed,
            created_at: p.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ScheduledPostResponse {
    #[serde(flatten)]
    pub post: PostCreated,
    pub publish_at: DateTime<Utc>,
    pub job_id: Uuid,
}

/// List visible posts, newest first
pub async fn list_posts(
    pool: web::Data<PgPool>,
    user_id: UserId,
    query: web::Query<ListPostsQuery>,
) -> Result<HttpResponse> {
    let service = PostService::new((**pool).clone());
    let (limit, offset) = super::page(query.limit, query.offset);
    let posts = service
        .list_visible(user_id.0, query.hashtag.as_deref(), limit, offset)
        .await?;

    let items: Vec<PostListItem> = posts.into_iter().map(PostListItem::from).collect();
    Ok(HttpResponse::Ok().json(items))
}

/// Create a new post authored by the requester
pub async fn create_post(
    pool: web::Data<PgPool>,
    user_id: UserId,
    req: web::Json<CreatePostRequest>,
) -> Result<HttpResponse> {
    req.validate()?;

    let service = PostService::new((**pool).clone());
    let post = service
        .create(
            user_id.0,
            &req.content,
            req.image.as_deref(),
            req.hashtag.as_deref(),
        )
        .await?;

    Ok(HttpResponse::Created().json(PostCreated::from(post)))
}

/// Get a post detail within the requester's read scope
pub async fn get_post(
    pool: web::Data<PgPool>,
    user_id: UserId,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = PostService::new((**pool).clone());
    let detail = service.get_detail(*post_id, user_id.0).await?;

    Ok(HttpResponse::Ok().json(PostDetail::from(detail)))
}

/// Author-only partial update
pub async fn update_post(
    pool: web::Data<PgPool>,
    user_id: UserId,
    post_id: web::Path<Uuid>,
    req: web::Json<UpdatePostRequest>,
) -> Result<HttpResponse> {
    req.validate()?;

    let service = PostService::new((**pool).clone());
    let req = req.into_inner();
    let post = service
        .update(
            *post_id,
            user_id.0,
            PostPatch {
                content: req.content,
                image: req.image,
                hashtag: req.hashtag,
            },
        )
        .await?;

    Ok(HttpResponse::Ok().json(PostCreated::from(post)))
}

/// Author-only delete
pub async fn delete_post(
    pool: web::Data<PgPool>,
    user_id: UserId,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = PostService::new((**pool).clone());
    service.delete(*post_id, user_id.0).await?;

    Ok(HttpResponse::NoContent().finish())
}

/// Like a post; returns the post detail
pub async fn like_post(
    pool: web::Data<PgPool>,
    user_id: UserId,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = PostService::new((**pool).clone());
    service.like(*post_id, user_id.0).await?;
    let detail = service.get_detail(*post_id, user_id.0).await?;

    Ok(HttpResponse::Ok().json(PostDetail::from(detail)))
}

/// Unlike a post (no-op when not liked); returns the post detail
pub async fn unlike_post(
    pool: web::Data<PgPool>,
    user_id: UserId,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = PostService::new((**pool).clone());
    service.unlike(*post_id, user_id.0).await?;
    let detail = service.get_detail(*post_id, user_id.0).await?;

    Ok(HttpResponse::Ok().json(PostDetail::from(detail)))
}

/// Schedule a post for deferred publication (UTC)
pub async fn schedule_post(
    pool: web::Data<PgPool>,
    scheduler: web::Data<Arc<dyn DeferredJobClient>>,
    user_id: UserId,
    req: web::Json<SchedulePostRequest>,
) -> Result<HttpResponse> {
    req.validate()?;

    let service = PostService::with_scheduler((**pool).clone(), scheduler.get_ref().clone());
    let (post, job_id) = service
        .schedule(
            user_id.0,
            &req.content,
            req.image.as_deref(),
            req.hashtag.as_deref(),
            req.publish_at,
        )
        .await?;

    Ok(HttpResponse::Ok().json(ScheduledPostResponse {
        publish_at: req.publish_at,
        post: PostCreated::from(post),
        job_id,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_rejects_empty_content() {
        let req = CreatePostRequest {
            content: String::new(),
            image: None,
            hashtag: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn create_request_rejects_oversized_hashtag() {
        let req = CreatePostRequest {
            content: "hello".into(),
            image: None,
            hashtag: Some("x".repeat(101)),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn detail_shape_embeds_likes_and_comments() {
        let post = Post {
            id: Uuid::new_v4(),
            author_id: Uuid::new_v4(),
            content: "hello".into(),
            image: None,
            hashtag: Some("rust".into()),
            is_displayed: true,
            created_at: Utc::now(),
        };
        let like = Like {
            id: Uuid::new_v4(),
            post_id: post.id,
            user_id: Uuid::new_v4(),
            created_at: Utc::now(),
        };
        let comment = Comment {
            id: Uuid::new_v4(),
            post_id: post.id,
            author_id: Uuid::new_v4(),
            text: "nice".into(),
            created_at: Utc::now(),
        };

        let detail = PostDetail::from(PostDetailRecord {
            post,
            likes: vec![like],
            comments: vec![comment],
        });
        let value = serde_json::to_value(&detail).unwrap();
        assert_eq!(value["likes"].as_array().unwrap().len(), 1);
        assert_eq!(value["comments"][0]["text"], "nice");
        // Detail shape never exposes the raw visibility flag
        assert!(value.get("is_displayed").is_none());
    }
}
