/// Post service - creation, visibility-scoped reads, likes and
/// deferred publication
use crate::error::{AppError, Result};
use crate::jobs::{register_publish_job, DeferredJobClient};
use crate::metrics;
use crate::models::{Comment, Like, Post, PostWithCounts};
use crate::visibility::{self, AuthorRelation};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// Read-scope predicate applied by the list query: the post is displayed
/// and authored by the requester or by someone they follow. Single-object
/// reads go through `visibility::can_read` instead.
const READ_SCOPE: &str = "p.is_displayed = TRUE \
     AND (p.author_id = $1 \
          OR EXISTS(SELECT 1 FROM follows f \
                    WHERE f.follower_id = $1 AND f.followed_id = p.author_id))";

/// Post row joined with the requester/author follow relation
#[derive(sqlx::FromRow)]
struct PostAccessRow {
    id: Uuid,
    author_id: Uuid,
    content: String,
    image: Option<String>,
    hashtag: Option<String>,
    is_displayed: bool,
    created_at: DateTime<Utc>,
    requester_follows_author: bool,
}

impl PostAccessRow {
    fn into_post(self) -> Post {
        Post {
            id: self.id,
            author_id: self.author_id,
            content: self.content,
            image: self.image,
            hashtag: self.hashtag,
            is_displayed: self.is_displayed,
            created_at: self.created_at,
        }
    }
}

/// A post with its full like and comment lists (Detail shape)
#[derive(Debug)]
pub struct PostDetailRecord {
    pub post: Post,
    pub likes: Vec<Like>,
    pub comments: Vec<Comment>,
}

/// Partial update payload; `None` leaves the column untouched
#[derive(Debug, Default)]
pub struct PostPatch {
    pub content: Option<String>,
    pub image: Option<String>,
    pub hashtag: Option<String>,
}

pub struct PostService {
    pool: PgPool,
    scheduler: Option<Arc<dyn DeferredJobClient>>,
}

impl PostService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            scheduler: None,
        }
    }

    pub fn with_scheduler(pool: PgPool, scheduler: Arc<dyn DeferredJobClient>) -> Self {
        Self {
            pool,
            scheduler: Some(scheduler),
        }
    }

    /// List posts visible to the requester, newest first, optionally
    /// narrowed by a case-insensitive hashtag containment filter.
    pub async fn list_visible(
        &self,
        requester: Uuid,
        hashtag: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PostWithCounts>> {
        let query = format!(
            r#"
            SELECT p.id, p.author_id, p.content, p.image, p.hashtag, p.is_displayed, p.created_at,
                   (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) AS likes_count,
                   (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comments_count
            FROM posts p
            WHERE {READ_SCOPE}
              AND ($2::text IS NULL OR p.hashtag ILIKE '%' || $2 || '%')
            ORDER BY p.created_at DESC
            LIMIT $3 OFFSET $4
            "#
        );

        let posts = sqlx::query_as::<_, PostWithCounts>(&query)
            .bind(requester)
            .bind(hashtag.map(super::escape_like))
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(posts)
    }

    /// Fetch a single post and gate it through the read predicate. An
    /// unreadable post and a missing one are indistinguishable to the
    /// caller.
    pub async fn fetch_readable(&self, post_id: Uuid, requester: Uuid) -> Result<Post> {
        let row = sqlx::query_as::<_, PostAccessRow>(
            r#"
            SELECT p.id, p.author_id, p.content, p.image, p.hashtag, p.is_displayed, p.created_at,
                   EXISTS(SELECT 1 FROM follows f
                          WHERE f.follower_id = $1 AND f.followed_id = p.author_id)
                       AS requester_follows_author
            FROM posts p
            WHERE p.id = $2
            "#,
        )
        .bind(requester)
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

        let relation = AuthorRelation {
            author_id: row.author_id,
            requester_id: requester,
            requester_follows_author: row.requester_follows_author,
        };
        if !visibility::can_read(row.is_displayed, relation) {
            return Err(AppError::NotFound("Post not found".to_string()));
        }

        Ok(row.into_post())
    }

    /// Detail view: the post plus its full like and comment lists.
    pub async fn get_detail(&self, post_id: Uuid, requester: Uuid) -> Result<PostDetailRecord> {
        let post = self.fetch_readable(post_id, requester).await?;

        let likes = sqlx::query_as::<_, Like>(
            r#"
            SELECT id, post_id, user_id, created_at
            FROM likes
            WHERE post_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        let comments = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, post_id, author_id, text, created_at
            FROM comments
            WHERE post_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(PostDetailRecord {
            post,
            likes,
            comments,
        })
    }

    /// Create an immediately visible post authored by the requester.
    pub async fn create(
        &self,
        author_id: Uuid,
        content: &str,
        image: Option<&str>,
        hashtag: Option<&str>,
    ) -> Result<Post> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (id, author_id, content, image, hashtag, is_displayed, created_at)
            VALUES ($1, $2, $3, $4, $5, TRUE, NOW())
            RETURNING id, author_id, content, image, hashtag, is_displayed, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(author_id)
        .bind(content)
        .bind(image)
        .bind(hashtag)
        .fetch_one(&self.pool)
        .await?;

        metrics::POSTS_CREATED.inc();
        Ok(post)
    }

    /// Author-only partial update. Follow edges grant no write access, so
    /// an out-of-scope id is indistinguishable from a missing one.
    pub async fn update(&self, post_id: Uuid, author_id: Uuid, patch: PostPatch) -> Result<Post> {
        sqlx::query_as::<_, Post>(
            r#"
            UPDATE posts
            SET content = COALESCE($3, content),
                image = COALESCE($4, image),
                hashtag = COALESCE($5, hashtag)
            WHERE id = $1 AND author_id = $2 AND is_displayed = TRUE
            RETURNING id, author_id, content, image, hashtag, is_displayed, created_at
            "#,
        )
        .bind(post_id)
        .bind(author_id)
        .bind(patch.content)
        .bind(patch.image)
        .bind(patch.hashtag)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))
    }

    /// Author-only delete; likes and comments cascade with the post.
    pub async fn delete(&self, post_id: Uuid, author_id: Uuid) -> Result<()> {
        let result = sqlx::query(
            r#"
            DELETE FROM posts
            WHERE id = $1 AND author_id = $2 AND is_displayed = TRUE
            "#,
        )
        .bind(post_id)
        .bind(author_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Post not found".to_string()));
        }
        Ok(())
    }

    /// Like a readable post. A duplicate like is a conflict, not a silent
    /// success; the unique constraint keeps concurrent duplicates to one row.
    pub async fn like(&self, post_id: Uuid, requester: Uuid) -> Result<()> {
        self.fetch_readable(post_id, requester).await?;

        let inserted = sqlx::query_as::<_, (Uuid,)>(
            r#"
            INSERT INTO likes (id, post_id, user_id, created_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (post_id, user_id) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(post_id)
        .bind(requester)
        .fetch_optional(&self.pool)
        .await?;

        if inserted.is_none() {
            return Err(AppError::Conflict(
                "User has already liked this post".to_string(),
            ));
        }

        metrics::LIKES_CREATED.inc();
        Ok(())
    }

    /// Remove a like if present; absence is a no-op.
    pub async fn unlike(&self, post_id: Uuid, requester: Uuid) -> Result<()> {
        self.fetch_readable(post_id, requester).await?;

        sqlx::query(
            r#"
            DELETE FROM likes
            WHERE post_id = $1 AND user_id = $2
            "#,
        )
        .bind(post_id)
        .bind(requester)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Create a hidden post stamped with the future publish time and
    /// register the deferred trigger. The insert and the registration
    /// share a transaction: if the job runner rejects the job, no hidden
    /// orphan post is left behind.
    pub async fn schedule(
        &self,
        author_id: Uuid,
        content: &str,
        image: Option<&str>,
        hashtag: Option<&str>,
        publish_at: DateTime<Utc>,
    ) -> Result<(Post, Uuid)> {
        if publish_at <= Utc::now() {
            return Err(AppError::Validation(
                "publish_at must be in the future".to_string(),
            ));
        }

        let scheduler = self
            .scheduler
            .as_ref()
            .ok_or_else(|| AppError::Internal("job runner not configured".to_string()))?;

        let mut tx = self.pool.begin().await?;

        let post = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (id, author_id, content, image, hashtag, is_displayed, created_at)
            VALUES ($1, $2, $3, $4, $5, FALSE, $6)
            RETURNING id, author_id, content, image, hashtag, is_displayed, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(author_id)
        .bind(content)
        .bind(image)
        .bind(hashtag)
        .bind(publish_at)
        .fetch_one(&mut *tx)
        .await?;

        let job_id = register_publish_job(scheduler.as_ref(), post.id, publish_at)
            .await
            .map_err(|e| AppError::Internal(format!("job registration failed: {e}")))?;

        tx.commit().await?;

        metrics::POSTS_SCHEDULED.inc();
        tracing::info!(post_id = %post.id, %job_id, %publish_at, "post scheduled");
        Ok((post, job_id))
    }

    /// Deferred trigger body: flip the post to visible and re-stamp
    /// `created_at` with the originally requested publish time. Delivery
    /// is at-least-once, so a re-fire finds zero hidden rows and succeeds
    /// as a no-op.
    pub async fn publish_scheduled(
        &self,
        post_id: Uuid,
        publish_at: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE posts
            SET is_displayed = TRUE, created_at = $2
            WHERE id = $1 AND is_displayed = FALSE
            "#,
        )
        .bind(post_id)
        .bind(publish_at)
        .execute(&self.pool)
        .await?;

        let published = result.rows_affected() > 0;
        if published {
            metrics::POSTS_PUBLISHED.inc();
            tracing::info!(%post_id, %publish_at, "scheduled post published");
        } else {
            tracing::debug!(%post_id, "publish trigger re-fired or post gone; no-op");
        }
        Ok(published)
    }
}
