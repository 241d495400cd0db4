/// Comment service - comments inherit the read scope of their parent post
use crate::error::{AppError, Result};
use crate::models::Comment;
use crate::visibility::{self, AuthorRelation};
use sqlx::PgPool;
use uuid::Uuid;

pub struct CommentService {
    pool: PgPool,
}

impl CommentService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gate on the parent post's read scope; a comment inherits the
    /// author-equivalence rule of its post.
    async fn require_readable_post(&self, post_id: Uuid, requester: Uuid) -> Result<()> {
        let row: Option<(Uuid, bool, bool)> = sqlx::query_as(
            r#"
            SELECT p.author_id, p.is_displayed,
                   EXISTS(SELECT 1 FROM follows f
                          WHERE f.follower_id = $1 AND f.followed_id = p.author_id)
            FROM posts p
            WHERE p.id = $2
            "#,
        )
        .bind(requester)
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;

        let readable = match row {
            Some((author_id, is_displayed, follows_author)) => visibility::can_read(
                is_displayed,
                AuthorRelation {
                    author_id,
                    requester_id: requester,
                    requester_follows_author: follows_author,
                },
            ),
            None => false,
        };

        if readable {
            Ok(())
        } else {
            Err(AppError::NotFound("Post not found".to_string()))
        }
    }

    /// Comments of a readable post, newest first.
    pub async fn list_for_post(
        &self,
        post_id: Uuid,
        requester: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Comment>> {
        self.require_readable_post(post_id, requester).await?;

        let comments = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, post_id, author_id, text, created_at
            FROM comments
            WHERE post_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(post_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(comments)
    }

    /// A single comment, scoped through its parent post.
    pub async fn get(&self, post_id: Uuid, comment_id: Uuid, requester: Uuid) -> Result<Comment> {
        self.require_readable_post(post_id, requester).await?;

        sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, post_id, author_id, text, created_at
            FROM comments
            WHERE id = $1 AND post_id = $2
            "#,
        )
        .bind(comment_id)
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))
    }

    /// Create a comment. The requester must be able to read the post, so a
    /// non-follower non-author is rejected with the same not-found they
    /// would get listing it.
    pub async fn create(&self, post_id: Uuid, author_id: Uuid, text: &str) -> Result<Comment> {
        self.require_readable_post(post_id, author_id).await?;

        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (id, post_id, author_id, text, created_at)
            VALUES ($1, $2, $3, $4, NOW())
            RETURNING id, post_id, author_id, text, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(post_id)
        .bind(author_id)
        .bind(text)
        .fetch_one(&self.pool)
        .await?;

        Ok(comment)
    }

    /// Delete a comment; only its author may do so.
    pub async fn delete(&self, post_id: Uuid, comment_id: Uuid, requester: Uuid) -> Result<()> {
        let result = sqlx::query(
            r#"
            DELETE FROM comments
            WHERE id = $1 AND post_id = $2 AND author_id = $3
            "#,
        )
        .bind(comment_id)
        .bind(post_id)
        .bind(requester)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(());
        }

        // Distinguish "not yours" from "not there" for readable posts.
        match self.get(post_id, comment_id, requester).await {
            Ok(_) => Err(AppError::Forbidden(
                "Only the comment author can delete it".to_string(),
            )),
            Err(err) => Err(err),
        }
    }
}
