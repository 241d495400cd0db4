/// Follow graph operations and the requester profile snapshot
use crate::error::{AppError, Result};
use crate::metrics;
use crate::models::{FollowEntry, User};
use sqlx::PgPool;
use uuid::Uuid;

/// The requester's profile with follow lists and liked post ids
#[derive(Debug)]
pub struct ProfileRecord {
    pub user: User,
    pub followings: Vec<FollowEntry>,
    pub followers: Vec<FollowEntry>,
    pub liked_posts: Vec<Uuid>,
}

#[derive(Clone)]
pub struct FollowService {
    pool: PgPool,
}

impl FollowService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a follow edge. Self-follow is an invalid operation; a
    /// duplicate edge is a conflict, never a silent success.
    pub async fn follow(&self, followed_id: Uuid, follower_id: Uuid) -> Result<()> {
        if followed_id == follower_id {
            return Err(AppError::BadRequest("User can't follow self".to_string()));
        }

        // Guard the insert on the target row: a missing or concurrently
        // deleted target yields zero rows instead of a constraint failure.
        let inserted = match sqlx::query_as::<_, (Uuid,)>(
            r#"
            INSERT INTO follows (id, follower_id, followed_id, created_at)
            SELECT $1, $2, u.id, NOW()
            FROM users u
            WHERE u.id = $3
            ON CONFLICT (follower_id, followed_id) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(follower_id)
        .bind(followed_id)
        .fetch_optional(&self.pool)
        .await
        {
            Ok(row) => row,
            Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
                return Err(AppError::NotFound("User not found".to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        if inserted.is_none() {
            let target_exists: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
                    .bind(followed_id)
                    .fetch_one(&self.pool)
                    .await?;
            if !target_exists {
                return Err(AppError::NotFound("User not found".to_string()));
            }
            return Err(AppError::Conflict(
                "Already following this user".to_string(),
            ));
        }

        metrics::FOLLOWS_CREATED.inc();
        Ok(())
    }

    /// Remove a follow edge if present; absence is a no-op.
    pub async fn unfollow(&self, followed_id: Uuid, follower_id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            DELETE FROM follows
            WHERE follower_id = $1 AND followed_id = $2
            "#,
        )
        .bind(follower_id)
        .bind(followed_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// The requester's profile snapshot: identity, follow lists and the
    /// ids of posts they have liked.
    pub async fn profile(&self, user_id: Uuid) -> Result<ProfileRecord> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, first_name, last_name, bio, picture, country, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let followings = sqlx::query_as::<_, FollowEntry>(
            r#"
            SELECT u.id AS user_id, TRIM(u.first_name || ' ' || u.last_name) AS full_name
            FROM follows f
            JOIN users u ON u.id = f.followed_id
            WHERE f.follower_id = $1
            ORDER BY f.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let followers = sqlx::query_as::<_, FollowEntry>(
            r#"
            SELECT u.id AS user_id, TRIM(u.first_name || ' ' || u.last_name) AS full_name
            FROM follows f
            JOIN users u ON u.id = f.follower_id
            WHERE f.followed_id = $1
            ORDER BY f.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let liked_posts: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT post_id
            FROM likes
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ProfileRecord {
            user,
            followings,
            followers,
            liked_posts,
        })
    }
}
