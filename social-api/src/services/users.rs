/// User directory and profile management
///
/// Registration and credentials live with the external identity
/// collaborator; this service reads and updates the profile fields it owns.
use crate::error::{AppError, Result};
use crate::models::{User, UserWithFollowers};
use sqlx::PgPool;
use uuid::Uuid;

/// Optional case-insensitive containment filters for the directory listing
#[derive(Debug, Default)]
pub struct UserFilters {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub country: Option<String>,
}

/// Partial profile update; `None` leaves the column untouched
#[derive(Debug, Default)]
pub struct ProfilePatch {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub picture: Option<String>,
    pub country: Option<String>,
}

pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Directory listing with optional name/country filters.
    pub async fn list(
        &self,
        filters: UserFilters,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<UserWithFollowers>> {
        let users = sqlx::query_as::<_, UserWithFollowers>(
            r#"
            SELECT u.id, u.first_name, u.last_name, u.bio, u.picture, u.country,
                   (SELECT COUNT(*) FROM follows f WHERE f.followed_id = u.id) AS followers_count
            FROM users u
            WHERE ($1::text IS NULL OR u.first_name ILIKE '%' || $1 || '%')
              AND ($2::text IS NULL OR u.last_name ILIKE '%' || $2 || '%')
              AND ($3::text IS NULL OR u.country ILIKE '%' || $3 || '%')
            ORDER BY u.created_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(filters.first_name.as_deref().map(super::escape_like))
        .bind(filters.last_name.as_deref().map(super::escape_like))
        .bind(filters.country.as_deref().map(super::escape_like))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Public read view of a single user.
    pub async fn get(&self, user_id: Uuid) -> Result<UserWithFollowers> {
        sqlx::query_as::<_, UserWithFollowers>(
            r#"
            SELECT u.id, u.first_name, u.last_name, u.bio, u.picture, u.country,
                   (SELECT COUNT(*) FROM follows f WHERE f.followed_id = u.id) AS followers_count
            FROM users u
            WHERE u.id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Update the requester's own profile.
    pub async fn update_profile(&self, user_id: Uuid, patch: ProfilePatch) -> Result<User> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET email = COALESCE($2, email),
                first_name = COALESCE($3, first_name),
                last_name = COALESCE($4, last_name),
                bio = COALESCE($5, bio),
                picture = COALESCE($6, picture),
                country = COALESCE($7, country),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, first_name, last_name, bio, picture, country, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(patch.email)
        .bind(patch.first_name)
        .bind(patch.last_name)
        .bind(patch.bio)
        .bind(patch.picture)
        .bind(patch.country)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Delete the requester's own account; posts, likes, comments and
    /// follow edges cascade.
    pub async fn delete(&self, user_id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        Ok(())
    }
}
