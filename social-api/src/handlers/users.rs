/// User, profile and follow-graph handlers
use crate::error::Result;
use crate::middleware::UserId;
use crate::models::FollowEntry;
use crate::services::follow::ProfileRecord;
use crate::services::users::{ProfilePatch, UserFilters};
use crate::services::{FollowService, UserService};
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub country: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(email(message = "invalid email"))]
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub picture: Option<String>,
    #[validate(length(max = 100, message = "country too long"))]
    pub country: Option<String>,
}

/// Profile shape: identity plus follow lists and liked post ids
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: Option<String>,
    pub picture: Option<String>,
    pub country: Option<String>,
    pub followings: Vec<FollowEntry>,
    pub followers: Vec<FollowEntry>,
    pub liked_posts: Vec<Uuid>,
}

impl From<ProfileRecord> for ProfileResponse {
    fn from(record: ProfileRecord) -> Self {
        Self {
            id: record.user.id,
            email: record.user.email,
            first_name: record.user.first_name,
            last_name: record.user.last_name,
            bio: record.user.bio,
            picture: record.user.picture,
            country: record.user.country,
            followings: record.followings,
            followers: record.followers,
            liked_posts: record.liked_posts,
        }
    }
}

/// User directory with optional name/country filters
pub async fn list_users(
    pool: web::Data<PgPool>,
    _user_id: UserId,
    query: web::Query<ListUsersQuery>,
) -> Result<HttpResponse> {
    let service = UserService::new((**pool).clone());
    let (limit, offset) = super::page(query.limit, query.offset);
    let query = query.into_inner();
    let users = service
        .list(
            UserFilters {
                first_name: query.first_name,
                last_name: query.last_name,
                country: query.country,
            },
            limit,
            offset,
        )
        .await?;

    Ok(HttpResponse::Ok().json(users))
}

/// Public read view of a user
pub async fn get_user(
    pool: web::Data<PgPool>,
    _user_id: UserId,
    target: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = UserService::new((**pool).clone());
    let user = service.get(*target).await?;

    Ok(HttpResponse::Ok().json(user))
}

/// The requester's own profile snapshot
pub async fn get_profile(pool: web::Data<PgPool>, user_id: UserId) -> Result<HttpResponse> {
    let service = FollowService::new((**pool).clone());
    let profile = service.profile(user_id.0).await?;

    Ok(HttpResponse::Ok().json(ProfileResponse::from(profile)))
}

/// Update the requester's own profile
pub async fn update_profile(
    pool: web::Data<PgPool>,
    user_id: UserId,
    req: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse> {
    req.validate()?;

    let service = UserService::new((**pool).clone());
    let req = req.into_inner();
    let user = service
        .update_profile(
            user_id.0,
            ProfilePatch {
                email: req.email,
                first_name: req.first_name,
                last_name: req.last_name,
                bio: req.bio,
                picture: req.picture,
                country: req.country,
            },
        )
        .await?;

    Ok(HttpResponse::Ok().json(user))
}

/// Delete the requester's own account
pub async fn delete_profile(pool: web::Data<PgPool>, user_id: UserId) -> Result<HttpResponse> {
    let service = UserService::new((**pool).clone());
    service.delete(user_id.0).await?;

    Ok(HttpResponse::NoContent().finish())
}

/// Follow a user; returns the requester's updated profile
pub async fn follow_user(
    pool: web::Data<PgPool>,
    user_id: UserId,
    target: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = FollowService::new((**pool).clone());
    service.follow(*target, user_id.0).await?;
    let profile = service.profile(user_id.0).await?;

    Ok(HttpResponse::Created().json(ProfileResponse::from(profile)))
}

/// Unfollow a user (no-op when not following); returns the profile
pub async fn unfollow_user(
    pool: web::Data<PgPool>,
    user_id: UserId,
    target: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = FollowService::new((**pool).clone());
    service.unfollow(*target, user_id.0).await?;
    let profile = service.profile(user_id.0).await?;

    Ok(HttpResponse::Ok().json(ProfileResponse::from(profile)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_update_rejects_bad_email() {
        let req = UpdateProfileRequest {
            email: Some("not-an-email".into()),
            first_name: None,
            last_name: None,
            bio: None,
            picture: None,
            country: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn profile_update_accepts_partial_payloads() {
        let req = UpdateProfileRequest {
            email: None,
            first_name: Some("Ada".into()),
            last_name: None,
            bio: Some("systems programmer".into()),
            picture: None,
            country: None,
        };
        assert!(req.validate().is_ok());
    }
}
