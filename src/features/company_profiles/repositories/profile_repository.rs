use async_trait::async_trait;
use sqlx::PgPool;

use crate::core::error::{AppError, Result};
use crate::features::company_profiles::models::UserProfile;

/// Persistence port for user profiles, keyed by owner
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn get_by_owner(&self, owner_id: &str) -> Result<Option<UserProfile>>;

    /// Insert a profile. `None` when the owner already has one.
    async fn create(&self, profile: &UserProfile) -> Result<Option<UserProfile>>;

    /// Overwrite the owner's profile fields
    async fn update(&self, profile: &UserProfile) -> Result<UserProfile>;
}

/// Postgres-backed profile repository
pub struct PgProfileRepository {
    pool: PgPool,
}

impl PgProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileRepository for PgProfileRepository {
    async fn get_by_owner(&self, owner_id: &str) -> Result<Option<UserProfile>> {
        sqlx::query_as::<_, UserProfile>("SELECT * FROM user_profiles WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get profile for owner {}: {:?}", owner_id, e);
                AppError::Database(e)
            })
    }

    async fn create(&self, profile: &UserProfile) -> Result<Option<UserProfile>> {
        sqlx::query_as::<_, UserProfile>(
            r#"
            INSERT INTO user_profiles (
                id, owner_id, company_description, business_type, company_activities,
                main_industries, specializations, preferences, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (owner_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(profile.id)
        .bind(&profile.owner_id)
        .bind(&profile.company_description)
        .bind(&profile.business_type)
        .bind(&profile.company_activities)
        .bind(&profile.main_industries)
        .bind(&profile.specializations)
        .bind(&profile.preferences)
        .bind(profile.created_at)
        .bind(profile.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create profile for owner {}: {:?}", profile.owner_id, e);
            AppError::Database(e)
        })
    }

    async fn update(&self, profile: &UserProfile) -> Result<UserProfile> {
        sqlx::query_as::<_, UserProfile>(
            r#"
            UPDATE user_profiles
            SET company_description = $2, business_type = $3, company_activities = $4,
                main_industries = $5, specializations = $6, updated_at = $7
            WHERE owner_id = $1
            RETURNING *
            "#,
        )
        .bind(&profile.owner_id)
        .bind(&profile.company_description)
        .bind(&profile.business_type)
        .bind(&profile.company_activities)
        .bind(&profile.main_industries)
        .bind(&profile.specializations)
        .bind(profile.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update profile for owner {}: {:?}", profile.owner_id, e);
            AppError::Database(e)
        })?
        .ok_or_else(|| AppError::NotFound(format!("Profile for owner {} not found", profile.owner_id)))
    }
}
