use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for a user's company profile (one per owner)
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub owner_id: String,
    pub company_description: Option<String>,
    pub business_type: Option<String>,
    pub company_activities: Vec<String>,
    pub main_industries: Vec<String>,
    pub specializations: Vec<String>,
    pub preferences: Json<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
