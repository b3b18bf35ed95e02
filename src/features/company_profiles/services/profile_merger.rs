use chrono::{DateTime, Utc};
use sqlx::types::Json;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::company_profiles::models::{CompanyAttributes, UserProfile};
use crate::features::company_profiles::repositories::ProfileRepository;

fn pick_text(incoming: &Option<String>, current: &Option<String>) -> Option<String> {
    match incoming.as_deref().map(str::trim) {
        Some(value) if !value.is_empty() => Some(value.to_string()),
        _ => current.clone(),
    }
}

fn pick_list(incoming: &[String], current: &[String]) -> Vec<String> {
    if incoming.is_empty() {
        current.to_vec()
    } else {
        incoming.to_vec()
    }
}

/// Fold `incoming` into `existing` (or a fresh profile for `owner_id`).
///
/// A field is replaced only when the incoming value is present; otherwise the
/// current value is kept. Applying the same attributes twice yields the same
/// fields as applying them once.
pub fn merge_profile(
    existing: Option<&UserProfile>,
    owner_id: &str,
    incoming: &CompanyAttributes,
    now: DateTime<Utc>,
) -> UserProfile {
    match existing {
        Some(current) => UserProfile {
            company_description: pick_text(&incoming.company_description, &current.company_description),
            business_type: pick_text(&incoming.business_type, &current.business_type),
            company_activities: pick_list(&incoming.company_activities, &current.company_activities),
            main_industries: pick_list(&incoming.main_industries, &current.main_industries),
            specializations: pick_list(&incoming.specializations, &current.specializations),
            updated_at: now,
            ..current.clone()
        },
        None => UserProfile {
            id: Uuid::new_v4(),
            owner_id: owner_id.to_string(),
            company_description: pick_text(&incoming.company_description, &None),
            business_type: pick_text(&incoming.business_type, &None),
            company_activities: incoming.company_activities.clone(),
            main_industries: incoming.main_industries.clone(),
            specializations: incoming.specializations.clone(),
            preferences: Json(serde_json::json!({})),
            created_at: now,
            updated_at: now,
        },
    }
}

/// Reads, merges and writes an owner's profile
pub struct ProfileMerger {
    profiles: Arc<dyn ProfileRepository>,
}

impl ProfileMerger {
    pub fn new(profiles: Arc<dyn ProfileRepository>) -> Self {
        Self { profiles }
    }

    pub async fn get_profile(&self, owner_id: &str) -> Result<Option<UserProfile>> {
        self.profiles.get_by_owner(owner_id).await
    }

    pub async fn merge_into_profile(
        &self,
        owner_id: &str,
        attributes: &CompanyAttributes,
    ) -> Result<UserProfile> {
        if let Some(existing) = self.profiles.get_by_owner(owner_id).await? {
            return self.update_existing(&existing, owner_id, attributes).await;
        }

        let fresh = merge_profile(None, owner_id, attributes, Utc::now());
        match self.profiles.create(&fresh).await? {
            Some(created) => {
                tracing::info!("Created profile for owner {} from extracted data", owner_id);
                Ok(created)
            }
            None => {
                // Another run created the profile first; merge into theirs
                let existing = self.profiles.get_by_owner(owner_id).await?.ok_or_else(|| {
                    AppError::Internal(format!(
                        "Profile for owner {} vanished during merge",
                        owner_id
                    ))
                })?;
                self.update_existing(&existing, owner_id, attributes).await
            }
        }
    }

    async fn update_existing(
        &self,
        existing: &UserProfile,
        owner_id: &str,
        attributes: &CompanyAttributes,
    ) -> Result<UserProfile> {
        let merged = merge_profile(Some(existing), owner_id, attributes, Utc::now());
        let updated = self.profiles.update(&merged).await?;
        tracing::info!("Merged extracted data into profile for owner {}", owner_id);
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::InMemoryProfileRepository;

    fn attributes(business_type: Option<&str>, industries: &[&str]) -> CompanyAttributes {
        CompanyAttributes {
            business_type: business_type.map(str::to_string),
            main_industries: industries.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    fn fields(p: &UserProfile) -> (Option<String>, Option<String>, Vec<String>, Vec<String>, Vec<String>) {
        (
            p.company_description.clone(),
            p.business_type.clone(),
            p.company_activities.clone(),
            p.main_industries.clone(),
            p.specializations.clone(),
        )
    }

    #[test]
    fn test_new_profile_defaults_absent_fields() {
        let profile = merge_profile(None, "owner-1", &attributes(None, &["Construction"]), Utc::now());

        assert_eq!(profile.owner_id, "owner-1");
        assert!(profile.business_type.is_none());
        assert!(profile.company_description.is_none());
        assert_eq!(profile.main_industries, vec!["Construction"]);
        assert!(profile.company_activities.is_empty());
        assert_eq!(profile.preferences.0, serde_json::json!({}));
    }

    #[test]
    fn test_absent_values_keep_existing_fields() {
        let existing = merge_profile(None, "owner-1", &attributes(Some("LLC"), &[]), Utc::now());

        let merged = merge_profile(
            Some(&existing),
            "owner-1",
            &attributes(None, &["Construction"]),
            Utc::now(),
        );

        assert_eq!(merged.business_type.as_deref(), Some("LLC"));
        assert_eq!(merged.main_industries, vec!["Construction"]);
        assert_eq!(merged.id, existing.id);
        assert_eq!(merged.created_at, existing.created_at);
    }

    #[test]
    fn test_present_values_overwrite() {
        let existing = merge_profile(None, "owner-1", &attributes(Some("LLC"), &["Retail"]), Utc::now());

        let merged = merge_profile(
            Some(&existing),
            "owner-1",
            &attributes(Some("Corporation"), &["Construction", "Energy"]),
            Utc::now(),
        );

        assert_eq!(merged.business_type.as_deref(), Some("Corporation"));
        assert_eq!(merged.main_industries, vec!["Construction", "Energy"]);
    }

    #[test]
    fn test_blank_text_counts_as_absent() {
        let existing = merge_profile(None, "owner-1", &attributes(Some("LLC"), &[]), Utc::now());

        let merged = merge_profile(Some(&existing), "owner-1", &attributes(Some("  "), &[]), Utc::now());

        assert_eq!(merged.business_type.as_deref(), Some("LLC"));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let existing = merge_profile(None, "owner-1", &attributes(Some("LLC"), &["Retail"]), Utc::now());
        let incoming = CompanyAttributes {
            company_description: Some("Builds roads".to_string()),
            company_activities: vec!["Paving".to_string()],
            ..attributes(None, &["Construction"])
        };

        let once = merge_profile(Some(&existing), "owner-1", &incoming, Utc::now());
        let twice = merge_profile(Some(&once), "owner-1", &incoming, Utc::now());

        assert_eq!(fields(&once), fields(&twice));
        assert_eq!(once.id, twice.id);
    }

    #[tokio::test]
    async fn test_merge_into_profile_creates_then_updates() {
        let repo = Arc::new(InMemoryProfileRepository::default());
        let merger = ProfileMerger::new(repo.clone());

        merger
            .merge_into_profile("owner-1", &attributes(Some("LLC"), &[]))
            .await
            .unwrap();
        let updated = merger
            .merge_into_profile("owner-1", &attributes(None, &["Construction"]))
            .await
            .unwrap();

        assert_eq!(updated.business_type.as_deref(), Some("LLC"));
        assert_eq!(updated.main_industries, vec!["Construction"]);
        assert_eq!(repo.count(), 1);
    }

    #[tokio::test]
    async fn test_merge_into_profile_twice_is_idempotent() {
        let repo = Arc::new(InMemoryProfileRepository::default());
        let merger = ProfileMerger::new(repo.clone());
        let incoming = attributes(Some("LLC"), &["Construction"]);

        let first = merger.merge_into_profile("owner-1", &incoming).await.unwrap();
        let second = merger.merge_into_profile("owner-1", &incoming).await.unwrap();

        assert_eq!(fields(&first), fields(&second));
    }

    #[tokio::test]
    async fn test_lost_create_race_merges_into_winner() {
        let repo = Arc::new(InMemoryProfileRepository::default());
        let winner = merge_profile(
            None,
            "owner-1",
            &CompanyAttributes {
                company_description: Some("Set by another run".to_string()),
                business_type: Some("Corporation".to_string()),
                ..Default::default()
            },
            Utc::now(),
        );
        repo.lose_next_create_to(winner.clone());
        let merger = ProfileMerger::new(repo.clone());

        let merged = merger
            .merge_into_profile("owner-1", &attributes(Some("LLC"), &["Construction"]))
            .await
            .unwrap();

        assert_eq!(merged.id, winner.id);
        assert_eq!(merged.company_description.as_deref(), Some("Set by another run"));
        assert_eq!(merged.business_type.as_deref(), Some("LLC"));
        assert_eq!(merged.main_industries, vec!["Construction"]);
        assert_eq!(repo.count(), 1);
        assert_eq!(repo.get_by_owner("owner-1").await.unwrap(), Some(merged));
    }

    #[tokio::test]
    async fn test_merge_empty_attributes_creates_blank_profile() {
        let repo = Arc::new(InMemoryProfileRepository::default());
        let merger = ProfileMerger::new(repo.clone());

        let profile = merger
            .merge_into_profile("owner-2", &CompanyAttributes::default())
            .await
            .unwrap();

        assert!(profile.business_type.is_none());
        assert!(profile.main_industries.is_empty());
        assert_eq!(repo.count(), 1);
    }
}
