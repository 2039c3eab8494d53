//! Remote sync gateway
//!
//! Translates store operations into document reads and writes: one document
//! per (user, date) for logs and plans, one per user for the profile, one
//! sub-collection per user for reminders and recipe-book items, and one
//! global document for the shared fallback key. Documents are always
//! written in full; the last writer wins.

use crate::error::Result;
use crate::store::models::{DayLog, DayPlan, RecipeBookItem, RecipeDraft, Reminder, UserProfile};
use crate::sync::document_store::DocumentStore;
use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Global document carrying the shared fallback generation key
const SHARED_SETTINGS_PATH: &str = "settings/ai";

#[derive(Clone)]
pub struct SyncGateway {
    store: Arc<dyn DocumentStore>,
}

fn profile_path(email: &str) -> String {
    format!("users/{}", email)
}

fn log_path(email: &str, date: &str) -> String {
    format!("users/{}/logs/{}", email, date)
}

fn plan_path(email: &str, date: &str) -> String {
    format!("users/{}/plans/{}", email, date)
}

fn reminders_path(email: &str) -> String {
    format!("users/{}/reminders", email)
}

fn recipe_book_path(email: &str) -> String {
    format!("users/{}/recipeBook", email)
}

/// Deserialize a fetched collection entry, skipping documents that no
/// longer match the expected shape instead of aborting the whole fetch.
fn decode_entry<T: serde::de::DeserializeOwned>(
    kind: &str,
    id: &str,
    value: Value,
) -> Option<T> {
    match serde_json::from_value(value) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            tracing::warn!("Skipping malformed {} document {}: {}", kind, id, e);
            None
        }
    }
}

impl SyncGateway {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    // ----- profile -----

    pub async fn save_profile(&self, email: &str, profile: &UserProfile) -> Result<()> {
        let value = serde_json::to_value(profile)?;
        self.store
            .set_document(&profile_path(email), &value, true)
            .await
    }

    pub async fn fetch_profile(&self, email: &str) -> Result<Option<UserProfile>> {
        match self.store.get_document(&profile_path(email)).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    // ----- per-date records -----

    pub async fn save_log(&self, email: &str, log: &DayLog) -> Result<()> {
        let value = serde_json::to_value(log)?;
        self.store
            .set_document(&log_path(email, &log.date), &value, false)
            .await
    }

    pub async fn save_plan(&self, email: &str, plan: &DayPlan) -> Result<()> {
        let value = serde_json::to_value(plan)?;
        self.store
            .set_document(&plan_path(email, &plan.date), &value, false)
            .await
    }

    /// Every log document the user has ever written, keyed by date
    pub async fn fetch_day_logs(&self, email: &str) -> Result<HashMap<String, DayLog>> {
        let docs = self
            .store
            .list_collection(&format!("users/{}/logs", email))
            .await?;
        Ok(docs
            .into_iter()
            .filter_map(|(id, value)| decode_entry::<DayLog>("log", &id, value).map(|l| (id, l)))
            .collect())
    }

    pub async fn fetch_day_plans(&self, email: &str) -> Result<HashMap<String, DayPlan>> {
        let docs = self
            .store
            .list_collection(&format!("users/{}/plans", email))
            .await?;
        Ok(docs
            .into_iter()
            .filter_map(|(id, value)| decode_entry::<DayPlan>("plan", &id, value).map(|p| (id, p)))
            .collect())
    }

    // ----- reminders -----

    pub async fn save_reminder(&self, email: &str, reminder: &Reminder) -> Result<()> {
        let value = serde_json::to_value(reminder)?;
        let path = format!("{}/{}", reminders_path(email), reminder.id);
        self.store.set_document(&path, &value, false).await
    }

    pub async fn delete_reminder(&self, email: &str, id: &str) -> Result<()> {
        let path = format!("{}/{}", reminders_path(email), id);
        self.store.delete_document(&path).await
    }

    pub async fn fetch_reminders(&self, email: &str) -> Result<Vec<Reminder>> {
        let docs = self.store.list_collection(&reminders_path(email)).await?;
        Ok(docs
            .into_iter()
            .filter_map(|(id, value)| decode_entry::<Reminder>("reminder", &id, value))
            .collect())
    }

    // ----- recipe book -----

    /// The remote store assigns the id; the returned item carries it.
    pub async fn add_recipe(&self, email: &str, draft: &RecipeDraft) -> Result<RecipeBookItem> {
        let added_at = Utc::now().timestamp_millis();
        let mut value = serde_json::to_value(draft)?;
        value["added_at"] = added_at.into();

        let id = self
            .store
            .add_document(&recipe_book_path(email), &value)
            .await?;

        Ok(RecipeBookItem {
            id,
            post_id: draft.post_id.clone(),
            name: draft.name.clone(),
            calories: draft.calories,
            protein_g: draft.protein_g,
            carbs_g: draft.carbs_g,
            fat_g: draft.fat_g,
            source: draft.source.clone(),
            added_at,
        })
    }

    pub async fn delete_recipe(&self, email: &str, id: &str) -> Result<()> {
        let path = format!("{}/{}", recipe_book_path(email), id);
        self.store.delete_document(&path).await
    }

    pub async fn list_recipes(&self, email: &str) -> Result<Vec<RecipeBookItem>> {
        let docs = self.store.list_collection(&recipe_book_path(email)).await?;
        Ok(docs
            .into_iter()
            .filter_map(|(id, mut value)| {
                // The id lives outside the document body
                if let Value::Object(map) = &mut value {
                    map.insert("id".to_string(), Value::String(id.clone()));
                }
                decode_entry::<RecipeBookItem>("recipe", &id, value)
            })
            .collect())
    }

    // ----- shared settings -----

    /// Best-effort read of the shared fallback key. Denied access is an
    /// expected condition for most accounts and is reported as None.
    pub async fn fetch_shared_api_key(&self) -> Option<String> {
        match self.store.get_document(SHARED_SETTINGS_PATH).await {
            Ok(Some(value)) => value
                .get("apiKey")
                .and_then(Value::as_str)
                .map(str::to_string),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Could not fetch shared API key: {}", e);
                None
            }
        }
    }
}
