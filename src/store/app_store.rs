//! Application state store
//!
//! Single source of truth for all user-owned data. Every mutating action
//! follows the same two-phase pattern: apply the new value to the in-memory
//! state synchronously (the local mutation is atomic under the state lock
//! and is never observed half-applied), rewrite the device snapshot, then
//! issue a best-effort remote write when authenticated. Log, plan, profile
//! and reminder writes are fire-and-forget with no rollback; recipe-book
//! mutations go remote-first because the remote store assigns their ids,
//! and their failures propagate to the caller.

use crate::error::Result;
use crate::services::auth::IdentityProvider;
use crate::store::models::{
    AppState, DailyTotals, DayLog, DayPlan, MealDraft, MealEntry, ProfilePatch, RecipeBookItem,
    RecipeDraft, Reminder, ReminderDraft, ReminderMark, ReminderPhase, Theme, UserProfile,
};
use crate::store::persistence::StoreStorage;
use crate::sync::SyncGateway;
use std::future::Future;
use std::path::Path;
use std::sync::{Arc, RwLock};

#[derive(Clone)]
pub struct AppStore {
    state: Arc<RwLock<AppState>>,
    storage: StoreStorage,
    gateway: SyncGateway,
    provider: Arc<dyn IdentityProvider>,
}

impl AppStore {
    /// Open the store, rehydrating the device snapshot when one exists.
    /// A corrupt snapshot is discarded with a warning rather than blocking
    /// startup; the remote store still holds the durable copy.
    pub async fn open(
        data_dir: &Path,
        gateway: SyncGateway,
        provider: Arc<dyn IdentityProvider>,
    ) -> Result<Self> {
        let storage = StoreStorage::new(data_dir.to_path_buf());
        let state = match storage.load().await {
            Ok(Some(state)) => {
                tracing::info!("Rehydrated local store snapshot");
                state
            }
            Ok(None) => AppState::default(),
            Err(e) => {
                tracing::warn!("Discarding unreadable store snapshot: {}", e);
                AppState::default()
            }
        };

        Ok(Self {
            state: Arc::new(RwLock::new(state)),
            storage,
            gateway,
            provider,
        })
    }

    // ----- reads -----

    pub fn user(&self) -> UserProfile {
        self.state.read().unwrap().user.clone()
    }

    pub fn log(&self, date: &str) -> Option<DayLog> {
        self.state.read().unwrap().logs.get(date).cloned()
    }

    pub fn plan(&self, date: &str) -> Option<DayPlan> {
        self.state.read().unwrap().plans.get(date).cloned()
    }

    pub fn recipe_book(&self) -> Vec<RecipeBookItem> {
        self.state.read().unwrap().recipe_book.clone()
    }

    pub fn reminders(&self) -> Vec<Reminder> {
        self.state.read().unwrap().reminders.clone()
    }

    pub fn theme(&self) -> Theme {
        self.state.read().unwrap().theme
    }

    pub fn medicine_mode(&self) -> bool {
        self.state.read().unwrap().medicine_mode
    }

    pub fn api_key(&self) -> Option<String> {
        self.state.read().unwrap().api_key.clone()
    }

    pub fn shared_api_key(&self) -> Option<String> {
        self.state.read().unwrap().shared_api_key.clone()
    }

    /// Macro totals for one logged date, None when nothing is logged
    pub fn daily_totals(&self, date: &str) -> Option<DailyTotals> {
        let state = self.state.read().unwrap();
        let log = state.logs.get(date)?;
        let mut totals = DailyTotals {
            date: date.to_string(),
            calories: 0.0,
            protein_g: 0.0,
            carbs_g: 0.0,
            fat_g: 0.0,
        };
        for entry in &log.entries {
            totals.calories += entry.calories;
            totals.protein_g += entry.protein_g;
            totals.carbs_g += entry.carbs_g;
            totals.fat_g += entry.fat_g;
        }
        Some(totals)
    }

    pub fn has_reminder_fired(&self, id: &str, phase: ReminderPhase, day_key: &str) -> bool {
        let state = self.state.read().unwrap();
        let Some(mark) = state.notified.get(id) else {
            return false;
        };
        let last = match phase {
            ReminderPhase::Upcoming => mark.upcoming_day.as_deref(),
            ReminderPhase::Due => mark.due_day.as_deref(),
        };
        last == Some(day_key)
    }

    // ----- internals -----

    fn auth_email(&self) -> Option<String> {
        let state = self.state.read().unwrap();
        if state.user.is_authenticated && !state.user.email.is_empty() {
            Some(state.user.email.clone())
        } else {
            None
        }
    }

    /// Rewrite the device snapshot; local persistence failures never undo
    /// the in-memory mutation.
    async fn persist(&self) {
        let snapshot = self.state.read().unwrap().clone();
        if let Err(e) = self.storage.save(&snapshot).await {
            tracing::warn!("Could not persist store snapshot: {}", e);
        }
    }

    /// Fire-and-forget remote write. Failures are logged to the diagnostic
    /// channel; the optimistic local state stands uncorrected.
    fn spawn_remote<F>(&self, context: &'static str, fut: F)
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        tokio::spawn(async move {
            if let Err(e) = fut.await {
                tracing::error!("Remote sync error ({}): {}", context, e);
            }
        });
    }

    // ----- profile and flags -----

    /// Merge the given fields into the profile. When authenticated the full
    /// merged profile is persisted remotely; a remote failure motivates a
    /// "could not sync" warning, never an undo.
    pub async fn set_user(&self, patch: ProfilePatch) {
        let profile = {
            let mut state = self.state.write().unwrap();
            patch.apply(&mut state.user);
            state.user.clone()
        };
        self.persist().await;

        if let Some(email) = self.auth_email() {
            let gateway = self.gateway.clone();
            self.spawn_remote("profile", async move {
                gateway.save_profile(&email, &profile).await
            });
        }
    }

    pub async fn set_theme(&self, theme: Theme) {
        self.state.write().unwrap().theme = theme;
        self.persist().await;
    }

    pub async fn toggle_medicine_mode(&self) -> bool {
        let enabled = {
            let mut state = self.state.write().unwrap();
            state.medicine_mode = !state.medicine_mode;
            state.medicine_mode
        };
        self.persist().await;
        enabled
    }

    pub async fn set_api_key(&self, key: Option<String>) {
        self.state.write().unwrap().api_key = key;
        self.persist().await;
    }

    /// Sign out at the provider, then clear the authenticated flag and
    /// email locally. Cached logs, plans and recipes stay on the device.
    pub async fn logout(&self) -> Result<()> {
        self.provider.sign_out().await?;
        {
            let mut state = self.state.write().unwrap();
            state.user.is_authenticated = false;
            state.user.email.clear();
        }
        self.persist().await;
        Ok(())
    }

    // ----- day logs -----

    pub async fn add_entry(&self, date: &str, draft: MealDraft) -> MealEntry {
        let entry = MealEntry::from_draft(draft);
        let updated = {
            let mut state = self.state.write().unwrap();
            let log = state
                .logs
                .entry(date.to_string())
                .or_insert_with(|| DayLog::new(date));
            log.entries.push(entry.clone());
            log.clone()
        };
        self.persist().await;

        if let Some(email) = self.auth_email() {
            let gateway = self.gateway.clone();
            self.spawn_remote("log", async move { gateway.save_log(&email, &updated).await });
        }
        entry
    }

    /// No-op when the date has no record; the record is not created.
    pub async fn remove_entry(&self, date: &str, entry_id: &str) {
        let updated = {
            let mut state = self.state.write().unwrap();
            match state.logs.get_mut(date) {
                Some(log) => {
                    log.entries.retain(|e| e.id != entry_id);
                    log.clone()
                }
                None => return,
            }
        };
        self.persist().await;

        if let Some(email) = self.auth_email() {
            let gateway = self.gateway.clone();
            self.spawn_remote("log", async move { gateway.save_log(&email, &updated).await });
        }
    }

    pub async fn log_water(&self, date: &str, milliliters: u32) {
        let updated = {
            let mut state = self.state.write().unwrap();
            let log = state
                .logs
                .entry(date.to_string())
                .or_insert_with(|| DayLog::new(date));
            log.water_intake += milliliters;
            log.clone()
        };
        self.persist().await;

        if let Some(email) = self.auth_email() {
            let gateway = self.gateway.clone();
            self.spawn_remote("log", async move { gateway.save_log(&email, &updated).await });
        }
    }

    // ----- day plans -----

    pub async fn add_plan_entry(&self, date: &str, draft: MealDraft) -> MealEntry {
        let entry = MealEntry::from_draft(draft);
        let updated = {
            let mut state = self.state.write().unwrap();
            let plan = state
                .plans
                .entry(date.to_string())
                .or_insert_with(|| DayPlan::new(date));
            plan.entries.push(entry.clone());
            plan.recompute_total();
            plan.clone()
        };
        self.persist().await;

        if let Some(email) = self.auth_email() {
            let gateway = self.gateway.clone();
            self.spawn_remote("plan", async move {
                gateway.save_plan(&email, &updated).await
            });
        }
        entry
    }

    pub async fn remove_plan_entry(&self, date: &str, entry_id: &str) {
        let updated = {
            let mut state = self.state.write().unwrap();
            match state.plans.get_mut(date) {
                Some(plan) => {
                    plan.entries.retain(|e| e.id != entry_id);
                    plan.recompute_total();
                    plan.clone()
                }
                None => return,
            }
        };
        self.persist().await;

        if let Some(email) = self.auth_email() {
            let gateway = self.gateway.clone();
            self.spawn_remote("plan", async move {
                gateway.save_plan(&email, &updated).await
            });
        }
    }

    // ----- reminders -----

    pub async fn add_reminder(&self, draft: ReminderDraft) -> Reminder {
        let reminder = Reminder::from_draft(draft);
        {
            let mut state = self.state.write().unwrap();
            state.reminders.push(reminder.clone());
        }
        self.persist().await;

        if let Some(email) = self.auth_email() {
            let gateway = self.gateway.clone();
            let saved = reminder.clone();
            self.spawn_remote("reminder", async move {
                gateway.save_reminder(&email, &saved).await
            });
        }
        reminder
    }

    pub async fn remove_reminder(&self, id: &str) {
        let removed = {
            let mut state = self.state.write().unwrap();
            let before = state.reminders.len();
            state.reminders.retain(|r| r.id != id);
            state.notified.remove(id);
            state.reminders.len() != before
        };
        if !removed {
            return;
        }
        self.persist().await;

        if let Some(email) = self.auth_email() {
            let gateway = self.gateway.clone();
            let id = id.to_string();
            self.spawn_remote("reminder", async move {
                gateway.delete_reminder(&email, &id).await
            });
        }
    }

    pub async fn set_reminder_enabled(&self, id: &str, enabled: bool) {
        let updated = {
            let mut state = self.state.write().unwrap();
            match state.reminders.iter_mut().find(|r| r.id == id) {
                Some(reminder) => {
                    reminder.enabled = enabled;
                    reminder.clone()
                }
                None => return,
            }
        };
        self.persist().await;

        if let Some(email) = self.auth_email() {
            let gateway = self.gateway.clone();
            self.spawn_remote("reminder", async move {
                gateway.save_reminder(&email, &updated).await
            });
        }
    }

    /// Record that a reminder was announced for the given phase and day.
    /// The mark is device-persisted so a restart inside the same window
    /// does not re-notify, and is never synced remotely.
    pub async fn mark_reminder_fired(&self, id: &str, phase: ReminderPhase, day_key: &str) {
        {
            let mut state = self.state.write().unwrap();
            let mark = state
                .notified
                .entry(id.to_string())
                .or_insert_with(ReminderMark::default);
            match phase {
                ReminderPhase::Upcoming => mark.upcoming_day = Some(day_key.to_string()),
                ReminderPhase::Due => mark.due_day = Some(day_key.to_string()),
            }
        }
        self.persist().await;
    }

    // ----- recipe book -----

    /// Remote-first: the store assigns the id, so this is a no-op while
    /// unauthenticated and a remote failure propagates to the caller.
    pub async fn add_to_recipe_book(&self, draft: RecipeDraft) -> Result<Option<RecipeBookItem>> {
        let Some(email) = self.auth_email() else {
            return Ok(None);
        };

        let item = self.gateway.add_recipe(&email, &draft).await?;
        {
            let mut state = self.state.write().unwrap();
            state.recipe_book.insert(0, item.clone());
        }
        self.persist().await;
        Ok(Some(item))
    }

    pub async fn remove_from_recipe_book(&self, id: &str) -> Result<()> {
        let Some(email) = self.auth_email() else {
            return Ok(());
        };

        self.gateway.delete_recipe(&email, id).await?;
        {
            let mut state = self.state.write().unwrap();
            state.recipe_book.retain(|item| item.id != id);
        }
        self.persist().await;
        Ok(())
    }

    pub async fn load_recipe_book(&self) {
        let Some(email) = self.auth_email() else {
            return;
        };
        match self.gateway.list_recipes(&email).await {
            Ok(mut recipes) => {
                recipes.sort_by(|a, b| b.added_at.cmp(&a.added_at));
                self.state.write().unwrap().recipe_book = recipes;
                self.persist().await;
            }
            Err(e) => tracing::error!("Failed to load recipe book: {}", e),
        }
    }

    // ----- hydration -----

    /// Full remote hydration after authentication. Each section is fetched
    /// in order; the first failing section aborts the rest and is logged,
    /// leaving the store in whatever partial state it reached.
    pub async fn sync_with_remote(&self) {
        let Some(email) = self.auth_email() else {
            return;
        };
        tracing::info!("Syncing with remote store for {}", email);
        if let Err(e) = self.hydrate(&email).await {
            tracing::error!("Remote hydration error: {}", e);
        }
    }

    async fn hydrate(&self, email: &str) -> Result<()> {
        if let Some(remote) = self.gateway.fetch_profile(email).await? {
            let mut state = self.state.write().unwrap();
            state.user = remote;
            // The partition key and auth flag are local facts
            state.user.is_authenticated = true;
            state.user.email = email.to_string();
        }

        // Remote value wins per date key; local-only dates are preserved
        let logs = self.gateway.fetch_day_logs(email).await?;
        let plans = self.gateway.fetch_day_plans(email).await?;
        {
            let mut state = self.state.write().unwrap();
            state.logs.extend(logs);
            state.plans.extend(plans);
        }

        let reminders = self.gateway.fetch_reminders(email).await?;
        {
            let mut state = self.state.write().unwrap();
            for reminder in reminders {
                match state.reminders.iter_mut().find(|r| r.id == reminder.id) {
                    Some(existing) => *existing = reminder,
                    None => state.reminders.push(reminder),
                }
            }
        }

        if let Some(key) = self.gateway.fetch_shared_api_key().await {
            self.state.write().unwrap().shared_api_key = Some(key);
        }

        self.persist().await;
        tracing::info!("Remote sync complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::StaticIdentityProvider;
    use crate::store::models::MealType;
    use crate::sync::MemoryDocumentStore;
    use serde_json::json;
    use std::time::Duration;
    use tempfile::TempDir;

    async fn open_store() -> (AppStore, Arc<MemoryDocumentStore>, TempDir) {
        let temp = TempDir::new().unwrap();
        let docs = Arc::new(MemoryDocumentStore::new());
        let gateway = SyncGateway::new(docs.clone());
        let provider = Arc::new(StaticIdentityProvider::new());
        let store = AppStore::open(temp.path(), gateway, provider).await.unwrap();
        (store, docs, temp)
    }

    async fn sign_in(store: &AppStore, email: &str) {
        store
            .set_user(ProfilePatch {
                is_authenticated: Some(true),
                email: Some(email.to_string()),
                ..ProfilePatch::default()
            })
            .await;
    }

    fn draft(name: &str, calories: f64) -> MealDraft {
        MealDraft {
            meal_type: MealType::Lunch,
            name: name.into(),
            calories,
            protein_g: 10.0,
            carbs_g: 20.0,
            fat_g: 5.0,
        }
    }

    async fn settle() {
        // Let spawned fire-and-forget writes complete
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn append_is_non_destructive() {
        let (store, _, _temp) = open_store().await;

        let first = store.add_entry("2024-03-01", draft("Soup", 200.0)).await;
        let second = store.add_entry("2024-03-01", draft("Bread", 150.0)).await;

        let log = store.log("2024-03-01").unwrap();
        assert_eq!(log.entries.len(), 2);
        assert!(log.entries.iter().any(|e| e.id == first.id));
        assert!(log.entries.iter().any(|e| e.id == second.id));
    }

    #[tokio::test]
    async fn remove_missing_entry_is_a_no_op() {
        let (store, _, _temp) = open_store().await;

        store.remove_entry("2024-03-02", "no-such-id").await;
        assert!(store.log("2024-03-02").is_none(), "record must not be created");

        let kept = store.add_entry("2024-03-03", draft("Rice", 180.0)).await;
        store.remove_entry("2024-03-03", "no-such-id").await;
        let log = store.log("2024-03-03").unwrap();
        assert_eq!(log.entries.len(), 1);
        assert_eq!(log.entries[0].id, kept.id);
    }

    #[tokio::test]
    async fn remove_filters_by_id() {
        let (store, _, _temp) = open_store().await;

        let first = store.add_entry("2024-03-04", draft("Soup", 200.0)).await;
        let second = store.add_entry("2024-03-04", draft("Bread", 150.0)).await;

        store.remove_entry("2024-03-04", &first.id).await;
        let log = store.log("2024-03-04").unwrap();
        assert_eq!(log.entries.len(), 1);
        assert_eq!(log.entries[0].id, second.id);
    }

    #[tokio::test]
    async fn plan_total_tracks_mutations() {
        let (store, _, _temp) = open_store().await;

        let entry = store.add_plan_entry("2024-03-05", draft("Oats", 280.0)).await;
        store.add_plan_entry("2024-03-05", draft("Curry", 520.0)).await;
        assert_eq!(store.plan("2024-03-05").unwrap().total_calories, 800.0);

        store.remove_plan_entry("2024-03-05", &entry.id).await;
        assert_eq!(store.plan("2024-03-05").unwrap().total_calories, 520.0);
    }

    #[tokio::test]
    async fn authenticated_mutations_reach_the_remote_store() {
        let (store, docs, _temp) = open_store().await;
        sign_in(&store, "a@b.c").await;

        store.add_entry("2024-03-06", draft("Soup", 200.0)).await;
        settle().await;

        let doc = docs.peek("users/a@b.c/logs/2024-03-06").unwrap();
        assert_eq!(doc["entries"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn remote_failure_leaves_local_state_standing() {
        let (store, docs, _temp) = open_store().await;
        sign_in(&store, "a@b.c").await;
        docs.set_offline(true);

        store.add_entry("2024-03-07", draft("Soup", 200.0)).await;
        settle().await;

        // Local append survived, remote write was dropped
        assert_eq!(store.log("2024-03-07").unwrap().entries.len(), 1);
        assert!(docs.peek("users/a@b.c/logs/2024-03-07").is_none());
    }

    #[tokio::test]
    async fn guest_mutations_stay_local() {
        let (store, docs, _temp) = open_store().await;

        store.add_entry("2024-03-08", draft("Soup", 200.0)).await;
        settle().await;

        assert!(docs.peek("users//logs/2024-03-08").is_none());
        assert_eq!(store.log("2024-03-08").unwrap().entries.len(), 1);
    }

    #[tokio::test]
    async fn recipe_book_requires_authentication() {
        let (store, _, _temp) = open_store().await;

        let result = store
            .add_to_recipe_book(RecipeDraft {
                post_id: None,
                name: "Curry".into(),
                calories: 500.0,
                protein_g: 20.0,
                carbs_g: 60.0,
                fat_g: 15.0,
                source: "manual".into(),
            })
            .await
            .unwrap();

        assert!(result.is_none());
        assert!(store.recipe_book().is_empty());
    }

    #[tokio::test]
    async fn recipe_book_save_and_unsave_round_trip() {
        let (store, _, _temp) = open_store().await;
        sign_in(&store, "a@b.c").await;

        let item = store
            .add_to_recipe_book(RecipeDraft {
                post_id: Some("post-9".into()),
                name: "Curry".into(),
                calories: 500.0,
                protein_g: 20.0,
                carbs_g: 60.0,
                fat_g: 15.0,
                source: "community".into(),
            })
            .await
            .unwrap()
            .expect("authenticated save returns the item");

        assert!(!item.id.is_empty());
        assert_eq!(store.recipe_book().len(), 1);
        assert_eq!(store.recipe_book()[0].id, item.id);

        store.remove_from_recipe_book(&item.id).await.unwrap();
        assert!(store.recipe_book().iter().all(|i| i.id != item.id));
    }

    #[tokio::test]
    async fn recipe_book_remote_failure_propagates_without_local_change() {
        let (store, docs, _temp) = open_store().await;
        sign_in(&store, "a@b.c").await;
        docs.set_offline(true);

        let result = store
            .add_to_recipe_book(RecipeDraft {
                post_id: None,
                name: "Curry".into(),
                calories: 500.0,
                protein_g: 20.0,
                carbs_g: 60.0,
                fat_g: 15.0,
                source: "manual".into(),
            })
            .await;

        assert!(result.is_err());
        assert!(store.recipe_book().is_empty());
    }

    #[tokio::test]
    async fn hydration_merges_remote_dates_and_keeps_local_only_dates() {
        let (store, docs, _temp) = open_store().await;

        // A date that exists only locally
        store.add_entry("2024-01-02", draft("Local", 100.0)).await;

        docs.seed(
            "users/a@b.c/logs/2024-01-01",
            json!({
                "date": "2024-01-01",
                "entries": [{
                    "id": "remote-1",
                    "meal_type": "dinner",
                    "name": "Remote Stew",
                    "calories": 640.0,
                    "protein_g": 30.0,
                    "carbs_g": 50.0,
                    "fat_g": 22.0,
                    "timestamp": 1704100000000i64
                }],
                "water_intake": 250
            }),
        );

        sign_in(&store, "a@b.c").await;
        store.sync_with_remote().await;

        let remote_day = store.log("2024-01-01").expect("remote date hydrated");
        assert_eq!(remote_day.entries.len(), 1);
        assert_eq!(remote_day.entries[0].id, "remote-1");
        assert_eq!(remote_day.water_intake, 250);

        let local_day = store.log("2024-01-02").expect("local-only date preserved");
        assert_eq!(local_day.entries[0].name, "Local");
    }

    #[tokio::test]
    async fn hydration_merges_remote_profile_and_shared_key() {
        let (store, docs, _temp) = open_store().await;
        docs.seed(
            "users/a@b.c",
            json!({
                "is_authenticated": true,
                "name": "Ada",
                "email": "a@b.c",
                "height_cm": 168.0,
                "weight_kg": 61.0,
                "age": 34,
                "gender": "female",
                "activity_level": "active",
                "goal": "gain",
                "onboarding_completed": true
            }),
        );
        docs.seed("settings/ai", json!({"apiKey": "shared-123"}));

        sign_in(&store, "a@b.c").await;
        store.sync_with_remote().await;

        let user = store.user();
        assert_eq!(user.name, "Ada");
        assert_eq!(user.weight_kg, 61.0);
        assert!(user.is_authenticated);
        assert_eq!(store.shared_api_key().as_deref(), Some("shared-123"));
    }

    #[tokio::test]
    async fn hydration_shared_key_denial_is_not_fatal() {
        let (store, docs, _temp) = open_store().await;
        docs.deny_path("settings/ai");
        docs.seed(
            "users/a@b.c/logs/2024-01-01",
            json!({"date": "2024-01-01", "entries": [], "water_intake": 0}),
        );

        sign_in(&store, "a@b.c").await;
        store.sync_with_remote().await;

        assert!(store.log("2024-01-01").is_some());
        assert!(store.shared_api_key().is_none());
    }

    #[tokio::test]
    async fn logout_clears_auth_but_keeps_cached_data() {
        let (store, _, _temp) = open_store().await;
        sign_in(&store, "a@b.c").await;
        store.add_entry("2024-03-09", draft("Soup", 200.0)).await;

        store.logout().await.unwrap();

        let user = store.user();
        assert!(!user.is_authenticated);
        assert!(user.email.is_empty());
        assert!(store.log("2024-03-09").is_some());
    }

    #[tokio::test]
    async fn snapshot_survives_reopen() {
        let temp = TempDir::new().unwrap();
        let docs = Arc::new(MemoryDocumentStore::new());

        {
            let gateway = SyncGateway::new(docs.clone());
            let provider = Arc::new(StaticIdentityProvider::new());
            let store = AppStore::open(temp.path(), gateway, provider).await.unwrap();
            store.add_entry("2024-03-10", draft("Soup", 200.0)).await;
            store.set_theme(Theme::Dark).await;
        }

        let gateway = SyncGateway::new(docs);
        let provider = Arc::new(StaticIdentityProvider::new());
        let reopened = AppStore::open(temp.path(), gateway, provider).await.unwrap();

        assert_eq!(reopened.theme(), Theme::Dark);
        assert_eq!(reopened.log("2024-03-10").unwrap().entries.len(), 1);
    }

    #[tokio::test]
    async fn flags_flip_locally_and_never_sync() {
        let (store, docs, _temp) = open_store().await;
        sign_in(&store, "a@b.c").await;

        assert!(store.toggle_medicine_mode().await);
        assert!(!store.toggle_medicine_mode().await);
        store.set_theme(Theme::Dark).await;
        store.set_api_key(Some("personal".into())).await;
        settle().await;

        assert_eq!(store.theme(), Theme::Dark);
        assert!(!store.medicine_mode());
        assert_eq!(store.api_key().as_deref(), Some("personal"));
        // Only the profile write from sign_in reached the remote store
        assert!(docs.peek("users/a@b.c").is_some());
    }

    #[tokio::test]
    async fn daily_totals_sum_logged_entries() {
        let (store, _, _temp) = open_store().await;
        assert!(store.daily_totals("2024-04-01").is_none());

        store.add_entry("2024-04-01", draft("Soup", 200.0)).await;
        store.add_entry("2024-04-01", draft("Bread", 150.0)).await;

        let totals = store.daily_totals("2024-04-01").unwrap();
        assert_eq!(totals.calories, 350.0);
        assert_eq!(totals.protein_g, 20.0);
        assert_eq!(totals.carbs_g, 40.0);
        assert_eq!(totals.fat_g, 10.0);
    }

    #[tokio::test]
    async fn reminder_marks_persist_per_phase_and_day() {
        let (store, _, _temp) = open_store().await;

        let reminder = store
            .add_reminder(ReminderDraft {
                medicine_name: "Amoxicillin".into(),
                time: "08:00".into(),
                enabled: true,
                notes: "After food".into(),
                phone: None,
            })
            .await;

        assert!(!store.has_reminder_fired(&reminder.id, ReminderPhase::Upcoming, "15"));
        store
            .mark_reminder_fired(&reminder.id, ReminderPhase::Upcoming, "15")
            .await;
        assert!(store.has_reminder_fired(&reminder.id, ReminderPhase::Upcoming, "15"));
        assert!(!store.has_reminder_fired(&reminder.id, ReminderPhase::Due, "15"));
        assert!(!store.has_reminder_fired(&reminder.id, ReminderPhase::Upcoming, "16"));
    }
}
