//! Generation-service client
//!
//! Food-photo analysis, weekly health insights and meal-plan generation
//! against the hosted generation API. Responses are validated into typed
//! shapes at the boundary; each call site carries its own fallback: a mock
//! food table for photo analysis, a static encouragement line for
//! insights, and a hard error for meal plans, which have no safe default.
//!
//! Key resolution order: the user's personal key, then the configured key
//! from the environment, then the shared fallback key fetched during
//! hydration.

use crate::error::{AppError, Result};
use crate::store::app_store::AppStore;
use crate::store::models::{DailyTotals, Goal, MealType};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

const FOOD_PROMPT: &str = "Identify the food in this image and estimate its nutritional values. \
    Return ONLY a JSON object with this exact structure: \
    {\"name\": \"food name\", \"calories\": number, \"protein\": number, \"carbs\": number, \"fat\": number}. \
    Use grams for macros. If there are multiple items, estimate the total.";

const INSIGHT_LOCKED: &str =
    "Log your meals daily to unlock personalized AI health insights and coaching.";

const INSIGHT_FALLBACK: &str =
    "You're consistently tracking your progress—that's the first step to success! Keep it up.";

/// Structured nutrition guess for a photographed meal
#[derive(Debug, Clone, PartialEq)]
pub struct FoodAnalysis {
    pub name: String,
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

/// One generated plan entry
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedMeal {
    pub meal_type: MealType,
    pub name: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<RequestContent>,
}

#[derive(Serialize)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

#[derive(Serialize, Default)]
struct RequestPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(rename = "inline_data", skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Deserialize)]
struct ResponseCandidate {
    content: ResponseContent,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct UpstreamError {
    error: UpstreamErrorBody,
}

#[derive(Deserialize)]
struct UpstreamErrorBody {
    message: String,
}

/// Loosely shaped guess as the model returns it
#[derive(Deserialize)]
struct RawFoodGuess {
    name: Option<String>,
    calories: Option<f64>,
    protein: Option<f64>,
    carbs: Option<f64>,
    fat: Option<f64>,
}

/// Strip markdown code fences the model tends to wrap JSON in
fn sanitize_json(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

fn parse_food_payload(text: &str) -> Result<FoodAnalysis> {
    let raw: RawFoodGuess = serde_json::from_str(&sanitize_json(text))
        .map_err(|e| AppError::MalformedResponse(format!("food guess: {}", e)))?;
    Ok(FoodAnalysis {
        name: raw.name.unwrap_or_else(|| "Unknown Food".to_string()),
        calories: raw.calories.unwrap_or(0.0).round(),
        protein_g: raw.protein.unwrap_or(0.0).round(),
        carbs_g: raw.carbs.unwrap_or(0.0).round(),
        fat_g: raw.fat.unwrap_or(0.0).round(),
    })
}

fn parse_meal_plan_payload(text: &str) -> Result<Vec<PlannedMeal>> {
    serde_json::from_str(&sanitize_json(text))
        .map_err(|e| AppError::MalformedResponse(format!("meal plan: {}", e)))
}

fn goal_label(goal: Goal) -> &'static str {
    match goal {
        Goal::Lose => "lose",
        Goal::Maintain => "maintain",
        Goal::Gain => "gain",
    }
}

/// Keyword table used when no API key is available
fn mock_food_guess(filename: &str) -> FoodAnalysis {
    const TABLE: &[(&[&str], &str, f64, f64, f64, f64)] = &[
        (&["avocado", "toast", "bread"], "Avocado Toast", 350.0, 12.0, 45.0, 18.0),
        (&["salad", "chicken", "greens", "lettuce"], "Grilled Chicken Salad", 420.0, 45.0, 12.0, 20.0),
        (&["oat", "porridge", "berry", "berries"], "Oatmeal with Berries", 280.0, 8.0, 54.0, 6.0),
        (&["burger", "beef", "cheeseburger", "bun"], "Double Cheeseburger", 850.0, 50.0, 40.0, 55.0),
        (&["salmon", "fish", "rice", "sushi"], "Salmon and Rice", 550.0, 40.0, 60.0, 15.0),
    ];

    let lowered = filename.to_lowercase();
    for (keywords, name, calories, protein, carbs, fat) in TABLE {
        if keywords.iter().any(|keyword| lowered.contains(keyword)) {
            return FoodAnalysis {
                name: (*name).to_string(),
                calories: *calories,
                protein_g: *protein,
                carbs_g: *carbs,
                fat_g: *fat,
            };
        }
    }
    FoodAnalysis {
        name: "Identified Food".to_string(),
        calories: 300.0,
        protein_g: 15.0,
        carbs_g: 35.0,
        fat_g: 10.0,
    }
}

#[derive(Clone)]
pub struct GenerationClient {
    http: reqwest::Client,
    url: String,
    configured_key: Option<String>,
    store: AppStore,
}

impl GenerationClient {
    pub fn new(url: &str, configured_key: Option<String>, store: AppStore) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("nutritrack-insights")
            .build()?;
        Ok(Self {
            http,
            url: url.to_string(),
            configured_key,
            store,
        })
    }

    fn resolve_api_key(&self) -> Option<String> {
        self.store
            .api_key()
            .or_else(|| self.configured_key.clone())
            .or_else(|| self.store.shared_api_key())
    }

    async fn generate(&self, parts: Vec<RequestPart>, api_key: &str) -> Result<String> {
        let request = GenerateRequest {
            contents: vec![RequestContent { parts }],
        };
        let response = self
            .http
            .post(&self.url)
            .query(&[("key", api_key)])
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response
                .json::<UpstreamError>()
                .await
                .map(|e| e.error.message)
                .unwrap_or_else(|_| format!("API error: {}", status));
            return Err(AppError::Upstream(message));
        }

        let body: GenerateResponse = response.json().await?;
        body.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .and_then(|p| p.text)
            .ok_or_else(|| {
                AppError::MalformedResponse("generation response carried no text".to_string())
            })
    }

    /// Identify the photographed food and estimate its macros. Without a
    /// usable key this falls back to the keyword table; with a key, API
    /// and parse failures propagate so the caller can tell the user.
    pub async fn analyze_food_image(
        &self,
        image: &[u8],
        mime_type: &str,
        filename: &str,
    ) -> Result<FoodAnalysis> {
        let Some(api_key) = self.resolve_api_key() else {
            tracing::warn!("No generation key found, falling back to mock food data");
            return Ok(mock_food_guess(filename));
        };

        let parts = vec![
            RequestPart {
                text: Some(FOOD_PROMPT.to_string()),
                ..RequestPart::default()
            },
            RequestPart {
                inline_data: Some(InlineData {
                    mime_type: mime_type.to_string(),
                    data: BASE64.encode(image),
                }),
                ..RequestPart::default()
            },
        ];

        let text = self.generate(parts, &api_key).await?;
        parse_food_payload(&text)
    }

    /// Short coaching narrative over the past week. Never fails: a missing
    /// key yields the unlock hint and any upstream failure yields a static
    /// encouragement line.
    pub async fn weekly_insight(&self, weekly: &[DailyTotals]) -> String {
        let Some(api_key) = self.resolve_api_key() else {
            return INSIGHT_LOCKED.to_string();
        };

        let goal = goal_label(self.store.user().goal);
        let data = serde_json::to_string(weekly).unwrap_or_else(|_| "[]".to_string());
        let prompt = format!(
            "Act as a professional nutritionist. Analyze this user's weekly health data:\n\
             Weekly Data: {}\nUser Goal: {}\n\
             Keep the advice concise, encouraging, and highly actionable (max 3 short sentences). \
             Focus on calories and macros.",
            data, goal
        );

        let parts = vec![RequestPart {
            text: Some(prompt),
            ..RequestPart::default()
        }];

        match self.generate(parts, &api_key).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Weekly insight generation failed: {}", e);
                INSIGHT_FALLBACK.to_string()
            }
        }
    }

    /// Generate a one-day meal plan for the current profile. There is no
    /// safe default here, so a missing key or upstream failure is an error.
    pub async fn generate_meal_plan(&self) -> Result<Vec<PlannedMeal>> {
        let Some(api_key) = self.resolve_api_key() else {
            return Err(AppError::FeatureUnavailable(
                "meal plan generation requires an API key".to_string(),
            ));
        };

        let user = self.store.user();
        let prompt = format!(
            "Act as a professional meal planner. Generate a daily meal plan for a user with these stats:\n\
             Goal: {}, Height: {}cm, Weight: {}kg, Age: {}.\n\
             Return ONLY a JSON array of 4 meal objects (breakfast, lunch, dinner, snack).\n\
             Structure: [{{\"mealType\": \"breakfast\"|\"lunch\"|\"dinner\"|\"snack\", \"name\": \"meal name\", \
             \"calories\": number, \"protein\": number, \"carbs\": number, \"fat\": number}}]",
            goal_label(user.goal),
            user.height_cm,
            user.weight_kg,
            user.age
        );

        let parts = vec![RequestPart {
            text: Some(prompt),
            ..RequestPart::default()
        }];

        let text = self.generate(parts, &api_key).await?;
        parse_meal_plan_payload(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::StaticIdentityProvider;
    use crate::sync::{MemoryDocumentStore, SyncGateway};
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn open_store() -> (AppStore, TempDir) {
        let temp = TempDir::new().unwrap();
        let gateway = SyncGateway::new(Arc::new(MemoryDocumentStore::new()));
        let provider = Arc::new(StaticIdentityProvider::new());
        let store = AppStore::open(temp.path(), gateway, provider).await.unwrap();
        (store, temp)
    }

    #[test]
    fn fences_are_stripped_before_parsing() {
        let text = "```json\n{\"name\": \"Ramen\", \"calories\": 480.4, \"protein\": 20, \"carbs\": 65, \"fat\": 14}\n```";
        let guess = parse_food_payload(text).unwrap();
        assert_eq!(guess.name, "Ramen");
        assert_eq!(guess.calories, 480.0);
        assert_eq!(guess.protein_g, 20.0);
    }

    #[test]
    fn missing_fields_get_defaults() {
        let guess = parse_food_payload("{\"calories\": 210}").unwrap();
        assert_eq!(guess.name, "Unknown Food");
        assert_eq!(guess.calories, 210.0);
        assert_eq!(guess.fat_g, 0.0);
    }

    #[test]
    fn malformed_payload_is_a_typed_error() {
        let err = parse_food_payload("the food looks tasty").unwrap_err();
        assert!(matches!(err, AppError::MalformedResponse(_)));
    }

    #[test]
    fn meal_plan_array_parses() {
        let text = r#"[
            {"mealType": "breakfast", "name": "Oats", "calories": 300, "protein": 10, "carbs": 50, "fat": 6},
            {"mealType": "dinner", "name": "Stew", "calories": 600, "protein": 35, "carbs": 40, "fat": 25}
        ]"#;
        let plan = parse_meal_plan_payload(text).unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].meal_type, MealType::Breakfast);
        assert_eq!(plan[1].name, "Stew");
    }

    #[test]
    fn mock_table_matches_on_filename_keywords() {
        assert_eq!(mock_food_guess("IMG_avocado_toast.jpg").name, "Avocado Toast");
        assert_eq!(mock_food_guess("sushi-box.png").name, "Salmon and Rice");
        assert_eq!(mock_food_guess("mystery.jpg").name, "Identified Food");
    }

    #[tokio::test]
    async fn key_resolution_prefers_personal_over_shared() {
        let (store, _temp) = open_store().await;
        let client = GenerationClient::new(
            "http://localhost/generate",
            Some("configured".into()),
            store.clone(),
        )
        .unwrap();

        assert_eq!(client.resolve_api_key().as_deref(), Some("configured"));

        store.set_api_key(Some("personal".into())).await;
        assert_eq!(client.resolve_api_key().as_deref(), Some("personal"));
    }

    #[tokio::test]
    async fn no_key_falls_back_to_mock_analysis() {
        let (store, _temp) = open_store().await;
        let client = GenerationClient::new("http://localhost/generate", None, store).unwrap();

        let guess = client
            .analyze_food_image(b"bytes", "image/jpeg", "burger.jpg")
            .await
            .unwrap();
        assert_eq!(guess.name, "Double Cheeseburger");
    }

    #[tokio::test]
    async fn no_key_locks_insight_and_plan() {
        let (store, _temp) = open_store().await;
        let client = GenerationClient::new("http://localhost/generate", None, store).unwrap();

        assert_eq!(client.weekly_insight(&[]).await, INSIGHT_LOCKED);

        let err = client.generate_meal_plan().await.unwrap_err();
        assert!(matches!(err, AppError::FeatureUnavailable(_)));
    }
}
