//! Application configuration
//!
//! Central location for configuration constants, resource limits and
//! normalization boundaries, plus the environment-driven runtime settings
//! (endpoints, keys, data directory).

use serde::Deserialize;
use std::path::PathBuf;

// ===== Local Persistence =====

/// File name of the whole-store JSON snapshot inside the data directory.
/// The versioned name allows a clean break if the on-disk shape changes.
pub const STORE_FILE_NAME: &str = "nutri-track-store-v2.json";

// ===== Reminder Scanner =====

/// Interval between reminder scans in seconds
pub const SCAN_INTERVAL_SECS: u64 = 60;

/// Width of the "upcoming" notification window in minutes before the dose
pub const UPCOMING_WINDOW_MINUTES: i64 = 15;

/// Grace period in minutes after the dose time during which a reminder is
/// still announced as due (covers ticks missed while suspended)
pub const DUE_GRACE_MINUTES: i64 = 5;

// ===== Drug Lookup Normalization Limits =====

/// Maximum characters kept from a drug label description
pub const MEDICINE_DESCRIPTION_LIMIT: usize = 300;

/// Maximum characters kept from the dosage-and-administration text
pub const MEDICINE_DOSAGE_LIMIT: usize = 200;

/// Maximum side-effect / warning sentences kept per medicine
pub const MEDICINE_SENTENCE_LIMIT: usize = 5;

/// Maximum results requested from the drug label search
pub const DRUG_SEARCH_LIMIT: u32 = 20;

// ===== Default Endpoints =====

/// Default generation-service endpoint (content generation over REST)
pub const DEFAULT_GENERATION_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-flash-latest:generateContent";

/// Default drug-label search endpoint
pub const DEFAULT_DRUG_LOOKUP_URL: &str = "https://api.fda.gov/drug/label.json";

/// Runtime configuration loaded from the environment
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Directory holding the local store snapshot
    pub data_dir: PathBuf,
    /// Base URL of the remote document store
    pub sync_base_url: String,
    /// Base URL of the identity provider REST API
    pub auth_base_url: String,
    /// Project key passed to the identity provider
    pub auth_api_key: String,
    /// Generation-service endpoint
    pub generation_url: String,
    /// Generation-service key from the environment, overridden by the
    /// user's personal key and backed by the shared fallback key
    pub generation_api_key: Option<String>,
    /// Drug-label search endpoint
    pub drug_lookup_url: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let data_dir = std::env::var("NUTRITRACK_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("nutritrack-data"));
        Ok(Self {
            data_dir,
            sync_base_url: std::env::var("NUTRITRACK_SYNC_URL")
                .unwrap_or_else(|_| "http://localhost:8600/v1".into()),
            auth_base_url: std::env::var("NUTRITRACK_AUTH_URL")
                .unwrap_or_else(|_| "https://identitytoolkit.googleapis.com/v1".into()),
            auth_api_key: std::env::var("NUTRITRACK_AUTH_KEY").unwrap_or_default(),
            generation_url: std::env::var("NUTRITRACK_GENERATION_URL")
                .unwrap_or_else(|_| DEFAULT_GENERATION_URL.into()),
            generation_api_key: std::env::var("NUTRITRACK_GENERATION_KEY").ok(),
            drug_lookup_url: std::env::var("NUTRITRACK_DRUG_LOOKUP_URL")
                .unwrap_or_else(|_| DEFAULT_DRUG_LOOKUP_URL.into()),
        })
    }
}
