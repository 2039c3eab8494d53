//! Drug-information lookup
//!
//! Full-text search against a drug-label API keyed by brand or generic
//! name, normalized into the `Medicine` record the UI consumes. When the
//! remote lookup fails the search degrades to a small static dataset
//! matched by case-insensitive substring; a genuine empty result set is
//! returned as-is.

use crate::config::{
    DRUG_SEARCH_LIMIT, MEDICINE_DESCRIPTION_LIMIT, MEDICINE_DOSAGE_LIMIT, MEDICINE_SENTENCE_LIMIT,
};
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Normalized drug record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medicine {
    pub id: String,
    pub name: String,
    pub generic_name: String,
    pub description: String,
    pub side_effects: Vec<String>,
    pub dosage: String,
    pub warnings: Vec<String>,
}

/// Label fields arrive as either a string or an array of strings
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TextField {
    One(String),
    Many(Vec<String>),
}

impl TextField {
    fn first(&self) -> &str {
        match self {
            TextField::One(s) => s,
            TextField::Many(items) => items.first().map(String::as_str).unwrap_or(""),
        }
    }
}

fn first_of(field: &Option<TextField>) -> String {
    field.as_ref().map(|f| f.first().to_string()).unwrap_or_default()
}

#[derive(Debug, Default, Deserialize)]
struct OpenFda {
    brand_name: Option<TextField>,
    generic_name: Option<TextField>,
    product_ndc: Option<TextField>,
}

#[derive(Debug, Deserialize)]
struct LabelEntry {
    #[serde(default)]
    openfda: OpenFda,
    description: Option<TextField>,
    indications_and_usage: Option<TextField>,
    dosage_and_administration: Option<TextField>,
    warnings: Option<TextField>,
    adverse_reactions: Option<TextField>,
}

#[derive(Debug, Deserialize)]
struct LabelResponse {
    #[serde(default)]
    results: Vec<LabelEntry>,
}

fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        text.to_string()
    } else {
        let cut: String = text.chars().take(limit).collect();
        format!("{}...", cut)
    }
}

/// Break label prose into a short list of sentences
fn sentence_list(text: &str) -> Vec<String> {
    text.split(". ")
        .take(MEDICINE_SENTENCE_LIMIT)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn normalize_label_entry(entry: LabelEntry, query: &str) -> Medicine {
    // Prefer the description, fall back to indications
    let description_raw = if entry.description.is_some() {
        first_of(&entry.description)
    } else {
        first_of(&entry.indications_and_usage)
    };
    let description = truncate(&description_raw, MEDICINE_DESCRIPTION_LIMIT);

    let side_effects = sentence_list(&first_of(&entry.adverse_reactions));
    let warnings = sentence_list(&first_of(&entry.warnings));

    let name = first_of(&entry.openfda.brand_name);
    let id = first_of(&entry.openfda.product_ndc);

    Medicine {
        id: if id.is_empty() {
            Uuid::new_v4().to_string()
        } else {
            id
        },
        name: if name.is_empty() {
            query.to_string()
        } else {
            name
        },
        generic_name: first_of(&entry.openfda.generic_name),
        description: if description.is_empty() {
            "No description available.".to_string()
        } else {
            description
        },
        side_effects: if side_effects.is_empty() {
            vec!["Consult your doctor for side effects.".to_string()]
        } else {
            side_effects
        },
        dosage: truncate(
            &first_of(&entry.dosage_and_administration),
            MEDICINE_DOSAGE_LIMIT,
        ),
        warnings: if warnings.is_empty() {
            vec!["Consult your doctor.".to_string()]
        } else {
            warnings
        },
    }
}

/// Brand OR generic name term: single words get a wildcard for an
/// autocomplete feel, phrases are quoted for exact match.
fn build_search_term(query: &str) -> String {
    if query.contains(' ') {
        format!("\"{}\"", query)
    } else {
        format!("{}*", query)
    }
}

struct StaticMedicine {
    name: &'static str,
    generic_name: &'static str,
    description: &'static str,
    side_effects: &'static [&'static str],
    dosage: &'static str,
    warnings: &'static [&'static str],
}

/// Offline dataset covering common medications
const STATIC_MEDICINES: &[StaticMedicine] = &[
    StaticMedicine {
        name: "Paracetamol",
        generic_name: "acetaminophen",
        description: "Analgesic and antipyretic used for mild to moderate pain and fever.",
        side_effects: &["Nausea", "Rash", "Liver damage at high doses"],
        dosage: "500mg to 1000mg every 4 to 6 hours, maximum 4g per day.",
        warnings: &["Do not combine with other acetaminophen products", "Avoid alcohol"],
    },
    StaticMedicine {
        name: "Ibuprofen",
        generic_name: "ibuprofen",
        description: "Nonsteroidal anti-inflammatory drug for pain, fever and inflammation.",
        side_effects: &["Stomach upset", "Heartburn", "Dizziness"],
        dosage: "200mg to 400mg every 4 to 6 hours with food.",
        warnings: &["Take with food", "Not recommended with stomach ulcers"],
    },
    StaticMedicine {
        name: "Amoxicillin",
        generic_name: "amoxicillin",
        description: "Penicillin antibiotic for bacterial infections of the ear, nose, throat and airways.",
        side_effects: &["Diarrhea", "Nausea", "Skin rash"],
        dosage: "250mg to 500mg three times daily, complete the full course.",
        warnings: &["Tell your doctor about penicillin allergies"],
    },
    StaticMedicine {
        name: "Aspirin",
        generic_name: "acetylsalicylic acid",
        description: "Salicylate used for pain, fever, inflammation and blood thinning.",
        side_effects: &["Stomach irritation", "Bleeding risk", "Tinnitus at high doses"],
        dosage: "325mg to 650mg every 4 hours as needed.",
        warnings: &["Not for children with viral illness", "Avoid before surgery"],
    },
    StaticMedicine {
        name: "Metformin",
        generic_name: "metformin hydrochloride",
        description: "First-line oral medication for type 2 diabetes, lowers glucose production.",
        side_effects: &["Nausea", "Diarrhea", "Metallic taste"],
        dosage: "500mg twice daily with meals, as directed.",
        warnings: &["Monitor kidney function", "Stop before contrast imaging"],
    },
    StaticMedicine {
        name: "Loratadine",
        generic_name: "loratadine",
        description: "Non-drowsy antihistamine for hay fever and other allergies.",
        side_effects: &["Headache", "Dry mouth", "Fatigue"],
        dosage: "10mg once daily.",
        warnings: &["Consult your doctor if pregnant"],
    },
];

/// Case-insensitive substring search over the static dataset
fn static_search(query: &str) -> Vec<Medicine> {
    let lowered = query.to_lowercase();
    STATIC_MEDICINES
        .iter()
        .filter(|m| {
            m.name.to_lowercase().contains(&lowered)
                || m.generic_name.to_lowercase().contains(&lowered)
        })
        .map(|m| Medicine {
            id: format!("static-{}", m.name.to_lowercase()),
            name: m.name.to_string(),
            generic_name: m.generic_name.to_string(),
            description: m.description.to_string(),
            side_effects: m.side_effects.iter().map(|s| s.to_string()).collect(),
            dosage: m.dosage.to_string(),
            warnings: m.warnings.iter().map(|s| s.to_string()).collect(),
        })
        .collect()
}

#[derive(Clone)]
pub struct MedicineLookup {
    http: reqwest::Client,
    base_url: String,
}

impl MedicineLookup {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("nutritrack-medicine")
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.to_string(),
        })
    }

    async fn remote_search(&self, query: &str) -> Result<Vec<Medicine>> {
        let term = build_search_term(query);
        let search = format!(
            "openfda.brand_name:{} openfda.generic_name:{}",
            term, term
        );

        let limit = DRUG_SEARCH_LIMIT.to_string();
        let response = self
            .http
            .get(&self.base_url)
            .query(&[("search", search.as_str()), ("limit", limit.as_str())])
            .send()
            .await?;

        // 404 means no matching labels, not a failure
        if response.status().as_u16() == 404 {
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "drug label search returned {}",
                response.status()
            )));
        }

        let body: LabelResponse = response.json().await?;
        Ok(body
            .results
            .into_iter()
            .map(|entry| normalize_label_entry(entry, query))
            .collect())
    }

    /// Search by brand or generic name. Remote failures degrade to the
    /// static dataset; an empty query yields an empty list without I/O.
    pub async fn search(&self, query: &str) -> Vec<Medicine> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }

        match self.remote_search(trimmed).await {
            Ok(results) => results,
            Err(e) => {
                tracing::warn!("Drug label search failed, using static dataset: {}", e);
                static_search(trimmed)
            }
        }
    }
}
