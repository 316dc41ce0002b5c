// src/types/search_query.rs
use serde::{Deserialize, Serialize};

use crate::error::{AssistantError, AssistantResult};
use crate::utils;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub keywords: Vec<String>,
    pub skills: Vec<String>,
    pub experience: ExperienceRange,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub education: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperienceRange {
    pub min: i32,
    pub max: i32,
}

impl ExperienceRange {
    pub fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    /// The zero range means "no experience preference".
    pub fn is_unset(&self) -> bool {
        self.min == 0 && self.max == 0
    }
}

// The optimizer prompt shows comma-separated strings, models also answer with arrays.
#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrList {
    Text(String),
    List(Vec<String>),
}

impl StringOrList {
    fn into_items(self) -> Vec<String> {
        let raw = match self {
            StringOrList::Text(text) => text.split([',', '，']).map(str::to_string).collect(),
            StringOrList::List(items) => items,
        };
        utils::dedup_preserving_order(
            raw.into_iter()
                .map(|item| item.trim().to_string())
                .filter(|item| !item.is_empty()),
        )
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelSearchQuery {
    #[serde(default)]
    keywords: Option<StringOrList>,
    #[serde(default)]
    skills: Option<StringOrList>,
    #[serde(default)]
    experience: Option<ExperienceRange>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default, alias = "company_size")]
    company_size: Option<String>,
    #[serde(default)]
    education: Option<String>,
}

impl SearchQuery {
    /// Query that carries a single free-text keyword and nothing else.
    pub fn from_text(text: &str) -> Self {
        Self {
            keywords: vec![text.to_string()],
            ..Default::default()
        }
    }

    /// Decode the optimizer's JSON answer. Code fences around the object are tolerated.
    pub fn from_model_output(content: &str) -> AssistantResult<Self> {
        let json = utils::strip_code_fences(content);
        let parsed: ModelSearchQuery = serde_json::from_str(json)
            .map_err(|e| AssistantError::ResponseParse(format!("search query: {}", e)))?;

        let non_empty = |value: Option<String>| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Ok(Self {
            keywords: parsed.keywords.map(StringOrList::into_items).unwrap_or_default(),
            skills: parsed.skills.map(StringOrList::into_items).unwrap_or_default(),
            experience: parsed.experience.unwrap_or_default(),
            location: parsed.location.unwrap_or_default().trim().to_string(),
            company_size: non_empty(parsed.company_size),
            education: non_empty(parsed.education),
        })
    }
}
