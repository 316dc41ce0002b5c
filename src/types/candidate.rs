// src/types/candidate.rs
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One candidate card as scraped from the host page.
///
/// Ids are regenerated on every extraction, so the same person scraped twice
/// gets two different ids.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CandidateProfile {
    pub id: String,
    pub name: String,
    pub headline: String,
    pub location: String,
    pub experience: Vec<ExperienceEntry>,
    pub education: Vec<EducationEntry>,
    pub skills: Vec<String>,
    pub summary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExperienceEntry {
    pub title: String,
    pub company: String,
    pub duration: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EducationEntry {
    pub school: String,
    pub degree: String,
    pub field: String,
    pub year: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedCandidate {
    #[serde(flatten)]
    pub profile: CandidateProfile,
    pub score: u8,
    pub reasoning: String,
    pub matched_skills: Vec<String>,
}

/// Shape the model is asked to emit for each candidate.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingEntry {
    pub id: String,
    pub score: f64,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default, alias = "matched_skills")]
    pub matched_skills: Vec<String>,
}

pub const FALLBACK_SCORE: u8 = 50;
pub const FALLBACK_REASONING: &str =
    "The model's ranking could not be parsed; a neutral default score was applied";

impl CandidateProfile {
    pub fn generate_id() -> String {
        format!(
            "candidate-{}-{}",
            Utc::now().timestamp_millis(),
            Uuid::new_v4().simple()
        )
    }
}

impl RankedCandidate {
    pub fn from_entry(profile: CandidateProfile, entry: RankingEntry) -> Self {
        let score = if entry.score.is_finite() {
            entry.score.round().clamp(0.0, 100.0) as u8
        } else {
            0
        };

        Self {
            profile,
            score,
            reasoning: entry.reasoning,
            matched_skills: entry.matched_skills,
        }
    }

    pub fn fallback(profile: CandidateProfile) -> Self {
        Self {
            profile,
            score: FALLBACK_SCORE,
            reasoning: FALLBACK_REASONING.to_string(),
            matched_skills: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_differ() {
        let a = CandidateProfile::generate_id();
        let b = CandidateProfile::generate_id();
        assert!(a.starts_with("candidate-"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_score_is_clamped() {
        let entry = RankingEntry {
            id: "c1".to_string(),
            score: 140.4,
            reasoning: "great".to_string(),
            matched_skills: vec![],
        };
        let ranked = RankedCandidate::from_entry(CandidateProfile::default(), entry);
        assert_eq!(ranked.score, 100);
    }

    #[test]
    fn test_ranked_candidate_flattens_profile() {
        let profile = CandidateProfile {
            id: "c1".to_string(),
            name: "Ada".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_value(RankedCandidate::fallback(profile)).unwrap();
        assert_eq!(json["name"], "Ada");
        assert_eq!(json["score"], 50);
        assert_eq!(json["matchedSkills"], serde_json::json!([]));
    }
}
