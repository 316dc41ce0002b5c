// src/core/prompts.rs
// Prompt templates for the two recruiting tasks.

/// System turn sent with every chat-completion request.
pub const SYSTEM_PROMPT: &str = "You are a professional recruiting assistant who helps \
    recruiters optimize candidate searches on recruiting platforms. \
    Give accurate, practical answers.";

pub fn optimize_search_prompt(user_input: &str, job_description: Option<&str>) -> String {
    let job_section = job_description
        .map(str::trim)
        .filter(|jd| !jd.is_empty())
        .map(|jd| format!("Job description: {}\n", jd))
        .unwrap_or_default();

    format!(
        r#"Convert the following hiring need into precise search criteria for a recruiter search page.

Hiring need: {}
{}
Return structured search criteria containing:
1. Keywords (comma separated)
2. Required skills (comma separated)
3. Years of experience range
4. Location
5. Company size (optional)
6. Education requirement (optional)

Answer in JSON, for example:
{{
  "keywords": "backend engineer,Python,AWS",
  "skills": "Python,JavaScript,AWS,Docker",
  "experience": {{"min": 3, "max": 8}},
  "location": "San Francisco",
  "companySize": "100-1000 employees",
  "education": "BSc Computer Science"
}}"#,
        user_input.trim(),
        job_section
    )
}

pub fn rank_candidates_prompt(job_description: &str, candidates_json: &str) -> String {
    format!(
        r#"Analyze how well each of the following candidates matches the job description.

Job description: {}

Candidates: {}

Give each candidate a match score from 0 to 100 and explain why. Output format:
[
  {{
    "id": "candidate id",
    "score": 85,
    "reasoning": "why this candidate matches",
    "matchedSkills": ["matched skill 1", "matched skill 2"]
  }}
]"#,
        job_description.trim(),
        candidates_json
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optimize_prompt_omits_blank_job_description() {
        let prompt = optimize_search_prompt("rust developer", Some("   "));
        assert!(prompt.contains("Hiring need: rust developer"));
        assert!(!prompt.contains("Job description:"));
    }

    #[test]
    fn test_optimize_prompt_includes_job_description() {
        let prompt = optimize_search_prompt("rust developer", Some("Build storage engines"));
        assert!(prompt.contains("Job description: Build storage engines"));
        assert!(prompt.contains("\"experience\": {\"min\": 3, \"max\": 8}"));
    }

    #[test]
    fn test_rank_prompt_embeds_candidates() {
        let prompt = rank_candidates_prompt("Staff engineer", r#"[{"id":"c1"}]"#);
        assert!(prompt.contains(r#"[{"id":"c1"}]"#));
        assert!(prompt.contains("\"matchedSkills\""));
    }
}
