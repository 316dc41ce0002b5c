// src/page/selectors.rs
//! Ordered CSS selector fallbacks for every element the adapter touches.
//! Host markup drifts, so each lookup tries its selectors in order.

use scraper::Selector;
use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct SelectorChain {
    name: String,
    entries: Vec<(String, Selector)>,
}

impl SelectorChain {
    pub fn new(name: &str, sources: &[&str]) -> Self {
        Self::from_sources(name, sources.iter().map(|s| s.to_string()))
    }

    /// Sources that fail to parse are dropped with a warning.
    pub fn from_sources<I, S>(name: &str, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut entries = Vec::new();
        for source in sources {
            let source = source.into();
            let parsed = Selector::parse(&source).map_err(|e| format!("{:?}", e));
            match parsed {
                Ok(selector) => entries.push((source, selector)),
                Err(e) => warn!("Skipping invalid selector {:?} for {}: {}", source, name, e),
            }
        }

        Self {
            name: name.to_string(),
            entries,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sources(&self) -> Vec<&str> {
        self.entries.iter().map(|(source, _)| source.as_str()).collect()
    }

    pub fn selectors(&self) -> impl Iterator<Item = &Selector> {
        self.entries.iter().map(|(_, selector)| selector)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

macro_rules! selector_table {
    ($( $(#[$doc:meta])* $field:ident => [$($source:expr),+ $(,)?] ),+ $(,)?) => {
        #[derive(Debug, Clone)]
        pub struct PageSelectors {
            $( $(#[$doc])* pub $field: SelectorChain, )+
        }

        impl Default for PageSelectors {
            fn default() -> Self {
                Self {
                    $( $field: SelectorChain::new(stringify!($field), &[$($source),+]), )+
                }
            }
        }

        /// Per-chain replacements read from a TOML file. Absent keys keep the default chain.
        #[derive(Debug, Clone, Default, Deserialize)]
        #[serde(default, deny_unknown_fields)]
        pub struct SelectorOverrides {
            $( pub $field: Option<Vec<String>>, )+
        }

        impl PageSelectors {
            pub fn with_overrides(mut self, overrides: &SelectorOverrides) -> Self {
                $(
                    if let Some(sources) = &overrides.$field {
                        self.$field = SelectorChain::from_sources(stringify!($field), sources.iter().cloned());
                    }
                )+
                self
            }
        }
    };
}

selector_table! {
    search_form => [
        r#"form[data-control-name="search_form"]"#,
        r#"form[role="search"]"#,
        "form",
    ],
    search_input => [
        r#"input[placeholder*="Search"]"#,
        r#"input[placeholder*="搜索"]"#,
        r#"input[type="search"]"#,
        r#"input[name="keywords"]"#,
    ],
    location_input => [
        r#"input[placeholder*="Location"]"#,
        r#"input[placeholder*="位置"]"#,
        r#"input[name*="location"]"#,
    ],
    experience_select => [
        r#"select[name*="experience"]"#,
        r#"select[data-control-name*="experience"]"#,
    ],
    skills_input => [
        r#"input[placeholder*="Skills"]"#,
        r#"input[placeholder*="技能"]"#,
        r#"input[name*="skills"]"#,
    ],
    /// Most specific first; `data-testid` also matches nested name nodes.
    candidate_cards => [
        ".candidate-card",
        ".search-result",
        r#"[data-testid*="candidate"]"#,
    ],
    card_name => [".name", ".candidate-name", r#"[data-testid*="name"]"#],
    card_headline => [".headline", ".title", ".position"],
    card_location => [".location", ".geo-location"],
    experience_entries => [".experience", ".work-history", r#"[data-testid*="experience"]"#],
    experience_title => [".title", ".position"],
    experience_company => [".company", ".organization"],
    experience_duration => [".duration", ".time-period"],
    education_entries => [".education", r#"[data-testid*="education"]"#],
    education_school => [".school", ".university"],
    education_degree => [".degree"],
    education_field => [".field", ".degree"],
    education_year => [".year", ".graduation-year"],
    skills => [".skill", ".tag", r#"[data-testid*="skill"]"#],
    summary => [".summary", ".bio", ".description"],
    job_description => [
        ".job-description",
        ".description__text",
        "[data-job-description]",
        ".job-details__description",
    ],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_sources_are_skipped() {
        let chain = SelectorChain::new("broken", &["div[", ".ok", "::nope("]);
        assert_eq!(chain.sources(), [".ok"]);
        assert_eq!(chain.name(), "broken");
    }

    #[test]
    fn test_owned_sources_keep_their_order() {
        let sources = vec!["a.result".to_string(), "[broken".to_string(), "li > a".to_string()];
        let chain = SelectorChain::from_sources("results", sources);
        assert_eq!(chain.sources(), ["a.result", "li > a"]);
        assert_eq!(chain.selectors().count(), 2);
    }

    #[test]
    fn test_default_chains_compile_completely() {
        let selectors = PageSelectors::default();
        assert_eq!(selectors.search_input.sources().len(), 4);
        assert_eq!(selectors.candidate_cards.sources()[0], ".candidate-card");
        assert!(!selectors.job_description.is_empty());
    }

    #[test]
    fn test_overrides_replace_only_named_chains() {
        let overrides: SelectorOverrides =
            toml::from_str("card_name = [\".full-name\"]\nskills = []").unwrap();
        let selectors = PageSelectors::default().with_overrides(&overrides);

        assert_eq!(selectors.card_name.sources(), [".full-name"]);
        assert!(selectors.skills.is_empty());
        assert_eq!(
            selectors.summary.sources(),
            PageSelectors::default().summary.sources()
        );
    }

    #[test]
    fn test_unknown_override_keys_are_rejected() {
        assert!(toml::from_str::<SelectorOverrides>("card_title = [\".x\"]").is_err());
    }
}
