// src/page/injector.rs
//! Writes an optimized query into the host page's search form.

use ego_tree::NodeId;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{AssistantError, AssistantResult};
use crate::page::dom::{DomError, HtmlPage};
use crate::page::selectors::{PageSelectors, SelectorChain};
use crate::types::{ExperienceRange, SearchQuery};

/// What happened to one field of the search form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "camelCase")]
pub enum FilterOutcome {
    Applied(String),
    Skipped,
    NotFound,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyReport {
    pub keywords: FilterOutcome,
    pub location: FilterOutcome,
    pub experience: FilterOutcome,
    pub skills: FilterOutcome,
}

/// Fill the search form from `query`.
///
/// A missing form or keyword input is an error. Filters are best effort:
/// each one that cannot be applied is logged and reported, never raised.
pub fn apply_search_query(
    page: &mut HtmlPage,
    selectors: &PageSelectors,
    query: &SearchQuery,
) -> AssistantResult<ApplyReport> {
    let form = page
        .query(&selectors.search_form)
        .ok_or_else(|| AssistantError::ElementNotFound("search form".to_string()))?;

    let input = page
        .query_within(form, &selectors.search_input)
        .or_else(|| page.query(&selectors.search_input))
        .ok_or_else(|| AssistantError::ElementNotFound("search input".to_string()))?;

    let keywords = if query.keywords.is_empty() {
        FilterOutcome::Skipped
    } else {
        let text = query.keywords.join(" ");
        set_and_notify(page, input, &text, &["input", "change"])
            .map_err(|e| AssistantError::ElementNotFound(format!("search input: {}", e)))?;
        FilterOutcome::Applied(text)
    };

    let location = fill_text_filter(page, &selectors.location_input, query.location.trim());
    let experience = fill_experience(page, selectors, query.experience);
    let skills = fill_text_filter(page, &selectors.skills_input, &query.skills.join(", "));

    let report = ApplyReport {
        keywords,
        location,
        experience,
        skills,
    };
    info!("Applied search query to {}: {:?}", page.url(), report);
    Ok(report)
}

/// Map a years-of-experience range to the host's filter option.
/// Buckets are tried in order, the first that fits wins. The 5-10 bucket
/// takes any range below ten years that ends by ten, so (6, 10) lands there.
pub fn map_experience_to_option(range: ExperienceRange) -> Option<&'static str> {
    let ExperienceRange { min, max } = range;

    if min <= 1 && max <= 2 {
        Some("1-2")
    } else if min <= 2 && max <= 5 {
        Some("2-5")
    } else if min < 10 && max <= 10 {
        Some("5-10")
    } else if min >= 10 {
        Some("10+")
    } else {
        None
    }
}

fn fill_text_filter(page: &mut HtmlPage, chain: &SelectorChain, value: &str) -> FilterOutcome {
    if value.is_empty() {
        return FilterOutcome::Skipped;
    }

    let Some(node) = page.query(chain) else {
        debug!("No {} on page, filter not applied", chain.name());
        return FilterOutcome::NotFound;
    };

    match set_and_notify(page, node, value, &["input", "change"]) {
        Ok(()) => FilterOutcome::Applied(value.to_string()),
        Err(e) => {
            warn!("Failed to fill {}: {}", chain.name(), e);
            FilterOutcome::Failed(e.to_string())
        }
    }
}

fn fill_experience(
    page: &mut HtmlPage,
    selectors: &PageSelectors,
    range: ExperienceRange,
) -> FilterOutcome {
    if range.is_unset() {
        return FilterOutcome::Skipped;
    }

    let Some(option) = map_experience_to_option(range) else {
        debug!("No experience option for {:?}", range);
        return FilterOutcome::Skipped;
    };

    let Some(select) = page.query(&selectors.experience_select) else {
        debug!("No experience select on page, filter not applied");
        return FilterOutcome::NotFound;
    };

    match set_and_notify(page, select, option, &["change"]) {
        Ok(()) => FilterOutcome::Applied(option.to_string()),
        Err(e) => {
            warn!("Failed to set experience filter: {}", e);
            FilterOutcome::Failed(e.to_string())
        }
    }
}

fn set_and_notify(
    page: &mut HtmlPage,
    node: NodeId,
    value: &str,
    events: &[&str],
) -> Result<(), DomError> {
    page.set_value(node, value)?;
    for kind in events {
        page.dispatch_event(node, kind, true);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::dom::DomEvent;
    use std::sync::{Arc, Mutex};

    const SEARCH_PAGE: &str = r#"
        <html><body>
          <input id="global" placeholder="Search messages">
          <form id="form" data-control-name="search_form">
            <input id="kw" name="keywords">
            <input id="loc" placeholder="Location">
            <select id="exp" name="experience">
              <option value="">Any</option>
              <option value="1-2">1-2</option>
              <option value="2-5">2-5</option>
              <option value="5-10">5-10</option>
            </select>
            <input id="skills" placeholder="Skills">
          </form>
        </body></html>"#;

    fn page() -> HtmlPage {
        HtmlPage::parse("https://www.linkedin.com/recruiter/search", SEARCH_PAGE)
    }

    fn value_of(page: &HtmlPage, id: &str) -> Option<String> {
        page.get_element_by_id(id).and_then(|node| page.value(node))
    }

    #[test]
    fn test_experience_buckets() {
        let cases = [
            ((0, 2), Some("1-2")),
            ((1, 1), Some("1-2")),
            ((2, 4), Some("2-5")),
            ((3, 10), Some("5-10")),
            ((6, 10), Some("5-10")),
            ((10, 10), Some("10+")),
            ((11, 20), Some("10+")),
            ((12, 0), Some("10+")),
            ((0, 15), None),
            ((7, 12), None),
            ((-3, 2), Some("1-2")),
            ((9, 10), Some("5-10")),
            ((8, 11), None),
        ];
        for ((min, max), expected) in cases {
            assert_eq!(
                map_experience_to_option(ExperienceRange::new(min, max)),
                expected,
                "range {}..{}",
                min,
                max
            );
        }
    }

    #[test]
    fn test_literal_query_fills_keyword_input_and_fires_events() {
        let mut page = page();
        let form = page.get_element_by_id("form").unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for kind in ["input", "change"] {
            let sink = Arc::clone(&seen);
            page.add_event_listener(
                form,
                kind,
                Arc::new(move |page: &HtmlPage, event: &DomEvent| {
                    let id = page.attr(event.target, "id").unwrap_or_default().to_string();
                    sink.lock().unwrap().push(format!("{}:{}", event.kind, id));
                }),
            );
        }

        let query = SearchQuery::from_text("senior rust engineer");
        let report = apply_search_query(&mut page, &PageSelectors::default(), &query).unwrap();

        assert_eq!(value_of(&page, "kw").as_deref(), Some("senior rust engineer"));
        assert_eq!(value_of(&page, "global"), None);
        assert_eq!(
            report.keywords,
            FilterOutcome::Applied("senior rust engineer".to_string())
        );
        assert_eq!(report.location, FilterOutcome::Skipped);
        assert_eq!(report.experience, FilterOutcome::Skipped);
        assert_eq!(*seen.lock().unwrap(), ["input:kw", "change:kw"]);
    }

    #[test]
    fn test_structured_query_fills_filters() {
        let mut page = page();
        let query = SearchQuery {
            keywords: vec!["backend".to_string(), "engineer".to_string()],
            skills: vec!["Rust".to_string(), "Tokio".to_string()],
            experience: ExperienceRange::new(2, 4),
            location: "Berlin".to_string(),
            ..Default::default()
        };

        let report = apply_search_query(&mut page, &PageSelectors::default(), &query).unwrap();

        assert_eq!(value_of(&page, "kw").as_deref(), Some("backend engineer"));
        assert_eq!(value_of(&page, "loc").as_deref(), Some("Berlin"));
        assert_eq!(value_of(&page, "exp").as_deref(), Some("2-5"));
        assert_eq!(value_of(&page, "skills").as_deref(), Some("Rust, Tokio"));
        assert_eq!(report.skills, FilterOutcome::Applied("Rust, Tokio".to_string()));

        let exp = page.get_element_by_id("exp").unwrap();
        assert_eq!(page.events_on(exp), ["change"]);
    }

    #[test]
    fn test_filter_failures_do_not_abort() {
        let mut page = page();
        let query = SearchQuery {
            keywords: vec!["sre".to_string()],
            experience: ExperienceRange::new(11, 20),
            location: "Remote".to_string(),
            ..Default::default()
        };

        let report = apply_search_query(&mut page, &PageSelectors::default(), &query).unwrap();

        assert!(matches!(report.experience, FilterOutcome::Failed(_)));
        assert_eq!(report.location, FilterOutcome::Applied("Remote".to_string()));
        assert_eq!(value_of(&page, "kw").as_deref(), Some("sre"));
    }

    #[test]
    fn test_ten_plus_without_matching_option_keeps_keywords() {
        let mut page = page();
        let query = SearchQuery {
            keywords: vec!["staff".to_string(), "engineer".to_string()],
            experience: ExperienceRange::new(12, 15),
            ..Default::default()
        };

        let report = apply_search_query(&mut page, &PageSelectors::default(), &query).unwrap();

        assert_eq!(
            report.experience,
            FilterOutcome::Failed(DomError::NoSuchOption("10+".to_string()).to_string())
        );
        assert_eq!(value_of(&page, "exp").as_deref(), Some(""));
        let exp = page.get_element_by_id("exp").unwrap();
        assert!(page.events_on(exp).is_empty());
        assert_eq!(
            report.keywords,
            FilterOutcome::Applied("staff engineer".to_string())
        );
        assert_eq!(value_of(&page, "kw").as_deref(), Some("staff engineer"));
    }

    #[test]
    fn test_unset_experience_from_model_output_leaves_select_alone() {
        let mut page = page();
        let query = SearchQuery::from_model_output(
            r#"{"keywords": "golang", "experience": {"min": 0, "max": 0}}"#,
        )
        .unwrap();
        assert!(query.experience.is_unset());

        let report = apply_search_query(&mut page, &PageSelectors::default(), &query).unwrap();

        assert_eq!(report.experience, FilterOutcome::Skipped);
        let exp = page.get_element_by_id("exp").unwrap();
        assert!(page.events_on(exp).is_empty());
        assert_eq!(value_of(&page, "exp").as_deref(), Some(""));
        assert_eq!(value_of(&page, "kw").as_deref(), Some("golang"));
    }

    #[test]
    fn test_missing_filters_are_reported_not_found() {
        let mut page = HtmlPage::parse(
            "https://www.linkedin.com/recruiter/search",
            r#"<form role="search"><input type="search" id="q"></form>"#,
        );
        let query = SearchQuery {
            keywords: vec!["data".to_string()],
            skills: vec!["SQL".to_string()],
            ..Default::default()
        };

        let report = apply_search_query(&mut page, &PageSelectors::default(), &query).unwrap();
        assert_eq!(report.skills, FilterOutcome::NotFound);
        assert_eq!(value_of(&page, "q").as_deref(), Some("data"));
    }

    #[test]
    fn test_missing_form_or_input_is_element_not_found() {
        let selectors = PageSelectors::default();
        let query = SearchQuery::from_text("anything");

        let mut no_form = HtmlPage::parse("https://example.com", "<div><input name=\"keywords\"></div>");
        assert!(matches!(
            apply_search_query(&mut no_form, &selectors, &query),
            Err(AssistantError::ElementNotFound(_))
        ));

        let mut no_input = HtmlPage::parse("https://example.com", "<form><textarea></textarea></form>");
        assert!(matches!(
            apply_search_query(&mut no_input, &selectors, &query),
            Err(AssistantError::ElementNotFound(_))
        ));
    }
}
