// src/page/extractor.rs
use ego_tree::NodeId;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::page::dom::HtmlPage;
use crate::page::selectors::{PageSelectors, SelectorChain};
use crate::types::{CandidateProfile, EducationEntry, ExperienceEntry};
use crate::utils;

#[derive(Debug, Error)]
enum CardError {
    #[error("no candidate name found")]
    MissingName,
}

/// Scrape every candidate card on the page.
///
/// A card that cannot be parsed is skipped; its siblings are still returned.
pub fn extract_search_results(page: &HtmlPage, selectors: &PageSelectors) -> Vec<CandidateProfile> {
    let cards = page.query_all(&selectors.candidate_cards);
    if cards.is_empty() {
        debug!("No candidate cards on {}", page.url());
        return Vec::new();
    }

    let mut profiles = Vec::with_capacity(cards.len());
    for (index, card) in cards.iter().enumerate() {
        match parse_candidate_card(page, selectors, *card) {
            Ok(profile) => profiles.push(profile),
            Err(e) => warn!("Skipping candidate card {}: {}", index, e),
        }
    }

    info!("Extracted {} of {} candidate cards", profiles.len(), cards.len());
    profiles
}

/// Job description text shown on the page, empty when there is none.
pub fn extract_job_description(page: &HtmlPage, selectors: &PageSelectors) -> String {
    page.query(&selectors.job_description)
        .map(|node| page.text(node))
        .unwrap_or_default()
}

fn parse_candidate_card(
    page: &HtmlPage,
    selectors: &PageSelectors,
    card: NodeId,
) -> Result<CandidateProfile, CardError> {
    let name = text_within(page, card, &selectors.card_name);
    if name.is_empty() {
        return Err(CardError::MissingName);
    }

    let experience = page
        .query_all_within(card, &selectors.experience_entries)
        .into_iter()
        .filter_map(|entry| parse_experience(page, selectors, entry))
        .collect();

    let education = page
        .query_all_within(card, &selectors.education_entries)
        .into_iter()
        .filter_map(|entry| parse_education(page, selectors, entry))
        .collect();

    let skills = utils::dedup_preserving_order(
        page.query_all_within(card, &selectors.skills)
            .into_iter()
            .map(|node| page.text(node))
            .filter(|skill| !skill.is_empty()),
    );

    Ok(CandidateProfile {
        id: CandidateProfile::generate_id(),
        name,
        headline: text_within(page, card, &selectors.card_headline),
        location: text_within(page, card, &selectors.card_location),
        experience,
        education,
        skills,
        summary: text_within(page, card, &selectors.summary),
    })
}

fn parse_experience(
    page: &HtmlPage,
    selectors: &PageSelectors,
    entry: NodeId,
) -> Option<ExperienceEntry> {
    let title = text_within(page, entry, &selectors.experience_title);
    if title.is_empty() {
        return None;
    }

    Some(ExperienceEntry {
        title,
        company: text_within(page, entry, &selectors.experience_company),
        duration: text_within(page, entry, &selectors.experience_duration),
    })
}

fn parse_education(
    page: &HtmlPage,
    selectors: &PageSelectors,
    entry: NodeId,
) -> Option<EducationEntry> {
    let school = text_within(page, entry, &selectors.education_school);
    if school.is_empty() {
        return None;
    }

    Some(EducationEntry {
        school,
        degree: text_within(page, entry, &selectors.education_degree),
        field: text_within(page, entry, &selectors.education_field),
        year: text_within(page, entry, &selectors.education_year),
    })
}

fn text_within(page: &HtmlPage, scope: NodeId, chain: &SelectorChain) -> String {
    page.query_within(scope, chain)
        .map(|node| page.text(node))
        .unwrap_or_default()
}
