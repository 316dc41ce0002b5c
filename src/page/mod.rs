// src/page/mod.rs
//! Host page adapter: selector fallbacks, candidate extraction, search form
//! injection and the in-page assistant panel.

pub mod assistant_ui;
pub mod content_script;
pub mod dom;
pub mod extractor;
pub mod injector;
pub mod selectors;

pub use content_script::ContentScript;
pub use dom::{DomError, DomEvent, HtmlPage};
pub use extractor::{extract_job_description, extract_search_results};
pub use injector::{apply_search_query, map_experience_to_option, ApplyReport, FilterOutcome};
pub use selectors::{PageSelectors, SelectorChain, SelectorOverrides};
