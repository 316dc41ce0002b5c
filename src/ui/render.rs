// src/ui/render.rs
//! HTML rendering of the popup. All user and model text is escaped.

use crate::ui::{CandidateRankerPanel, ConfigPanel, Popup, SearchOptimizerPanel, Tab};
use crate::utils::escape_html;

pub fn render_popup(popup: &Popup) -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>Recruiter Assistant</title></head>\n<body>\n<h1>LinkedIn Recruiter Assistant</h1>\n<nav>",
    );

    for tab in Tab::ALL {
        let class = if tab == popup.active_tab { " class=\"active\"" } else { "" };
        html.push_str(&format!(
            "<a href=\"/popup?tab={}\"{}>{}</a>",
            tab.id(),
            class,
            tab.label()
        ));
    }
    html.push_str("</nav>\n<main>\n");

    match popup.active_tab {
        Tab::Config => html.push_str(&render_config(&popup.config)),
        Tab::Optimizer => html.push_str(&render_optimizer(&popup.optimizer)),
        Tab::Ranker => html.push_str(&render_ranker(&popup.ranker)),
    }

    html.push_str("</main>\n</body></html>\n");
    html
}

fn render_error(error: &Option<String>) -> String {
    match error {
        Some(message) => format!("<p class=\"error\">{}</p>\n", escape_html(message)),
        None => String::new(),
    }
}

fn checkbox(name: &str, checked: bool, disabled: &str) -> String {
    format!(
        "<input type=\"checkbox\" name=\"{}\" value=\"true\"{}{}>",
        name,
        if checked { " checked" } else { "" },
        disabled,
    )
}

pub fn render_config(panel: &ConfigPanel) -> String {
    if panel.loading {
        return "<p>Loading settings...</p>\n".to_string();
    }

    let shown = if panel.editing { &panel.draft } else { &panel.config };
    let disabled = if panel.editing { "" } else { " disabled" };

    let mut html = String::from("<section id=\"config\">\n");
    html.push_str(&render_error(&panel.error));
    html.push_str("<form method=\"post\" action=\"/popup/config\">\n");
    html.push_str(&format!(
        "<label>API key <input type=\"password\" name=\"apiKey\" value=\"{}\" placeholder=\"sk-...\"{}></label>\n",
        escape_html(&shown.api_key),
        disabled
    ));
    html.push_str(&format!(
        "<label>Base URL <input type=\"url\" name=\"baseUrl\" value=\"{}\"{}></label>\n",
        escape_html(&shown.base_url),
        disabled
    ));
    html.push_str(&format!(
        "<label>Default model <input type=\"text\" name=\"defaultModel\" value=\"{}\"{}></label>\n",
        escape_html(&shown.default_model),
        disabled
    ));
    html.push_str(&format!(
        "<label>Temperature <input type=\"range\" name=\"temperature\" min=\"0\" max=\"1\" step=\"0.1\" value=\"{}\"{}> {:.1}</label>\n",
        shown.temperature, disabled, shown.temperature
    ));
    html.push_str(&format!(
        "<label>{} Auto-apply optimized queries</label>\n",
        checkbox("enableAutoOptimization", shown.enable_auto_optimization, disabled)
    ));
    html.push_str(&format!(
        "<label>{} Smart ranking</label>\n",
        checkbox("enableSmartRanking", shown.enable_smart_ranking, disabled)
    ));

    if panel.editing {
        html.push_str("<button name=\"action\" value=\"save\">Save</button>\n");
        html.push_str("<button name=\"action\" value=\"cancel\">Cancel</button>\n");
    } else {
        html.push_str("<button name=\"action\" value=\"edit\">Edit</button>\n");
    }
    html.push_str("</form>\n</section>\n");
    html
}

pub fn render_optimizer(panel: &SearchOptimizerPanel) -> String {
    let mut html = String::from("<section id=\"optimizer\">\n<form method=\"post\" action=\"/popup/optimizer\">\n");
    html.push_str(&format!(
        "<label>Hiring need <textarea name=\"userInput\" rows=\"3\" placeholder=\"e.g. senior backend engineer with Python and AWS in San Francisco\">{}</textarea></label>\n",
        escape_html(&panel.user_input)
    ));
    html.push_str(&format!(
        "<label>Job description (optional) <textarea name=\"jobDescription\" rows=\"4\">{}</textarea></label>\n",
        escape_html(&panel.job_description)
    ));
    html.push_str("<button name=\"action\" value=\"optimize\">Optimize search</button>\n</form>\n");

    html.push_str(&render_error(&panel.error));
    if let Some(message) = &panel.success_message {
        html.push_str(&format!("<p class=\"success\">{}</p>\n", escape_html(message)));
    }

    if let Some(query) = &panel.optimized_query {
        html.push_str(&format!(
            "<pre class=\"optimized-query\">{}</pre>\n<form method=\"post\" action=\"/popup/optimizer\">\n",
            escape_html(query)
        ));
        html.push_str("<button name=\"action\" value=\"apply\">Apply to LinkedIn</button>\n");
        html.push_str("<button name=\"action\" value=\"clear\">Clear</button>\n</form>\n");
    }

    html.push_str("</section>\n");
    html
}

pub fn render_ranker(panel: &CandidateRankerPanel) -> String {
    let mut html = String::from("<section id=\"ranker\">\n<form method=\"post\" action=\"/popup/ranker\">\n");
    html.push_str(&format!(
        "<label>Job description <textarea name=\"jobDescription\" rows=\"6\" placeholder=\"Leave empty to use the description shown on the page\">{}</textarea></label>\n",
        escape_html(&panel.job_description)
    ));
    html.push_str("<button>Rank candidates</button>\n</form>\n");
    html.push_str(&render_error(&panel.error));

    if !panel.ranked.is_empty() {
        html.push_str("<ol class=\"ranked\">\n");
        for candidate in &panel.ranked {
            html.push_str(&format!(
                "<li><strong>{}</strong> <span class=\"score\">{}</span><p>{}</p><p>{}</p>",
                escape_html(&candidate.profile.name),
                candidate.score,
                escape_html(&candidate.profile.headline),
                escape_html(&candidate.reasoning)
            ));
            if !candidate.matched_skills.is_empty() {
                html.push_str(&format!(
                    "<p class=\"skills\">{}</p>",
                    escape_html(&candidate.matched_skills.join(", "))
                ));
            }
            html.push_str("</li>\n");
        }
        html.push_str("</ol>\n");
    }

    html.push_str("</section>\n");
    html
}
