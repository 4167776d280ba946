//! Terminal rendering of page state. No decisions are made here.

use crate::classify::Classified;
use crate::controller::result::NO_INPUT_GUIDANCE;
use crate::controller::{
    Analysis, DetailState, HistoryPage, Notice, NoticeLevel, QueryPage, ResultPage, ViewState,
};
use crate::model::{CompetitorResult, HistoryEntry};
use chrono::DateTime;
use colored::Colorize;

/// Longest query shown in a history row before it is cut
pub const HISTORY_QUERY_WIDTH: usize = 60;

/// Cut `query` to `max` characters, marking the cut with `...`
pub fn truncate_query(query: &str, max: usize) -> String {
    if query.chars().count() > max {
        format!("{}...", query.chars().take(max).collect::<String>())
    } else {
        query.to_string()
    }
}

/// Format a stored RFC 3339 timestamp like "Jun 1, 2025, 12:00 PM".
/// Anything unparseable is shown as stored.
pub fn format_timestamp(timestamp: &str) -> String {
    match DateTime::parse_from_rfc3339(timestamp) {
        Ok(dt) => dt.format("%b %-d, %Y, %I:%M %p").to_string(),
        Err(_) => timestamp.to_string(),
    }
}

pub fn render_query_page(page: &QueryPage) -> String {
    let mut out = String::new();
    if let Some(err) = page.validation() {
        out.push_str(&format!("{} {}\n", "✗".red(), err.to_string().red()));
        return out;
    }
    out.push_str(&render_view(page.state()));
    out
}

pub fn render_result_page(page: &ResultPage) -> String {
    let mut out = String::new();
    if let Some(err) = page.validation() {
        out.push_str(&format!("{} {}\n", "✗".red(), err.to_string().red()));
        return out;
    }
    match page.state() {
        DetailState::NoInput => out.push_str(&format!("{}\n", NO_INPUT_GUIDANCE.yellow())),
        DetailState::View(view) => {
            if let Some(query) = page.query() {
                out.push_str(&format!("{} \"{}\"\n\n", "Showing results for:".dimmed(), query.blue()));
            }
            out.push_str(&render_view(view));
        }
    }
    out
}

pub fn render_history_page(page: &HistoryPage) -> String {
    match page.state() {
        ViewState::Idle | ViewState::Loading => format!("{}\n", "Loading your query history...".dimmed()),
        ViewState::Failed(message) => format!("{} {}\n", "✗".red(), message.red()),
        ViewState::Loaded(entries) if entries.is_empty() => format!(
            "{}\n{}\n",
            "No queries yet".bold(),
            "Your competitor analysis history will appear here after you submit your first query."
                .dimmed()
        ),
        ViewState::Loaded(entries) => {
            let mut out = format!("{} ({})\n", "Query History".bold(), entries.len());
            for entry in entries {
                out.push_str(&render_history_row(entry, page.is_deleting(&entry.id)));
            }
            out
        }
    }
}

fn render_history_row(entry: &HistoryEntry, deleting: bool) -> String {
    let marker = if deleting { " (deleting)".yellow().to_string() } else { String::new() };
    format!(
        "  {}  {:<63} {:<24} {}{}\n",
        entry.id.dimmed(),
        truncate_query(&entry.query_text, HISTORY_QUERY_WIDTH),
        format_timestamp(&entry.created_at),
        format!("{} found", entry.result_count).cyan(),
        marker
    )
}

pub fn render_notice(notice: &Notice) -> String {
    match notice.level {
        NoticeLevel::Info => format!("{} {}\n", notice.title.green().bold(), notice.description),
        NoticeLevel::Error => format!("{} {}\n", notice.title.red().bold(), notice.description),
    }
}

fn render_view(view: &ViewState<Analysis>) -> String {
    match view {
        ViewState::Idle => String::new(),
        ViewState::Loading => format!("{}\n", "Analyzing competitors...".dimmed()),
        ViewState::Failed(message) => format!("{} {}\n", "Analysis failed:".red().bold(), message),
        ViewState::Loaded(analysis) => render_analysis(analysis),
    }
}

fn render_analysis(analysis: &Analysis) -> String {
    let mut out = String::new();

    if let Some(recommendations) = analysis.recommendations.as_deref().filter(|r| !r.is_empty()) {
        out.push_str(&format!("{}\n", "AI-Powered Developer Recommendations".bold()));
        out.push_str(&format!("{}\n\n", recommendations));
    }

    out.push_str(&render_classified(&analysis.results));
    out
}

fn render_classified(results: &Classified) -> String {
    if results.is_empty() {
        return format!(
            "{}\n{}\n",
            "No competitors found".bold(),
            "Try refining your query with more specific details about your product.".dimmed()
        );
    }

    let mut out = String::new();
    if let Some(best) = &results.best {
        out.push_str(&format!("{}\n", "Top Competitor Match".green().bold()));
        out.push_str(&render_competitor(best));
        out.push('\n');
    }
    if !results.others.is_empty() {
        out.push_str(&format!("{} ({})\n", "Other Competitors".bold(), results.others.len()));
        for competitor in &results.others {
            out.push_str(&render_competitor(competitor));
        }
    }
    out
}

fn render_competitor(c: &CompetitorResult) -> String {
    let mut out = format!("• {}", c.name.bold());
    if !c.website.is_empty() {
        out.push_str(&format!("  {}", c.website.blue().underline()));
    }
    out.push('\n');
    if !c.description.is_empty() {
        out.push_str(&format!("    {}\n", c.description));
    }

    let mut facts = Vec::new();
    if let Some(pricing) = &c.pricing_model {
        facts.push(format!("pricing: {}", pricing));
    }
    match c.is_open_source {
        Some(true) => facts.push("open source".to_string()),
        Some(false) => facts.push("proprietary".to_string()),
        None => {}
    }
    if let Some(api) = &c.api_available {
        facts.push(format!("API: {}", api));
    }
    if !facts.is_empty() {
        out.push_str(&format!("    {}\n", facts.join(" · ").dimmed()));
    }

    for (label, list) in [
        ("Tech stack", &c.tech_stack),
        ("Languages", &c.language_support),
        ("Integrations", &c.integration_capabilities),
    ] {
        if let Some(items) = list.as_ref().filter(|items| !items.is_empty()) {
            out.push_str(&format!("    {}: {}\n", label.dimmed(), items.join(", ")));
        }
    }
    if let Some(reason) = &c.reason {
        out.push_str(&format!("    {} {}\n", "Why:".dimmed(), reason.italic()));
    }
    out
}
