//! Outbound message templates for the chat channel.

use civic_core::schema::{Idea, IdeaCategory, IdeaStatus, VoteDirection};
use civic_core::scoring::PriorityTier;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

pub const PARSE_MODE_HTML: &str = "HTML";
const DESCRIPTION_PREVIEW_CHARS: usize = 200;

/// A rendered message addressed to one chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub chat_id: String,
    pub text: String,
    pub parse_mode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<Value>,
}

impl Notification {
    pub fn html(chat_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            text: text.into(),
            parse_mode: PARSE_MODE_HTML.to_string(),
            reply_markup: None,
        }
    }

    pub fn with_markup(mut self, markup: Value) -> Self {
        self.reply_markup = Some(markup);
        self
    }
}

pub fn tier_emoji(tier: Option<PriorityTier>) -> &'static str {
    match tier {
        Some(PriorityTier::Critical) => "🔴",
        Some(PriorityTier::High) => "🟠",
        Some(PriorityTier::Medium) => "🔵",
        Some(PriorityTier::Low) => "🟢",
        None => "⚪",
    }
}

pub fn urgency_label(tier: Option<PriorityTier>) -> &'static str {
    match tier {
        Some(PriorityTier::Critical) => "CRITICAL",
        Some(PriorityTier::High) => "HIGH",
        Some(PriorityTier::Medium) => "MEDIUM",
        Some(PriorityTier::Low) => "LOW",
        None => "NOT SCORED",
    }
}

pub fn category_emoji(category: IdeaCategory) -> &'static str {
    match category {
        IdeaCategory::Sport => "🏀",
        IdeaCategory::Art => "🎨",
        IdeaCategory::Ecology => "🌳",
        IdeaCategory::Infrastructure => "🛠",
        IdeaCategory::Education => "📚",
        IdeaCategory::Culture => "🎭",
        IdeaCategory::Other => "📌",
    }
}

pub fn status_text(status: IdeaStatus) -> &'static str {
    match status {
        IdeaStatus::New => "new",
        IdeaStatus::UnderReview => "under review",
        IdeaStatus::Approved => "approved",
        IdeaStatus::InProgress => "in progress",
        IdeaStatus::Completed => "completed",
        IdeaStatus::Rejected => "rejected",
    }
}

/// Foundation team that handles a category.
pub fn responsible_team(category: IdeaCategory) -> &'static str {
    match category {
        IdeaCategory::Sport => "Sports projects team",
        IdeaCategory::Art => "Cultural projects team",
        IdeaCategory::Ecology => "Ecology projects team",
        IdeaCategory::Infrastructure => "Infrastructure team",
        IdeaCategory::Education | IdeaCategory::Culture | IdeaCategory::Other => "General team",
    }
}

/// Renders the moderator announcement for a freshly submitted idea, with
/// inline vote buttons and a map link.
pub fn new_idea(chat_id: &str, idea: &Idea, site_url: &str, city: &str) -> Notification {
    let site_url = site_url.trim_end_matches('/');
    let importance = idea
        .importance_score
        .map(|s| format!("{s:.2}/1.0"))
        .unwrap_or_else(|| "not scored".to_string());

    let lines = [
        format!("{} <b>NEW IDEA FROM A RESIDENT</b>", tier_emoji(idea.priority)),
        String::new(),
        format!(
            "<b>{} Category:</b> {}",
            category_emoji(idea.category),
            idea.category.as_str().to_uppercase()
        ),
        format!("<b>📌 Title:</b> {}", escape_html(&idea.title)),
        format!("<b>📝 Description:</b> {}", escape_html(&preview(&idea.description))),
        String::new(),
        format!(
            "<b>📍 Address:</b> {}",
            escape_html(idea.address.as_deref().unwrap_or("Not specified"))
        ),
        format!("<b>🏙 City:</b> {}", escape_html(city)),
        format!("<b>👥 Team:</b> {}", responsible_team(idea.category)),
        String::new(),
        format!("<b>📊 Priority:</b> {}", urgency_label(idea.priority)),
        format!("<b>⭐ Importance:</b> {importance}"),
        String::new(),
        format!("<b>🔗 Link:</b> {site_url}/idea/{}", idea.id),
    ];

    let keyboard = json!({
        "inline_keyboard": [[
            { "text": "✅ Support", "callback_data": format!("vote_up_{}", idea.id) },
            { "text": "👎 Against", "callback_data": format!("vote_down_{}", idea.id) },
            { "text": "🗺 Show on map", "url": format!("{site_url}/?idea={}", idea.id) },
        ]]
    });

    Notification::html(chat_id, lines.join("\n")).with_markup(keyboard)
}

pub fn status_update(chat_id: &str, idea: &Idea) -> Notification {
    let mut lines = vec![
        "🔄 <b>STATUS UPDATED</b>".to_string(),
        String::new(),
        format!("Idea: <b>{}</b>", escape_html(&idea.title)),
        String::new(),
        format!("New status: <b>{}</b>", status_text(idea.status)),
    ];
    match idea.status {
        IdeaStatus::Completed => {
            lines.push(String::new());
            lines.push("🎉 Congratulations! The idea has been implemented!".to_string());
        }
        IdeaStatus::InProgress => {
            lines.push(String::new());
            lines.push("📋 The foundation team has taken the idea into work.".to_string());
        }
        _ => {}
    }
    Notification::html(chat_id, lines.join("\n"))
}

pub fn vote_acknowledgement(chat_id: &str, direction: VoteDirection) -> Notification {
    let text = match direction {
        VoteDirection::Up => "✅ Your vote has been counted! Thank you for taking part.",
        VoteDirection::Down => "👎 You voted against this idea.",
    };
    Notification::html(chat_id, text).with_markup(json!({ "remove_keyboard": true }))
}

fn preview(text: &str) -> String {
    if text.chars().count() <= DESCRIPTION_PREVIEW_CHARS {
        return text.to_string();
    }
    let cut: String = text.chars().take(DESCRIPTION_PREVIEW_CHARS).collect();
    format!("{cut}...")
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
