//! Data models and content fetchers
//!
//! This module contains the domain types for aggregated tech news, launch
//! timelines, speech clips, and newsletter subscriptions, plus the fetcher
//! clients that produce them. Models serialize with the same camelCase field
//! names the remote service emits, so cache files and wire payloads share one
//! shape.

pub mod launches;
pub mod news;
pub mod newsletter;
pub mod speech;

pub use launches::LaunchesClient;
pub use news::NewsClient;
pub use newsletter::{NewsletterClient, SubscriptionOutcome};
pub use speech::SpeechClient;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Editorial category assigned to an article
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArticleCategory {
    #[serde(rename = "AI")]
    Ai,
    #[serde(rename = "OS")]
    Os,
    Gadgets,
    Other,
}

impl ArticleCategory {
    /// Maps a free-form label to a category; unknown labels become `Other`
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "ai" => Self::Ai,
            "os" => Self::Os,
            "gadgets" => Self::Gadgets,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for ArticleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Ai => "AI",
            Self::Os => "OS",
            Self::Gadgets => "Gadgets",
            Self::Other => "Other",
        };
        write!(f, "{}", label)
    }
}

/// A web page a story was grounded on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundingSource {
    pub uri: String,
    pub title: String,
}

/// A single aggregated news story
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    /// Synthesized identifier, stable within one fetched batch
    pub id: String,
    /// Publication or outlet the story is attributed to
    pub source: String,
    /// Story headline
    pub headline: String,
    /// Two-to-three sentence summary (also the speech-synthesis input)
    pub summary: String,
    /// Full article body
    pub full_article: String,
    /// Publication time as reported by the service (ISO 8601)
    pub timestamp: String,
    /// Editorial category
    pub category: ArticleCategory,
    /// Web sources backing the story
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub grounding_sources: Vec<GroundingSource>,
}

impl Article {
    /// Publication time parsed from the ISO-8601 string, if well-formed
    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.timestamp)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }
}

/// Sorts articles newest first; unparseable timestamps sink to the end
pub fn sort_by_recency(articles: &mut [Article]) {
    articles.sort_by_key(|a| {
        std::cmp::Reverse(a.published_at().unwrap_or(DateTime::<Utc>::MIN_UTC))
    });
}

/// One date on the launch timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchDate {
    /// Launch date in YYYY-MM-DD form
    pub date: String,
    /// Products launching on that date
    pub launches: Vec<LaunchEvent>,
}

/// A single product launch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchEvent {
    pub brand: String,
    pub model: String,
    /// Product category (Mobile, Laptop, VR/AR, OS, Other)
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Human-friendly age of a timestamp: "Just now", "45s ago", "5m ago",
/// "3h ago", "2 days ago", "1 month ago", "2 years ago"
pub fn relative_time(from: DateTime<Utc>, now: DateTime<Utc>) -> String {
    const YEAR: i64 = 31_536_000;
    const MONTH: i64 = 2_592_000;
    const DAY: i64 = 86_400;

    let seconds = (now - from).num_seconds();
    if seconds < 30 {
        return "Just now".to_string();
    }
    if seconds >= YEAR {
        let n = seconds / YEAR;
        return format!("{} year{} ago", n, if n == 1 { "" } else { "s" });
    }
    if seconds >= MONTH {
        let n = seconds / MONTH;
        return format!("{} month{} ago", n, if n == 1 { "" } else { "s" });
    }
    if seconds >= DAY {
        let n = seconds / DAY;
        return format!("{} day{} ago", n, if n == 1 { "" } else { "s" });
    }
    if seconds >= 3600 {
        return format!("{}h ago", seconds / 3600);
    }
    if seconds >= 60 {
        return format!("{}m ago", seconds / 60);
    }
    format!("{}s ago", seconds)
}
