//! Tech news fetchers
//!
//! Asks the generative service for the current top stories (grounded through
//! Google Search), validates the JSON payload the model returns, enriches
//! each story with a synthesized id, a typed category, and the grounding
//! sources, and caches the result for six hours. A second entry point fetches
//! incremental stories while excluding headlines the caller already has;
//! those are never cached.

use crate::cache::CacheManager;
use crate::cooldown::Cooldown;
use crate::data::{Article, ArticleCategory, GroundingSource};
use crate::fetch::fetch_content;
use crate::gemini::{GeminiClient, GenerateContentRequest, GenerateContentResponse, TEXT_MODEL};
use crate::keys::ApiKeyPool;
use crate::retry::BackoffPolicy;
use log::{debug, error};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// Cache key for the main story list
const NEWS_CACHE_KEY: &str = "techNews";

/// Stories stay fresh for six hours
const NEWS_CACHE_TTL: Duration = Duration::from_secs(6 * 60 * 60);

const JOURNALIST_INSTRUCTION: &str = "You are a professional tech journalist. Find the latest, impactful breaking news in tech and write compelling articles. Respond only with the requested JSON.";

const MORE_NEWS_INSTRUCTION: &str = "You are a professional tech journalist. Find recent, impactful tech news and write compelling articles. Exclude any topics from the provided list. Respond only with the requested JSON.";

const NEWS_PROMPT: &str = "Find and generate a list of 20 of the most significant breaking technology news stories from the last 24 hours. For each story, provide: a source (publication name), a compelling headline, a 1-2 sentence summary, a longer multi-paragraph full article, a timestamp in ISO 8601 format, and a category from one of the following: 'AI', 'OS', 'Gadgets', 'Other'. Return a valid JSON array of objects without markdown.";

/// Client for fetching aggregated tech news
#[derive(Debug, Clone)]
pub struct NewsClient {
    gemini: GeminiClient,
    keys: Arc<ApiKeyPool>,
    cooldown: Arc<Cooldown>,
    cache: Option<CacheManager>,
    policy: BackoffPolicy,
}

impl NewsClient {
    /// Creates a news client sharing the given key pool and cooldown
    pub fn new(
        gemini: GeminiClient,
        keys: Arc<ApiKeyPool>,
        cooldown: Arc<Cooldown>,
        cache: Option<CacheManager>,
    ) -> Self {
        Self {
            gemini,
            keys,
            cooldown,
            cache,
            policy: BackoffPolicy::default(),
        }
    }

    /// Overrides the retry policy (tests use short, jitter-free delays)
    pub fn with_backoff_policy(mut self, policy: BackoffPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Fetches the current top stories
    ///
    /// Fresh cached stories are returned as-is unless `force_refresh` is set.
    /// A successful remote fetch that validates to a non-empty list replaces
    /// the cache; a payload that fails validation yields an empty list (the
    /// caller may still have older data to show). `None` means the remote
    /// service was unavailable: cooldown, exhausted keys, or a hard error.
    pub async fn fetch_tech_news(&self, force_refresh: bool) -> Option<Vec<Article>> {
        if !force_refresh {
            if let Some(cache) = &self.cache {
                if let Some(articles) = cache.get::<Vec<Article>>(NEWS_CACHE_KEY, NEWS_CACHE_TTL) {
                    debug!("tech news served from cache");
                    return Some(articles);
                }
            }
        }

        let request = GenerateContentRequest::from_prompt(NEWS_PROMPT)
            .with_system_instruction(JOURNALIST_INSTRUCTION)
            .with_google_search();

        let response = fetch_content(
            &self.gemini,
            &self.keys,
            &self.cooldown,
            self.policy,
            "tech-news",
            TEXT_MODEL,
            &request,
        )
        .await?;

        let articles = extract_articles(&response)?;
        if !articles.is_empty() {
            if let Some(cache) = &self.cache {
                cache.set(NEWS_CACHE_KEY, &articles);
            }
        }
        Some(articles)
    }

    /// Returns whatever fresh stories the cache still holds
    ///
    /// Used as a fallback when a forced refresh fails but older (still
    /// within TTL) data exists.
    pub fn cached(&self) -> Option<Vec<Article>> {
        self.cache.as_ref()?.get(NEWS_CACHE_KEY, NEWS_CACHE_TTL)
    }

    /// Fetches five additional stories, excluding the given headlines
    ///
    /// Results are handed back for the caller to merge; they are not cached.
    pub async fn fetch_more_tech_news(
        &self,
        existing_headlines: &[String],
    ) -> Option<Vec<Article>> {
        let prompt = more_news_prompt(existing_headlines);
        let request = GenerateContentRequest::from_prompt(&prompt)
            .with_system_instruction(MORE_NEWS_INSTRUCTION)
            .with_google_search();

        let response = fetch_content(
            &self.gemini,
            &self.keys,
            &self.cooldown,
            self.policy,
            "more-news",
            TEXT_MODEL,
            &request,
        )
        .await?;

        extract_articles(&response)
    }
}

fn more_news_prompt(existing_headlines: &[String]) -> String {
    let exclusions =
        serde_json::to_string(existing_headlines).unwrap_or_else(|_| "[]".to_string());
    format!(
        "Find and generate a list of 5 more significant technology news stories.\n\
         IMPORTANT: Do NOT include stories with the following headlines: {}.\n\
         For each new story, provide: a source, a headline, a summary, a full article, \
         a timestamp (ISO 8601), and a category from one of the following: 'AI', 'OS', \
         'Gadgets', 'Other'.\nReturn a valid JSON array of objects without markdown.",
        exclusions
    )
}

/// Article shape as the model emits it, before enrichment
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArticle {
    source: String,
    headline: String,
    summary: String,
    full_article: String,
    timestamp: String,
    #[serde(default)]
    category: Option<String>,
}

/// Strips the markdown code fences the model sometimes wraps payloads in
pub(crate) fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

/// Validates a model payload into raw articles
fn parse_article_payload(text: &str) -> Result<Vec<RawArticle>, serde_json::Error> {
    serde_json::from_str(&strip_code_fences(text))
}

/// Turns a model response into enriched articles
///
/// A response with no text at all is a failed fetch (`None`). Text that does
/// not validate as an article array yields an empty list, logged but never
/// raised, so callers can fall back to whatever they already show.
fn extract_articles(response: &GenerateContentResponse) -> Option<Vec<Article>> {
    let payload = match response.text() {
        Some(payload) => payload,
        None => {
            error!("news response carried no text payload");
            return None;
        }
    };

    let raw = match parse_article_payload(&payload) {
        Ok(raw) => raw,
        Err(e) => {
            error!("failed to parse article payload from model response: {}", e);
            return Some(Vec::new());
        }
    };

    let sources: Vec<GroundingSource> = response
        .web_sources()
        .into_iter()
        .map(|web| GroundingSource {
            uri: web.uri.clone(),
            title: web.title.clone().unwrap_or_else(|| web.uri.clone()),
        })
        .collect();

    Some(assemble_articles(raw, &sources))
}

/// Enriches raw articles with ids, typed categories, and grounding sources
fn assemble_articles(raw: Vec<RawArticle>, sources: &[GroundingSource]) -> Vec<Article> {
    raw.into_iter()
        .enumerate()
        .map(|(index, raw)| {
            let head: String = raw.headline.chars().take(10).collect();
            let id = format!("{}-{}-{}", raw.source, head, index);
            let category = raw
                .category
                .as_deref()
                .map(ArticleCategory::from_label)
                .unwrap_or(ArticleCategory::Other);
            Article {
                id,
                source: raw.source,
                headline: raw.headline,
                summary: raw.summary,
                full_article: raw.full_article,
                timestamp: raw.timestamp,
                category,
                grounding_sources: sources.to_vec(),
            }
        })
        .collect()
}
