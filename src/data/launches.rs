//! Upcoming launch timeline fetcher
//!
//! Unlike the news fetchers this one constrains the model with a response
//! schema instead of search grounding, so the payload comes back as JSON
//! matching [`LaunchDate`] directly. Results are grouped by anticipated
//! launch window and cached for a day.

use crate::cache::CacheManager;
use crate::cooldown::Cooldown;
use crate::data::news::strip_code_fences;
use crate::data::LaunchDate;
use crate::fetch::fetch_content;
use crate::gemini::{GeminiClient, GenerateContentRequest, GenerationConfig, TEXT_MODEL};
use crate::keys::ApiKeyPool;
use crate::retry::BackoffPolicy;
use chrono::{Datelike, Utc};
use log::{debug, error};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

/// Cache key for the launch timeline
const LAUNCHES_CACHE_KEY: &str = "upcomingLaunches";

/// Launch forecasts stay fresh for a day
const LAUNCHES_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

const ANALYST_INSTRUCTION: &str = "You are a premier tech industry analyst. Your task is to provide an accurate, up-to-date forecast of upcoming tech hardware and software launches, focusing on the latest, most credible information.";

/// Client for fetching the upcoming launch timeline
#[derive(Debug, Clone)]
pub struct LaunchesClient {
    gemini: GeminiClient,
    keys: Arc<ApiKeyPool>,
    cooldown: Arc<Cooldown>,
    cache: Option<CacheManager>,
    policy: BackoffPolicy,
}

impl LaunchesClient {
    /// Creates a launches client sharing the given key pool and cooldown
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

    /// Overrides the retry policy
    pub fn with_backoff_policy(mut self, policy: BackoffPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Fetches the upcoming launch timeline
    ///
    /// Same contract as the news fetcher: fresh cache wins unless forced, a
    /// payload failing validation yields an empty list, and `None` means the
    /// remote service was unavailable.
    pub async fn fetch_upcoming_launches(&self, force_refresh: bool) -> Option<Vec<LaunchDate>> {
        if !force_refresh {
            if let Some(cache) = &self.cache {
                if let Some(launches) =
                    cache.get::<Vec<LaunchDate>>(LAUNCHES_CACHE_KEY, LAUNCHES_CACHE_TTL)
                {
                    debug!("upcoming launches served from cache");
                    return Some(launches);
                }
            }
        }

        let year = Utc::now().year();
        let request = GenerateContentRequest::from_prompt(&launches_prompt(year))
            .with_system_instruction(ANALYST_INSTRUCTION)
            .with_generation_config(GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(launches_response_schema(year)),
                ..Default::default()
            });

        let response = fetch_content(
            &self.gemini,
            &self.keys,
            &self.cooldown,
            self.policy,
            "upcoming-launches",
            TEXT_MODEL,
            &request,
        )
        .await?;

        let payload = match response.text() {
            Some(payload) => payload,
            None => {
                error!("launches response carried no text payload");
                return None;
            }
        };

        let launches = match parse_launch_payload(&payload) {
            Ok(launches) => launches,
            Err(e) => {
                error!("failed to parse launch payload from model response: {}", e);
                return Some(Vec::new());
            }
        };

        if !launches.is_empty() {
            if let Some(cache) = &self.cache {
                cache.set(LAUNCHES_CACHE_KEY, &launches);
            }
        }
        Some(launches)
    }

    /// Returns whatever fresh timeline the cache still holds
    pub fn cached(&self) -> Option<Vec<LaunchDate>> {
        self.cache
            .as_ref()?
            .get(LAUNCHES_CACHE_KEY, LAUNCHES_CACHE_TTL)
    }
}

fn launches_prompt(year: i32) -> String {
    format!(
        "Provide a list of notable, unreleased tech products (including mobile phones, \
         laptops, VR/AR headsets, and OS updates) expected to launch ONLY in the year {year} \
         and beyond. It is crucial that you DO NOT include any products from {previous} or \
         earlier. The list must only contain future launches starting from January 1, {year}. \
         List them chronologically. Group by anticipated launch date (e.g., 'Q1 {year}', \
         'Mid-{year}'). For each launch, provide the brand, model, category, and an optional \
         description.",
        year = year,
        previous = year - 1,
    )
}

/// Response schema forcing the grouped-timeline shape
fn launches_response_schema(year: i32) -> serde_json::Value {
    let window_hint = format!(
        "The anticipated launch month and year, or quarter (e.g., 'Q1 {year}', 'Mid-{year}')."
    );
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "date": {
                    "type": "STRING",
                    "description": window_hint
                },
                "launches": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "brand": { "type": "STRING" },
                            "model": { "type": "STRING" },
                            "category": {
                                "type": "STRING",
                                "description": "The product category, e.g., 'Mobile', 'Laptop', 'VR/AR', 'OS', 'Other'."
                            },
                            "description": {
                                "type": "STRING",
                                "description": "A brief, optional note about the launch."
                            }
                        },
                        "required": ["brand", "model", "category"]
                    }
                }
            },
            "required": ["date", "launches"]
        }
    })
}

/// Validates a model payload into the launch timeline
fn parse_launch_payload(text: &str) -> Result<Vec<LaunchDate>, serde_json::Error> {
    serde_json::from_str(&strip_code_fences(text))
}
