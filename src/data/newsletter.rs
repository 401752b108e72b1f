//! Newsletter subscription with a generated confirmation email
//!
//! Validates the subscriber's address, then asks the text model to write a
//! friendly confirmation email sampling the current top headlines. When the
//! remote service is unavailable the subscription still succeeds with a fixed
//! template body, so a cooldown never blocks signups.

use crate::cooldown::Cooldown;
use crate::data::Article;
use crate::fetch::fetch_content;
use crate::gemini::{GeminiClient, GenerateContentRequest, TEXT_MODEL};
use crate::keys::ApiKeyPool;
use crate::retry::BackoffPolicy;
use log::{info, warn};
use regex::Regex;
use std::sync::{Arc, LazyLock};

static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

/// Number of headlines sampled into the confirmation email
const SAMPLE_HEADLINES: usize = 5;

/// True when `email` looks like a deliverable address
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

/// Result of a subscription attempt
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionOutcome {
    /// Whether the subscription was accepted
    pub success: bool,
    /// User-facing status line
    pub message: String,
    /// Preview of the confirmation email, when one was produced
    pub email_body: Option<String>,
}

/// Client handling newsletter signups
#[derive(Debug, Clone)]
pub struct NewsletterClient {
    gemini: GeminiClient,
    keys: Arc<ApiKeyPool>,
    cooldown: Arc<Cooldown>,
    policy: BackoffPolicy,
}

impl NewsletterClient {
    /// Creates a newsletter client sharing the given key pool and cooldown
    pub fn new(gemini: GeminiClient, keys: Arc<ApiKeyPool>, cooldown: Arc<Cooldown>) -> Self {
        Self {
            gemini,
            keys,
            cooldown,
            policy: BackoffPolicy::default(),
        }
    }

    /// Overrides the retry policy
    pub fn with_backoff_policy(mut self, policy: BackoffPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Subscribes `email`, producing a confirmation-email preview
    ///
    /// An invalid address fails fast without any remote call. A valid one
    /// always succeeds: the body comes from the model when possible and from
    /// a fixed template otherwise.
    pub async fn subscribe(&self, email: &str, articles: &[Article]) -> SubscriptionOutcome {
        if !is_valid_email(email) {
            return SubscriptionOutcome {
                success: false,
                message: "Please enter a valid email address.".to_string(),
                email_body: None,
            };
        }

        info!("subscribing {} to the newsletter", email);
        let headlines = sample_headlines(articles);
        let request = GenerateContentRequest::from_prompt(&editor_prompt(&headlines));

        let generated = fetch_content(
            &self.gemini,
            &self.keys,
            &self.cooldown,
            self.policy,
            "newsletter-body",
            TEXT_MODEL,
            &request,
        )
        .await
        .and_then(|response| response.text());

        match generated {
            Some(body) => SubscriptionOutcome {
                success: true,
                message: "Subscription successful! Here's a preview of the confirmation email."
                    .to_string(),
                email_body: Some(body),
            },
            None => {
                warn!("newsletter body generation unavailable, using the template");
                SubscriptionOutcome {
                    success: true,
                    message: "Subscription successful! Here's a preview of your first newsletter."
                        .to_string(),
                    email_body: Some(template_body(&headlines)),
                }
            }
        }
    }
}

/// The top headlines as a `- headline` list
fn sample_headlines(articles: &[Article]) -> String {
    articles
        .iter()
        .take(SAMPLE_HEADLINES)
        .map(|a| format!("- {}", a.headline))
        .collect::<Vec<_>>()
        .join("\n")
}

fn editor_prompt(headlines: &str) -> String {
    format!(
        "You are the editor for the Grid7 tech newsletter. Write a friendly confirmation \
         email for a new subscriber. Welcome them and provide a brief summary of today's \
         top 5 tech stories as a sample. Here are the headlines:\n\n{}\n\nKeep it concise \
         and engaging. The email should be in plain text. Sign off as 'The Grid7 Team'.",
        headlines
    )
}

fn template_body(headlines: &str) -> String {
    format!(
        "Welcome to Grid7 Weekly!\n\nWe're thrilled to have you join our community of tech \
         enthusiasts. You're now on the list to receive the most important technology news, \
         delivered straight to your inbox.\n\nHere's a taste of the top stories right \
         now:\n\n{}\n\nStay curious,\nThe Grid7 Team",
        headlines
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ArticleCategory;

    fn article(headline: &str) -> Article {
        Article {
            id: headline.to_string(),
            source: "Source".to_string(),
            headline: headline.to_string(),
            summary: "s".to_string(),
            full_article: "f".to_string(),
            timestamp: "2026-08-24T00:00:00Z".to_string(),
            category: ArticleCategory::Other,
            grounding_sources: Vec::new(),
        }
    }

    fn offline_client() -> NewsletterClient {
        NewsletterClient::new(
            GeminiClient::with_base_url("http://127.0.0.1:1".to_string()),
            Arc::new(ApiKeyPool::new(Vec::new())),
            Arc::new(Cooldown::new()),
        )
    }

    #[test]
    fn test_accepts_plain_addresses() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("first.last@sub.domain.org"));
        assert!(is_valid_email("tagged+grid7@mail.co"));
    }

    #[test]
    fn test_rejects_malformed_addresses() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("plainaddress"));
        assert!(!is_valid_email("user@nodot"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@.com"));
        assert!(!is_valid_email("user name@example.com"));
        assert!(!is_valid_email("user@exa mple.com"));
        assert!(!is_valid_email("user@@example.com"));
    }

    #[test]
    fn test_template_lists_at_most_five_headlines() {
        let articles: Vec<Article> = (1..=6).map(|n| article(&format!("Story {}", n))).collect();
        let body = template_body(&sample_headlines(&articles));

        assert!(body.starts_with("Welcome to Grid7 Weekly!"));
        assert!(body.contains("- Story 1"));
        assert!(body.contains("- Story 5"));
        assert!(!body.contains("- Story 6"));
        assert!(body.ends_with("Stay curious,\nThe Grid7 Team"));
    }

    #[test]
    fn test_editor_prompt_embeds_headlines_and_signoff() {
        let prompt = editor_prompt("- Story A\n- Story B");
        assert!(prompt.contains("- Story A"));
        assert!(prompt.contains("Sign off as 'The Grid7 Team'"));
    }

    #[tokio::test]
    async fn test_invalid_email_fails_without_touching_the_service() {
        let client = offline_client();
        let outcome = client.subscribe("not-an-email", &[article("A")]).await;

        assert!(!outcome.success);
        assert_eq!(outcome.message, "Please enter a valid email address.");
        assert_eq!(outcome.email_body, None);
        assert!(
            !client.cooldown.is_active(),
            "validation failures must not engage the cooldown"
        );
    }

    #[tokio::test]
    async fn test_unavailable_service_still_subscribes_with_the_template() {
        let client = offline_client();
        let outcome = client
            .subscribe("reader@example.com", &[article("Big Story")])
            .await;

        assert!(outcome.success);
        assert!(outcome.message.contains("first newsletter"));
        let body = outcome.email_body.expect("template body");
        assert!(body.contains("- Big Story"));
        assert!(body.contains("The Grid7 Team"));
    }
}
