//! Speech synthesis for article summaries
//!
//! Sends the text to the TTS model and returns the base64-encoded audio
//! payload exactly as the service produced it: 16-bit PCM, mono, 24 kHz.
//! Clips are cached for a day under a key derived from the first fifty
//! characters of the text, so replaying a summary costs nothing.

use crate::cache::CacheManager;
use crate::cooldown::Cooldown;
use crate::fetch::fetch_content;
use crate::gemini::{GeminiClient, GenerateContentRequest, GenerationConfig, SpeechConfig, TTS_MODEL};
use crate::keys::ApiKeyPool;
use crate::retry::BackoffPolicy;
use log::{debug, error};
use std::sync::Arc;
use std::time::Duration;

/// Speech clips stay fresh for a day
const SPEECH_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Characters of the spoken text used to key the cache
const SPEECH_KEY_PREFIX_LEN: usize = 50;

/// Prebuilt voice used for all clips
const VOICE_NAME: &str = "Kore";

/// Client for synthesizing spoken article summaries
#[derive(Debug, Clone)]
pub struct SpeechClient {
    gemini: GeminiClient,
    keys: Arc<ApiKeyPool>,
    cooldown: Arc<Cooldown>,
    cache: Option<CacheManager>,
    policy: BackoffPolicy,
}

impl SpeechClient {
    /// Creates a speech client sharing the given key pool and cooldown
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

    /// Synthesizes speech for `text`, returning base64-encoded PCM audio
    ///
    /// Clips are always served from cache when fresh; there is no forced
    /// refresh for audio. `None` means the service was unavailable or the
    /// response carried no audio.
    pub async fn generate_speech(&self, text: &str) -> Option<String> {
        let cache_key = speech_cache_key(text);
        if let Some(cache) = &self.cache {
            if let Some(audio) = cache.get::<String>(&cache_key, SPEECH_CACHE_TTL) {
                debug!("speech clip served from cache");
                return Some(audio);
            }
        }

        let request = GenerateContentRequest::from_prompt(text).with_generation_config(
            GenerationConfig {
                response_modalities: Some(vec!["AUDIO".to_string()]),
                speech_config: Some(SpeechConfig::with_voice(VOICE_NAME)),
                ..Default::default()
            },
        );

        let response = fetch_content(
            &self.gemini,
            &self.keys,
            &self.cooldown,
            self.policy,
            "speech",
            TTS_MODEL,
            &request,
        )
        .await?;

        match response.inline_data() {
            Some(audio) if !audio.is_empty() => {
                let audio = audio.to_string();
                if let Some(cache) = &self.cache {
                    cache.set(&cache_key, &audio);
                }
                Some(audio)
            }
            _ => {
                error!("speech response carried no audio payload");
                None
            }
        }
    }
}

/// Cache key derived from the start of the spoken text
fn speech_cache_key(text: &str) -> String {
    let prefix: String = text.chars().take(SPEECH_KEY_PREFIX_LEN).collect();
    format!("speech:{}", prefix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn unroutable_client() -> GeminiClient {
        GeminiClient::with_base_url("http://127.0.0.1:1".to_string())
    }

    #[test]
    fn test_cache_key_uses_a_bounded_prefix() {
        let long = "x".repeat(200);
        let key = speech_cache_key(&long);
        assert_eq!(key, format!("speech:{}", "x".repeat(50)));

        assert_eq!(speech_cache_key("short"), "speech:short");
    }

    #[test]
    fn test_cache_key_prefix_respects_multibyte_text() {
        let text = "日本語のニュース要約".repeat(20);
        let key = speech_cache_key(&text);
        assert_eq!(key.chars().count(), "speech:".chars().count() + 50);
    }

    #[tokio::test]
    async fn test_cached_clip_is_served_without_a_remote_call() {
        let temp = TempDir::new().expect("temp dir");
        let cache = CacheManager::with_dir(temp.path().to_path_buf());
        let summary = "A short article summary to speak aloud.";
        cache.set(&speech_cache_key(summary), &"QkFTRTY0".to_string());

        let client = SpeechClient::new(
            unroutable_client(),
            Arc::new(ApiKeyPool::new(vec!["key".to_string()])),
            Arc::new(Cooldown::new()),
            Some(cache),
        );

        let audio = client.generate_speech(summary).await.expect("cached clip");
        assert_eq!(audio, "QkFTRTY0");
    }

    #[tokio::test]
    async fn test_unavailable_service_yields_none() {
        let cooldown = Arc::new(Cooldown::new());
        let client = SpeechClient::new(
            unroutable_client(),
            Arc::new(ApiKeyPool::new(Vec::new())),
            Arc::clone(&cooldown),
            None,
        );

        let result = client.generate_speech("anything").await;
        assert!(result.is_none());
        assert!(cooldown.is_active());
    }
}
