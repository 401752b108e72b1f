//! Command-line interface for grid7
//!
//! Parses the subcommand surface with clap: news listing, the launch
//! timeline, speech synthesis, newsletter signup, and a combined forced
//! refresh. A global `--cache-dir` overrides the platform cache location.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::data::ArticleCategory;

/// Grid7 - AI-curated tech news, launch timelines, and spoken summaries
#[derive(Parser, Debug)]
#[command(name = "grid7")]
#[command(about = "AI-curated tech news, launch timelines, and spoken article summaries")]
#[command(version)]
pub struct Cli {
    /// Directory for cached data (defaults to the platform cache dir)
    #[arg(long, global = true, value_name = "PATH")]
    pub cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the current top tech stories
    News(NewsArgs),
    /// Show the upcoming product-launch timeline
    Launches {
        /// Bypass the cache and fetch fresh data
        #[arg(long)]
        refresh: bool,
    },
    /// Synthesize a spoken version of an article summary
    Speak(SpeakArgs),
    /// Subscribe an email address to the newsletter
    Subscribe {
        /// Address to subscribe
        #[arg(value_name = "EMAIL")]
        email: String,
    },
    /// Force-refresh news and launches together
    Refresh,
}

/// Options for the `news` subcommand
#[derive(Args, Debug)]
pub struct NewsArgs {
    /// Bypass the cache and fetch fresh stories
    #[arg(long)]
    pub refresh: bool,

    /// Fetch additional stories beyond the current list
    #[arg(long)]
    pub more: bool,

    /// Only show stories in this category (AI, OS, Gadgets, Other)
    #[arg(long, value_name = "CATEGORY", value_parser = parse_category)]
    pub category: Option<ArticleCategory>,

    /// Show at most this many stories
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,

    /// Include full article text and grounding sources
    #[arg(long)]
    pub full: bool,
}

/// Options for the `speak` subcommand
#[derive(Args, Debug)]
pub struct SpeakArgs {
    /// Article number as listed by `grid7 news` (1-based)
    #[arg(value_name = "ARTICLE_NUMBER")]
    pub article_number: usize,

    /// File the raw PCM audio is written to (16-bit mono, 24 kHz)
    #[arg(long, value_name = "FILE", default_value = "speech.pcm")]
    pub out: PathBuf,
}

/// Parses a `--category` argument into a typed category
///
/// Unlike the lenient mapping applied to model output, an unrecognized
/// label here is a user error and is rejected.
fn parse_category(s: &str) -> Result<ArticleCategory, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "ai" => Ok(ArticleCategory::Ai),
        "os" => Ok(ArticleCategory::Os),
        "gadgets" => Ok(ArticleCategory::Gadgets),
        "other" => Ok(ArticleCategory::Other),
        _ => Err(format!(
            "unknown category '{}'. Valid categories: AI, OS, Gadgets, Other",
            s
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_news_defaults() {
        let cli = Cli::parse_from(["grid7", "news"]);
        assert!(cli.cache_dir.is_none());
        match cli.command {
            Command::News(args) => {
                assert!(!args.refresh);
                assert!(!args.more);
                assert!(args.category.is_none());
                assert!(args.limit.is_none());
                assert!(!args.full);
            }
            other => panic!("expected news, got {:?}", other),
        }
    }

    #[test]
    fn test_news_accepts_all_flags() {
        let cli = Cli::parse_from([
            "grid7", "news", "--refresh", "--more", "--category", "ai", "--limit", "5", "--full",
        ]);
        match cli.command {
            Command::News(args) => {
                assert!(args.refresh);
                assert!(args.more);
                assert_eq!(args.category, Some(ArticleCategory::Ai));
                assert_eq!(args.limit, Some(5));
                assert!(args.full);
            }
            other => panic!("expected news, got {:?}", other),
        }
    }

    #[test]
    fn test_category_parsing_is_case_insensitive() {
        assert_eq!(parse_category("AI"), Ok(ArticleCategory::Ai));
        assert_eq!(parse_category("os"), Ok(ArticleCategory::Os));
        assert_eq!(parse_category(" Gadgets "), Ok(ArticleCategory::Gadgets));
        assert_eq!(parse_category("OTHER"), Ok(ArticleCategory::Other));
    }

    #[test]
    fn test_unknown_category_is_rejected() {
        let err = parse_category("quantum").expect_err("should reject");
        assert!(err.contains("quantum"));
        assert!(err.contains("Valid categories"));

        let result = Cli::try_parse_from(["grid7", "news", "--category", "quantum"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_launches_refresh_flag() {
        let cli = Cli::parse_from(["grid7", "launches", "--refresh"]);
        match cli.command {
            Command::Launches { refresh } => assert!(refresh),
            other => panic!("expected launches, got {:?}", other),
        }
    }

    #[test]
    fn test_speak_takes_a_number_and_output_file() {
        let cli = Cli::parse_from(["grid7", "speak", "3", "--out", "clip.pcm"]);
        match cli.command {
            Command::Speak(args) => {
                assert_eq!(args.article_number, 3);
                assert_eq!(args.out, PathBuf::from("clip.pcm"));
            }
            other => panic!("expected speak, got {:?}", other),
        }
    }

    #[test]
    fn test_speak_defaults_its_output_file() {
        let cli = Cli::parse_from(["grid7", "speak", "1"]);
        match cli.command {
            Command::Speak(args) => assert_eq!(args.out, PathBuf::from("speech.pcm")),
            other => panic!("expected speak, got {:?}", other),
        }
    }

    #[test]
    fn test_subscribe_takes_an_email() {
        let cli = Cli::parse_from(["grid7", "subscribe", "reader@example.com"]);
        match cli.command {
            Command::Subscribe { email } => assert_eq!(email, "reader@example.com"),
            other => panic!("expected subscribe, got {:?}", other),
        }
    }

    #[test]
    fn test_cache_dir_is_global() {
        let cli = Cli::parse_from(["grid7", "news", "--cache-dir", "/tmp/grid7-cache"]);
        assert_eq!(cli.cache_dir, Some(PathBuf::from("/tmp/grid7-cache")));
    }

    #[test]
    fn test_missing_subcommand_is_an_error() {
        assert!(Cli::try_parse_from(["grid7"]).is_err());
    }
}
