//! Grid7 - AI-curated tech news, launch timelines, and spoken summaries
//!
//! A command-line client for an aggregated tech-news feed generated by the
//! Gemini API. Remote calls run through a resilience stack (disk cache, API
//! key rotation, bounded retry, global cooldown); every failure path degrades
//! to cached data or a printed notice, never a crash.

use std::fs;
use std::process::ExitCode;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use clap::Parser;
use futures::join;
use log::{debug, warn};

use grid7::cache::CacheManager;
use grid7::cli::{Cli, Command, NewsArgs, SpeakArgs};
use grid7::config::{Settings, KEY_POOL_ENV, SINGLE_KEY_ENV};
use grid7::cooldown::Cooldown;
use grid7::data::{
    relative_time, sort_by_recency, Article, LaunchDate, LaunchesClient, NewsClient,
    NewsletterClient, SpeechClient,
};
use grid7::gemini::GeminiClient;
use grid7::keys::ApiKeyPool;

/// All content clients wired to the same key pool, cooldown, and cache
struct Clients {
    news: NewsClient,
    launches: LaunchesClient,
    speech: SpeechClient,
    newsletter: NewsletterClient,
    keys: Arc<ApiKeyPool>,
}

impl Clients {
    /// Builds the client set from environment configuration
    fn build(cache: Option<CacheManager>) -> Self {
        let settings = Settings::from_env();
        let mut pool = ApiKeyPool::new(settings.api_keys);
        pool.shuffle();
        let keys = Arc::new(pool);
        let cooldown = Arc::new(Cooldown::new());
        let gemini = GeminiClient::new();

        Self {
            news: NewsClient::new(
                gemini.clone(),
                Arc::clone(&keys),
                Arc::clone(&cooldown),
                cache.clone(),
            ),
            launches: LaunchesClient::new(
                gemini.clone(),
                Arc::clone(&keys),
                Arc::clone(&cooldown),
                cache.clone(),
            ),
            speech: SpeechClient::new(
                gemini.clone(),
                Arc::clone(&keys),
                Arc::clone(&cooldown),
                cache,
            ),
            newsletter: NewsletterClient::new(gemini, Arc::clone(&keys), cooldown),
            keys,
        }
    }

    /// Notice printed when a fetch came back with no data at all
    fn print_no_data_notice(&self) {
        if self.keys.is_empty() {
            println!(
                "No API keys configured. Set {} or {} (comma-separated) and try again.",
                SINGLE_KEY_ENV, KEY_POOL_ENV
            );
        } else {
            println!("The news service is temporarily unavailable. Please try again later.");
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();

    let cache = match &cli.cache_dir {
        Some(dir) => Some(CacheManager::with_dir(dir.clone())),
        None => CacheManager::new(),
    };
    if cache.is_none() {
        warn!("no usable cache directory; every fetch will go to the network");
    }

    let clients = Clients::build(cache);

    match cli.command {
        Command::News(args) => run_news(&clients, args).await,
        Command::Launches { refresh } => run_launches(&clients, refresh).await,
        Command::Speak(args) => run_speak(&clients, args).await,
        Command::Subscribe { email } => run_subscribe(&clients, &email).await,
        Command::Refresh => run_refresh(&clients).await,
    }
}

/// Lists the current top stories
async fn run_news(clients: &Clients, args: NewsArgs) -> ExitCode {
    let mut articles = match clients.news.fetch_tech_news(args.refresh).await {
        Some(articles) => articles,
        None => match clients.news.cached() {
            Some(cached) if !cached.is_empty() => {
                println!("Network error. Showing cached data.\n");
                cached
            }
            _ => {
                clients.print_no_data_notice();
                return ExitCode::SUCCESS;
            }
        },
    };

    if args.more {
        let existing: Vec<String> = articles.iter().map(|a| a.headline.clone()).collect();
        match clients.news.fetch_more_tech_news(&existing).await {
            Some(more) => {
                debug!("fetched {} additional stories", more.len());
                articles.extend(more);
            }
            None => println!("Could not fetch additional stories right now.\n"),
        }
    }

    sort_by_recency(&mut articles);
    if let Some(category) = args.category {
        articles.retain(|a| a.category == category);
    }
    if let Some(limit) = args.limit {
        articles.truncate(limit);
    }

    if articles.is_empty() {
        println!("No stories to show right now. Try again later.");
        return ExitCode::SUCCESS;
    }

    print_articles(&articles, args.full);
    ExitCode::SUCCESS
}

/// Shows the upcoming launch timeline
async fn run_launches(clients: &Clients, refresh: bool) -> ExitCode {
    let launches = match clients.launches.fetch_upcoming_launches(refresh).await {
        Some(launches) => launches,
        None => match clients.launches.cached() {
            Some(cached) if !cached.is_empty() => {
                println!("Network error. Showing cached data.\n");
                cached
            }
            _ => {
                clients.print_no_data_notice();
                return ExitCode::SUCCESS;
            }
        },
    };

    if launches.is_empty() {
        println!("No upcoming launches to show right now. Try again later.");
        return ExitCode::SUCCESS;
    }

    print_launches(&launches);
    ExitCode::SUCCESS
}

/// Synthesizes speech for one article's summary and writes raw PCM to disk
async fn run_speak(clients: &Clients, args: SpeakArgs) -> ExitCode {
    let mut articles = match clients.news.fetch_tech_news(false).await {
        Some(articles) if !articles.is_empty() => articles,
        _ => {
            clients.print_no_data_notice();
            return ExitCode::SUCCESS;
        }
    };
    // Match the numbering `grid7 news` prints
    sort_by_recency(&mut articles);

    let article = match args
        .article_number
        .checked_sub(1)
        .and_then(|i| articles.get(i))
    {
        Some(article) => article,
        None => {
            eprintln!(
                "Article {} does not exist; `grid7 news` currently lists {} stories.",
                args.article_number,
                articles.len()
            );
            return ExitCode::FAILURE;
        }
    };

    println!("Synthesizing: {}", article.headline);
    let encoded = match clients.speech.generate_speech(&article.summary).await {
        Some(encoded) => encoded,
        None => {
            clients.print_no_data_notice();
            return ExitCode::SUCCESS;
        }
    };

    let pcm = match BASE64.decode(encoded.as_bytes()) {
        Ok(pcm) => pcm,
        Err(e) => {
            eprintln!("Audio payload was not valid base64: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = fs::write(&args.out, &pcm) {
        eprintln!("Could not write {}: {}", args.out.display(), e);
        return ExitCode::FAILURE;
    }

    println!(
        "Wrote {} bytes of 24 kHz mono 16-bit PCM to {}",
        pcm.len(),
        args.out.display()
    );
    println!(
        "Play it with: ffplay -f s16le -ar 24000 -ac 1 {}",
        args.out.display()
    );
    ExitCode::SUCCESS
}

/// Subscribes an email address and previews the confirmation email
async fn run_subscribe(clients: &Clients, email: &str) -> ExitCode {
    // Sample the current headlines into the confirmation body; an empty
    // feed still subscribes fine
    let articles: Vec<Article> = clients
        .news
        .fetch_tech_news(false)
        .await
        .or_else(|| clients.news.cached())
        .unwrap_or_default();

    let outcome = clients.newsletter.subscribe(email, &articles).await;
    println!("{}", outcome.message);
    if let Some(body) = outcome.email_body {
        println!("\n{}", body);
    }

    if outcome.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Force-refreshes news and launches concurrently
async fn run_refresh(clients: &Clients) -> ExitCode {
    println!("Refreshing news and launches...");
    let (news, launches) = join!(
        clients.news.fetch_tech_news(true),
        clients.launches.fetch_upcoming_launches(true)
    );

    match &news {
        Some(articles) => println!("News: {} stories fetched.", articles.len()),
        None => println!("News: refresh failed."),
    }
    match &launches {
        Some(dates) => println!("Launches: {} launch windows fetched.", dates.len()),
        None => println!("Launches: refresh failed."),
    }

    if news.is_none() && launches.is_none() {
        clients.print_no_data_notice();
    }
    ExitCode::SUCCESS
}

/// Prints a numbered article listing
fn print_articles(articles: &[Article], full: bool) {
    let now = Utc::now();
    for (n, article) in articles.iter().enumerate() {
        let age = article
            .published_at()
            .map(|t| relative_time(t, now))
            .unwrap_or_else(|| article.timestamp.clone());
        println!("{:2}. [{}] {}", n + 1, article.category, article.headline);
        println!("    {} | {}", article.source, age);
        println!("    {}", article.summary);
        if full {
            println!();
            println!("{}", article.full_article);
            if !article.grounding_sources.is_empty() {
                println!("\n    Sources:");
                for source in &article.grounding_sources {
                    println!("    - {} ({})", source.title, source.uri);
                }
            }
        }
        println!();
    }
}

/// Prints the launch timeline grouped by window
fn print_launches(launches: &[LaunchDate]) {
    for date in launches {
        println!("{}", date.date);
        for event in &date.launches {
            match &event.description {
                Some(description) => println!(
                    "  - {} {} [{}] - {}",
                    event.brand, event.model, event.category, description
                ),
                None => println!("  - {} {} [{}]", event.brand, event.model, event.category),
            }
        }
        println!();
    }
}
