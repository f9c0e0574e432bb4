//! Crypto news sentiment commands.

use anyhow::{Context, Result};
use chrono::Utc;
use std::time::Duration;
use tracing::{info, warn};
use trading_config::AppConfig;
use trading_sentiment::{
    filter_recent, format_for_telegram, search_keywords, trending_topics, AlertWatcher, Article,
    ConsoleNotifier, NewsClient, Notifier, SentimentAnalyzer, TelegramClient,
};

use crate::cli::{AnalyzeArgs, NewsArgs, SentimentCommand, WatchArgs};

/// Hours of news the summary covers when `--hours` is not given.
const SUMMARY_HOURS: i64 = 24;

pub async fn run(command: SentimentCommand, config: &AppConfig) -> Result<()> {
    match command {
        SentimentCommand::Analyze(args) => analyze(args),
        SentimentCommand::News(args) => news(args, config).await,
        SentimentCommand::Summary(args) => summary(args, config).await,
        SentimentCommand::Watch(args) => watch(args, config).await,
    }
}

fn analyze(args: AnalyzeArgs) -> Result<()> {
    let headline = args.headline.join(" ");
    let analysis = SentimentAnalyzer::new().analyze_headline(&headline, args.weight);

    println!("Headline:   {}", analysis.headline);
    println!("Processed:  {}", analysis.processed_text);
    println!(
        "Sentiment:  {} (score {:.3}, confidence {:.0}%)",
        analysis.label,
        analysis.combined_score,
        analysis.confidence * 100.0
    );
    println!(
        "Lexicon:    compound {:.3}  pos {:.3}  neu {:.3}  neg {:.3}",
        analysis.valence.compound, analysis.valence.pos, analysis.valence.neu, analysis.valence.neg
    );
    println!(
        "Polarity:   {:.3}  subjectivity {:.3}",
        analysis.polarity.polarity, analysis.polarity.subjectivity
    );
    println!("Impact:     {}", analysis.impact);
    if !analysis.keywords.is_empty() {
        println!("Keywords:   {}", analysis.keywords.join(", "));
    }
    if !analysis.events.is_empty() {
        println!("Events:     {:?}", analysis.events);
    }
    Ok(())
}

fn news_client(config: &AppConfig) -> Result<NewsClient> {
    Ok(NewsClient::new(config.sentiment.sources.clone())
        .context("Failed to create news client")?
        .with_request_delay(Duration::from_millis(config.sentiment.request_delay_ms)))
}

/// Fetch every feed, then apply the recency and keyword filters.
async fn fetch(args: &NewsArgs, config: &AppConfig, default_hours: Option<i64>) -> Result<Vec<Article>> {
    let mut articles = news_client(config)?.fetch_all().await;
    if let Some(hours) = args.hours.or(default_hours) {
        articles = filter_recent(&articles, hours, Utc::now());
    }
    if !args.search.is_empty() {
        let keywords: Vec<&str> = args.search.iter().map(String::as_str).collect();
        articles = search_keywords(&articles, &keywords);
    }
    if articles.is_empty() {
        anyhow::bail!("No articles found");
    }
    info!(articles = articles.len(), "Fetched news");
    Ok(articles)
}

async fn news(args: NewsArgs, config: &AppConfig) -> Result<()> {
    let articles = fetch(&args, config, None).await?;
    let analyzer = SentimentAnalyzer::new();

    for article in articles.iter().take(args.limit) {
        let analysis = analyzer.analyze_headline(&article.headline, article.source_weight);
        println!("{}\n", format_for_telegram(article, Some(&analysis)));
    }

    let topics = trending_topics(&articles);
    if !topics.is_empty() {
        let line: Vec<String> = topics
            .iter()
            .take(5)
            .map(|(topic, count)| format!("{} ({})", topic, count))
            .collect();
        println!("Trending: {}", line.join(", "));
    }
    Ok(())
}

async fn summary(args: NewsArgs, config: &AppConfig) -> Result<()> {
    let articles = fetch(&args, config, Some(SUMMARY_HOURS)).await?;
    let items: Vec<(String, String, f64)> = articles
        .iter()
        .map(|a| (a.headline.clone(), a.source.clone(), a.source_weight))
        .collect();

    let analyzer = SentimentAnalyzer::new();
    let analyses = analyzer.analyze_batch(&items);
    let summary = analyzer
        .summarize(&analyses)
        .context("Nothing to summarize")?;

    let d = &summary.distribution;
    println!("📊 *Crypto Market Sentiment Summary*\n");
    println!("Overall: {}", summary.overall);
    println!("Average score: {:.3}", summary.average_score);
    println!("Articles analyzed: {}", summary.total_articles);
    println!("High impact news: {}\n", summary.high_impact_count);
    println!("🚀 Very Positive: {}", d.very_positive);
    println!("📈 Positive: {}", d.positive);
    println!("➡️ Neutral: {}", d.neutral);
    println!("📉 Negative: {}", d.negative);
    println!("💥 Very Negative: {}\n", d.very_negative);
    println!("💡 {}", summary.recommendation);
    Ok(())
}

async fn watch(args: WatchArgs, config: &AppConfig) -> Result<()> {
    let telegram = &config.sentiment.telegram;
    if args.console || !telegram.enabled {
        return run_watcher(ConsoleNotifier, args.once, config).await;
    }
    match telegram.credentials() {
        Some((token, chat_id)) => {
            let client = TelegramClient::new(token, chat_id).context("Invalid Telegram settings")?;
            info!(chat_id = client.chat_id(), "Sending alerts to Telegram");
            run_watcher(client, args.once, config).await
        }
        None => {
            warn!(
                token_env = %telegram.token_env,
                chat_id_env = %telegram.chat_id_env,
                "Telegram credentials not set, printing alerts instead"
            );
            run_watcher(ConsoleNotifier, args.once, config).await
        }
    }
}

async fn run_watcher<N: Notifier>(notifier: N, once: bool, config: &AppConfig) -> Result<()> {
    let mut watcher = AlertWatcher::new(
        news_client(config)?,
        SentimentAnalyzer::new(),
        notifier,
        config.sentiment.watcher_config(),
    );
    if once {
        let sent = watcher.poll_once().await.context("News check failed")?;
        println!("{} alert(s) sent", sent);
        return Ok(());
    }
    watcher
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await;
    Ok(())
}
