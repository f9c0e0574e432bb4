//! News sources, RSS/Atom fetching and article filters.

use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::sync::OnceLock;
use tracing::{debug, info, warn};
use trading_core::error::NewsError;

use crate::analyzer::HeadlineAnalysis;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
/// Items kept from each feed, newest first as served.
pub const ITEMS_PER_FEED: usize = 10;
const SUMMARY_CHARS: usize = 200;

/// Terms counted by [`trending_topics`].
pub const TOPICS: &[&str] = &[
    "bitcoin",
    "btc",
    "ethereum",
    "eth",
    "defi",
    "nft",
    "regulation",
    "sec",
    "hack",
    "pump",
    "dump",
    "bull",
    "bear",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsSource {
    pub id: String,
    pub name: String,
    pub rss: String,
    /// Credibility multiplier applied to sentiment scores.
    pub weight: f64,
}

impl NewsSource {
    pub fn new(id: &str, name: &str, rss: &str, weight: f64) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            rss: rss.to_string(),
            weight,
        }
    }
}

pub fn default_sources() -> Vec<NewsSource> {
    vec![
        NewsSource::new(
            "coindesk",
            "CoinDesk",
            "https://www.coindesk.com/arc/outboundfeeds/rss/",
            0.9,
        ),
        NewsSource::new("cointelegraph", "CoinTelegraph", "https://cointelegraph.com/rss", 0.8),
        NewsSource::new("decrypt", "Decrypt", "https://decrypt.co/feed", 0.7),
        NewsSource::new("bitcoinist", "Bitcoinist", "https://bitcoinist.com/feed/", 0.6),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub headline: String,
    pub url: String,
    pub published: Option<DateTime<Utc>>,
    /// Date text as it appeared in the feed.
    pub published_raw: String,
    pub summary: String,
    pub source: String,
    pub source_id: String,
    pub source_weight: f64,
    pub fetched_at: DateTime<Utc>,
}

struct FeedPatterns {
    item: Regex,
    entry: Regex,
    title: Regex,
    link: Regex,
    atom_link: Regex,
    date: Regex,
    body: Regex,
    cdata: Regex,
    tag: Regex,
    numeric_entity: Regex,
}

fn patterns() -> &'static FeedPatterns {
    static PATTERNS: OnceLock<FeedPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let re = |p: &str| Regex::new(p).expect("valid feed pattern");
        FeedPatterns {
            item: re(r"(?s)<item\b[^>]*>(.*?)</item>"),
            entry: re(r"(?s)<entry\b[^>]*>(.*?)</entry>"),
            title: re(r"(?s)<title\b[^>]*>(.*?)</title>"),
            link: re(r"(?s)<link\b[^>]*>(.*?)</link>"),
            atom_link: re(r#"<link\b[^>]*\bhref\s*=\s*["']([^"']+)["']"#),
            date: re(r"(?s)<(pubDate|published|updated|dc:date)\b[^>]*>(.*?)</(?:pubDate|published|updated|dc:date)>"),
            body: re(r"(?s)<(description|summary|content)\b[^>]*>(.*?)</(?:description|summary|content)>"),
            cdata: re(r"(?s)<!\[CDATA\[(.*?)\]\]>"),
            tag: re(r"(?s)<[^>]*>"),
            numeric_entity: re(r"&#(x?[0-9a-fA-F]+);"),
        }
    })
}

/// Strip CDATA wrappers and markup, decode entities, collapse whitespace.
fn clean_text(raw: &str) -> String {
    let p = patterns();
    let unwrapped = p.cdata.replace_all(raw, "$1");
    // Entity-encoded HTML in descriptions decodes to tags; strip twice.
    let stripped = p.tag.replace_all(&unwrapped, " ");
    let decoded = decode_entities(&stripped);
    let stripped = p.tag.replace_all(&decoded, " ");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode_entities(text: &str) -> String {
    let numeric = patterns().numeric_entity.replace_all(text, |caps: &regex::Captures| {
        let code = &caps[1];
        let value = match code.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => code.parse::<u32>().ok(),
        };
        value
            .and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_default()
    });
    numeric
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

/// RFC 2822 (RSS) or RFC 3339 (Atom) timestamps.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parse up to `limit` items from an RSS or Atom document.
pub fn parse_feed(
    xml: &str,
    source: &NewsSource,
    limit: usize,
    fetched_at: DateTime<Utc>,
) -> Result<Vec<Article>, NewsError> {
    let p = patterns();
    let mut blocks: Vec<&str> = p
        .item
        .captures_iter(xml)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();
    if blocks.is_empty() {
        blocks = p
            .entry
            .captures_iter(xml)
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
            .collect();
    }
    if blocks.is_empty() && !xml.contains("<rss") && !xml.contains("<feed") {
        return Err(NewsError::Feed(format!("{}: not an RSS or Atom document", source.name)));
    }

    let articles = blocks
        .into_iter()
        .filter_map(|block| {
            let headline = p.title.captures(block).map(|c| clean_text(&c[1]))?;
            if headline.is_empty() {
                return None;
            }
            let url = p
                .link
                .captures(block)
                .map(|c| clean_text(&c[1]))
                .filter(|u| !u.is_empty())
                .or_else(|| p.atom_link.captures(block).map(|c| c[1].to_string()))
                .unwrap_or_default();
            let published_raw = p
                .date
                .captures(block)
                .map(|c| clean_text(&c[2]))
                .unwrap_or_default();
            let summary = p
                .body
                .captures(block)
                .map(|c| clean_text(&c[2]).chars().take(SUMMARY_CHARS).collect())
                .unwrap_or_default();

            Some(Article {
                headline,
                url,
                published: parse_date(&published_raw),
                published_raw,
                summary,
                source: source.name.clone(),
                source_id: source.id.clone(),
                source_weight: source.weight,
                fetched_at,
            })
        })
        .take(limit)
        .collect();
    Ok(articles)
}

/// Newest first; undated articles last.
pub fn sort_newest_first(articles: &mut [Article]) {
    articles.sort_by(|a, b| b.published.cmp(&a.published));
}

/// Articles published within `hours` of `now`. Undated articles are kept.
pub fn filter_recent(articles: &[Article], hours: i64, now: DateTime<Utc>) -> Vec<Article> {
    let cutoff = now - Duration::hours(hours);
    articles
        .iter()
        .filter(|a| a.published.map_or(true, |p| p > cutoff))
        .cloned()
        .collect()
}

/// Articles whose headline or summary mentions any keyword.
pub fn search_keywords(articles: &[Article], keywords: &[&str]) -> Vec<Article> {
    let keywords: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();
    articles
        .iter()
        .filter(|a| {
            let headline = a.headline.to_lowercase();
            let summary = a.summary.to_lowercase();
            keywords
                .iter()
                .any(|k| headline.contains(k.as_str()) || summary.contains(k.as_str()))
        })
        .cloned()
        .collect()
}

/// Article counts per topic, most mentioned first.
pub fn trending_topics(articles: &[Article]) -> Vec<(&'static str, usize)> {
    let texts: Vec<String> = articles
        .iter()
        .map(|a| format!("{} {}", a.headline, a.summary).to_lowercase())
        .collect();
    let mut counts: Vec<(&'static str, usize)> = TOPICS
        .iter()
        .map(|topic| (*topic, texts.iter().filter(|t| t.contains(topic)).count()))
        .filter(|(_, n)| *n > 0)
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// Telegram Markdown message for an article, with its analysis if given.
pub fn format_for_telegram(article: &Article, analysis: Option<&HeadlineAnalysis>) -> String {
    let mut msg = String::new();
    let _ = writeln!(msg, "📰 *{}*", article.headline);
    let _ = writeln!(msg, "📡 Source: {}", article.source);
    if let Some(a) = analysis {
        let _ = writeln!(msg, "🎯 Sentiment: {}", a.label);
        let _ = writeln!(msg, "⚡ Impact: {}", a.impact);
        let _ = writeln!(msg, "📊 Score: {:.3}", a.combined_score);
        if !a.keywords.is_empty() {
            let _ = writeln!(msg, "🔑 Keywords: {}", a.keywords.join(", "));
        }
    }
    let _ = write!(msg, "\n🔗 [Read More]({})", article.url);
    msg
}

/// Fetches the configured feeds.
#[derive(Debug, Clone)]
pub struct NewsClient {
    client: reqwest::Client,
    sources: Vec<NewsSource>,
    request_delay: std::time::Duration,
}

impl NewsClient {
    pub fn new(sources: Vec<NewsSource>) -> Result<Self, NewsError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(20))
            .build()
            .map_err(|e| NewsError::Request(e.to_string()))?;
        Ok(Self {
            client,
            sources,
            request_delay: std::time::Duration::from_secs(1),
        })
    }

    /// Pause between consecutive feed requests.
    pub fn with_request_delay(mut self, delay: std::time::Duration) -> Self {
        self.request_delay = delay;
        self
    }

    pub fn sources(&self) -> &[NewsSource] {
        &self.sources
    }

    pub async fn fetch_feed(&self, source: &NewsSource) -> Result<Vec<Article>, NewsError> {
        debug!(source = %source.name, url = %source.rss, "Fetching feed");
        let response = self
            .client
            .get(&source.rss)
            .send()
            .await
            .map_err(|e| NewsError::Request(e.to_string()))?;
        if !response.status().is_success() {
            return Err(NewsError::Request(format!(
                "{} returned {}",
                source.name,
                response.status()
            )));
        }
        let body = response
            .text()
            .await
            .map_err(|e| NewsError::Request(e.to_string()))?;
        let articles = parse_feed(&body, source, ITEMS_PER_FEED, Utc::now())?;
        info!(source = %source.name, articles = articles.len(), "Fetched feed");
        Ok(articles)
    }

    /// Every source in turn; failing feeds are logged and skipped.
    pub async fn fetch_all(&self) -> Vec<Article> {
        let mut all = Vec::new();
        for (i, source) in self.sources.iter().enumerate() {
            if i > 0 && !self.request_delay.is_zero() {
                tokio::time::sleep(self.request_delay).await;
            }
            match self.fetch_feed(source).await {
                Ok(articles) => all.extend(articles),
                Err(e) => warn!(source = %source.name, error = %e, "Feed unavailable"),
            }
        }
        sort_newest_first(&mut all);
        all
    }
}
