//! News sentiment for crypto markets.
//!
//! Headlines are scored by a valence lexicon (with crypto vocabulary) and
//! an opinion-word polarity scorer, blended and weighted by source
//! credibility. [`NewsClient`] pulls RSS/Atom feeds and [`AlertWatcher`]
//! forwards market-moving stories to a [`Notifier`] such as Telegram.

mod analyzer;
mod lexicon;
mod news;
mod polarity;
mod telegram;
mod watcher;

pub use analyzer::{
    extract_keywords, preprocess, EventCategory, HeadlineAnalysis, ImpactLevel, LabelDistribution,
    MarketSummary, SentimentAnalyzer, SentimentLabel, NEGATIVE_KEYWORDS, POSITIVE_KEYWORDS,
};
pub use lexicon::{normalize, LexiconAnalyzer, ValenceScores, CRYPTO_LEXICON};
pub use news::{
    default_sources, filter_recent, format_for_telegram, parse_date, parse_feed, search_keywords,
    sort_newest_first, trending_topics, Article, NewsClient, NewsSource, ITEMS_PER_FEED, TOPICS,
};
pub use polarity::{polarity, PolarityScores};
pub use telegram::{ConsoleNotifier, Notifier, TelegramClient, CHAT_ID_ENV, TOKEN_ENV};
pub use watcher::{Alert, AlertWatcher, WatcherConfig, ALERT_HEADER};
