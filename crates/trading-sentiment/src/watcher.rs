//! Periodic high-impact news alerts.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;
use tracing::{error, info, warn};
use trading_core::error::NewsError;

use crate::analyzer::SentimentAnalyzer;
use crate::news::{filter_recent, format_for_telegram, Article, NewsClient};
use crate::telegram::Notifier;

pub const ALERT_HEADER: &str = "🚨 *HIGH IMPACT NEWS ALERT*\n\n";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
    /// Seconds between polls.
    pub interval_secs: u64,
    /// Only articles newer than this are considered.
    pub lookback_hours: i64,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            interval_secs: 30 * 60,
            lookback_hours: 1,
        }
    }
}

/// A formatted alert for one article.
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub url: String,
    pub text: String,
}

/// Polls the feeds and forwards unseen HIGH / MEDIUM-HIGH impact stories.
pub struct AlertWatcher<N> {
    news: NewsClient,
    analyzer: SentimentAnalyzer,
    notifier: N,
    config: WatcherConfig,
    seen: HashSet<String>,
}

impl<N: Notifier> AlertWatcher<N> {
    pub fn new(news: NewsClient, analyzer: SentimentAnalyzer, notifier: N, config: WatcherConfig) -> Self {
        Self {
            news,
            analyzer,
            notifier,
            config,
            seen: HashSet::new(),
        }
    }

    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    /// Analyze articles not seen before and build alert messages for the
    /// market-moving ones. Articles that need no alert are marked as seen;
    /// alerts are marked by [`AlertWatcher::deliver`] once sent.
    pub fn collect_alerts(&mut self, articles: &[Article]) -> Vec<Alert> {
        let mut alerts = Vec::new();
        for article in articles {
            if self.seen.contains(&article.url) || alerts.iter().any(|a: &Alert| a.url == article.url) {
                continue;
            }
            let analysis = self
                .analyzer
                .analyze_headline(&article.headline, article.source_weight);
            if analysis.impact.is_alert() {
                alerts.push(Alert {
                    url: article.url.clone(),
                    text: format!(
                        "{}{}",
                        ALERT_HEADER,
                        format_for_telegram(article, Some(&analysis))
                    ),
                });
            } else {
                self.seen.insert(article.url.clone());
            }
        }
        alerts
    }

    /// Send alerts in order. Stops at the first failure; undelivered alerts
    /// stay unseen and are retried on the next poll.
    pub async fn deliver(&mut self, alerts: &[Alert]) -> Result<usize, NewsError> {
        let mut sent = 0;
        for alert in alerts {
            self.notifier.notify(&alert.text).await?;
            self.seen.insert(alert.url.clone());
            sent += 1;
        }
        Ok(sent)
    }

    /// One fetch-analyze-notify cycle. Returns the number of alerts sent.
    pub async fn poll_once(&mut self) -> Result<usize, NewsError> {
        let articles = self.news.fetch_all().await;
        let recent = filter_recent(&articles, self.config.lookback_hours, Utc::now());
        let alerts = self.collect_alerts(&recent);
        let sent = self.deliver(&alerts).await?;
        info!(
            fetched = articles.len(),
            recent = recent.len(),
            alerts = sent,
            "News check complete"
        );
        Ok(sent)
    }

    /// Poll on the configured interval until `shutdown` resolves. The
    /// first check runs immediately.
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(Duration::from_secs(self.config.interval_secs.max(1)));
        tokio::pin!(shutdown);
        info!(interval_secs = self.config.interval_secs, "Alert watcher started");

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!(seen = self.seen.len(), "Alert watcher stopped");
                    break;
                }
                _ = ticker.tick() => {
                    match self.poll_once().await {
                        Ok(0) => {}
                        Ok(n) => warn!(alerts = n, "High-impact news"),
                        Err(e) => error!(error = %e, "News check failed"),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::news::NewsSource;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Recorder {
        sent: Arc<Mutex<Vec<String>>>,
        failures_left: Arc<Mutex<usize>>,
    }

    impl Recorder {
        fn failing_once() -> Self {
            let r = Self::default();
            *r.failures_left.lock().unwrap() = 1;
            r
        }
    }

    #[async_trait]
    impl Notifier for Recorder {
        async fn notify(&self, text: &str) -> Result<(), NewsError> {
            let mut failures = self.failures_left.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(NewsError::Telegram("unavailable".into()));
            }
            self.sent.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    fn article(headline: &str, url: &str) -> Article {
        Article {
            headline: headline.into(),
            url: url.into(),
            published: Some(Utc::now()),
            published_raw: String::new(),
            summary: String::new(),
            source: "Test".into(),
            source_id: "test".into(),
            source_weight: 1.0,
            fetched_at: Utc::now(),
        }
    }

    fn watcher(recorder: Recorder) -> AlertWatcher<Recorder> {
        let news = NewsClient::new(vec![NewsSource::new("t", "T", "http://localhost:9/rss", 1.0)])
            .unwrap()
            .with_request_delay(Duration::ZERO);
        AlertWatcher::new(news, SentimentAnalyzer::new(), recorder, WatcherConfig::default())
    }

    #[tokio::test]
    async fn test_alerts_only_high_impact_and_unseen() {
        let recorder = Recorder::default();
        let mut w = watcher(recorder.clone());
        let articles = vec![
            article("China Bans Cryptocurrency Mining Operations", "https://x/1"),
            article("Network processes blocks", "https://x/2"),
        ];

        let alerts = w.collect_alerts(&articles);
        assert_eq!(alerts.len(), 1);
        assert!(alerts[0].text.starts_with(ALERT_HEADER));
        assert!(alerts[0].text.contains("Impact: HIGH"));
        assert_eq!(w.seen_count(), 1);

        assert_eq!(w.deliver(&alerts).await.unwrap(), 1);
        assert_eq!(w.seen_count(), 2);
        assert_eq!(recorder.sent.lock().unwrap().len(), 1);

        // same URLs again
        assert!(w.collect_alerts(&articles).is_empty());
    }

    #[tokio::test]
    async fn test_failed_delivery_is_retried() {
        let recorder = Recorder::failing_once();
        let mut w = watcher(recorder.clone());
        let articles = vec![
            article("China Bans Cryptocurrency Mining Operations", "https://x/1"),
            article("China Bans Cryptocurrency Mining Operations", "https://x/3"),
        ];

        let alerts = w.collect_alerts(&articles);
        assert_eq!(alerts.len(), 2);
        assert!(w.deliver(&alerts).await.is_err());
        assert_eq!(w.seen_count(), 0);

        let retry = w.collect_alerts(&articles);
        assert_eq!(retry.len(), 2);
        assert_eq!(w.deliver(&retry).await.unwrap(), 2);
        assert_eq!(recorder.sent.lock().unwrap().len(), 2);
        assert!(w.collect_alerts(&articles).is_empty());
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let recorder = Recorder::default();
        let mut w = watcher(recorder.clone());
        // shutdown is polled before the first tick
        tokio::time::timeout(Duration::from_secs(30), w.run(async {}))
            .await
            .unwrap();
        assert!(recorder.sent.lock().unwrap().is_empty());
    }
}
