//! Headline sentiment: scoring, labelling and market summaries.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

use crate::lexicon::{LexiconAnalyzer, ValenceScores};
use crate::polarity::{polarity, PolarityScores};

const VALENCE_WEIGHT: f64 = 0.7;
const POLARITY_WEIGHT: f64 = 0.3;

/// Words that make strongly-scored news market-moving.
const HIGH_IMPACT_TERMS: &[&str] = &[
    "sec",
    "ban",
    "regulation",
    "tesla",
    "microstrategy",
    "government",
    "hack",
    "billion",
    "etf",
];

pub const POSITIVE_KEYWORDS: &[&str] = &[
    "adoption",
    "accepts",
    "approves",
    "bullish",
    "surge",
    "rally",
    "partnership",
    "integration",
    "institutional",
    "mainstream",
    "breakthrough",
    "upgrade",
    "halving",
    "ath",
    "all-time high",
];

pub const NEGATIVE_KEYWORDS: &[&str] = &[
    "ban",
    "crash",
    "hack",
    "scam",
    "fraud",
    "investigation",
    "lawsuit",
    "bankruptcy",
    "default",
    "crackdown",
    "regulatory",
    "bear",
    "plunge",
    "dump",
    "exploit",
    "vulnerability",
];

/// Five-bucket sentiment label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentLabel {
    VeryPositive,
    Positive,
    Neutral,
    Negative,
    VeryNegative,
}

impl SentimentLabel {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.5 {
            Self::VeryPositive
        } else if score >= 0.1 {
            Self::Positive
        } else if score >= -0.1 {
            Self::Neutral
        } else if score >= -0.5 {
            Self::Negative
        } else {
            Self::VeryNegative
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Self::VeryPositive => "🚀",
            Self::Positive => "📈",
            Self::Neutral => "➡️",
            Self::Negative => "📉",
            Self::VeryNegative => "💥",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::VeryPositive => "Very Positive",
            Self::Positive => "Positive",
            Self::Neutral => "Neutral",
            Self::Negative => "Negative",
            Self::VeryNegative => "Very Negative",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name(), self.emoji())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ImpactLevel {
    #[serde(rename = "LOW")]
    Low,
    #[serde(rename = "MEDIUM")]
    Medium,
    #[serde(rename = "MEDIUM-HIGH")]
    MediumHigh,
    #[serde(rename = "HIGH")]
    High,
}

impl ImpactLevel {
    /// A high-impact term with |score| > 0.3 is HIGH; otherwise the score
    /// magnitude alone decides.
    pub fn assess(headline: &str, score: f64) -> Self {
        let lower = headline.to_lowercase();
        let strength = score.abs();
        if strength > 0.3 && HIGH_IMPACT_TERMS.iter().any(|t| lower.contains(t)) {
            Self::High
        } else if strength > 0.5 {
            Self::MediumHigh
        } else if strength > 0.3 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Worth an alert.
    pub fn is_alert(&self) -> bool {
        matches!(self, Self::High | Self::MediumHigh)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::MediumHigh => "MEDIUM-HIGH",
            Self::High => "HIGH",
        }
    }
}

impl fmt::Display for ImpactLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event categories tracked in headlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Regulatory,
    Institutional,
    Technical,
    Market,
}

impl EventCategory {
    pub const ALL: [EventCategory; 4] = [
        Self::Regulatory,
        Self::Institutional,
        Self::Technical,
        Self::Market,
    ];

    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Self::Regulatory => &["sec", "regulation", "legal", "government", "policy"],
            Self::Institutional => &["tesla", "microstrategy", "bank", "fund", "etf"],
            Self::Technical => &["hack", "security", "breach", "vulnerability"],
            Self::Market => &["whale", "liquidation", "volume", "breakout"],
        }
    }

    /// Expected impact when the category shows up.
    pub fn impact(&self) -> ImpactLevel {
        match self {
            Self::Regulatory | Self::Institutional => ImpactLevel::High,
            Self::Technical | Self::Market => ImpactLevel::Medium,
        }
    }

    pub fn detect(headline: &str) -> Vec<EventCategory> {
        let lower = headline.to_lowercase();
        Self::ALL
            .into_iter()
            .filter(|c| c.keywords().iter().any(|k| lower.contains(k)))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadlineAnalysis {
    pub headline: String,
    pub processed_text: String,
    pub analyzed_at: DateTime<Utc>,
    pub valence: ValenceScores,
    pub polarity: PolarityScores,
    pub combined_score: f64,
    pub label: SentimentLabel,
    pub impact: ImpactLevel,
    /// `+word` / `-word` for market-moving keywords found.
    pub keywords: Vec<String>,
    pub events: Vec<EventCategory>,
    /// In [0, 1].
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelDistribution {
    pub very_positive: usize,
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
    pub very_negative: usize,
}

impl LabelDistribution {
    fn add(&mut self, label: SentimentLabel) {
        match label {
            SentimentLabel::VeryPositive => self.very_positive += 1,
            SentimentLabel::Positive => self.positive += 1,
            SentimentLabel::Neutral => self.neutral += 1,
            SentimentLabel::Negative => self.negative += 1,
            SentimentLabel::VeryNegative => self.very_negative += 1,
        }
    }
}

/// Aggregate sentiment over a batch of headlines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSummary {
    pub overall: SentimentLabel,
    pub average_score: f64,
    pub total_articles: usize,
    pub high_impact_count: usize,
    pub distribution: LabelDistribution,
    pub recommendation: String,
}

fn url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"http\S+|www.\S+").expect("valid URL pattern"))
}

fn disallowed_chars() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^a-z0-9\s!?.$%]").expect("valid character class"))
}

/// Lowercase, drop URLs and keep only letters, digits, whitespace and
/// `! ? . $ %`.
pub fn preprocess(text: &str) -> String {
    let lower = text.to_lowercase();
    let without_urls = url_pattern().replace_all(&lower, "");
    disallowed_chars()
        .replace_all(&without_urls, "")
        .trim()
        .to_string()
}

/// `+keyword` / `-keyword` for every listed keyword contained in the text.
pub fn extract_keywords(headline: &str) -> Vec<String> {
    let lower = headline.to_lowercase();
    let positive = POSITIVE_KEYWORDS
        .iter()
        .filter(|k| lower.contains(*k))
        .map(|k| format!("+{}", k));
    let negative = NEGATIVE_KEYWORDS
        .iter()
        .filter(|k| lower.contains(*k))
        .map(|k| format!("-{}", k));
    positive.chain(negative).collect()
}

/// Agreement between the two scorers and the share of opinionated words.
fn confidence(valence: &ValenceScores, polarity: f64) -> f64 {
    let agree = (valence.compound > 0.0 && polarity > 0.0)
        || (valence.compound < 0.0 && polarity < 0.0);
    let bonus = if agree { 0.2 } else { -0.1 };
    ((valence.pos.abs() + valence.neg.abs()) / 2.0 + bonus).clamp(0.0, 1.0)
}

fn recommendation(average: f64, high_impact: usize) -> &'static str {
    if high_impact > 0 {
        if average > 0.3 {
            "🟢 Strong positive sentiment with high-impact news. Market may be bullish."
        } else if average < -0.3 {
            "🔴 Strong negative sentiment with high-impact news. Exercise caution."
        } else {
            "🟡 Mixed signals with high-impact news. Wait for clearer direction."
        }
    } else if average.abs() < 0.2 {
        "⚪ Low sentiment signal. No major market moves expected."
    } else {
        "🟡 Moderate sentiment but low-impact news. Monitor closely."
    }
}

#[derive(Debug, Clone, Default)]
pub struct SentimentAnalyzer {
    lexicon: LexiconAnalyzer,
}

impl SentimentAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lexicon(lexicon: LexiconAnalyzer) -> Self {
        Self { lexicon }
    }

    pub fn analyze_headline(&self, headline: &str, source_weight: f64) -> HeadlineAnalysis {
        let processed = preprocess(headline);
        let valence = self.lexicon.polarity_scores(&processed);
        let polarity = polarity(&processed);
        let combined_score =
            (valence.compound * VALENCE_WEIGHT + polarity.polarity * POLARITY_WEIGHT) * source_weight;

        HeadlineAnalysis {
            headline: headline.to_string(),
            processed_text: processed,
            analyzed_at: Utc::now(),
            confidence: confidence(&valence, polarity.polarity),
            valence,
            polarity,
            combined_score,
            label: SentimentLabel::from_score(combined_score),
            impact: ImpactLevel::assess(headline, combined_score),
            keywords: extract_keywords(headline),
            events: EventCategory::detect(headline),
            source: None,
        }
    }

    /// Analyze `(headline, source, weight)` triples.
    pub fn analyze_batch(&self, items: &[(String, String, f64)]) -> Vec<HeadlineAnalysis> {
        items
            .iter()
            .map(|(headline, source, weight)| {
                let mut analysis = self.analyze_headline(headline, *weight);
                analysis.source = Some(source.clone());
                analysis
            })
            .collect()
    }

    /// `None` for an empty batch.
    pub fn summarize(&self, analyses: &[HeadlineAnalysis]) -> Option<MarketSummary> {
        if analyses.is_empty() {
            return None;
        }
        let total = analyses.len();
        let average = analyses.iter().map(|a| a.combined_score).sum::<f64>() / total as f64;
        let high_impact_count = analyses.iter().filter(|a| a.impact.is_alert()).count();
        let mut distribution = LabelDistribution::default();
        for a in analyses {
            distribution.add(a.label);
        }

        Some(MarketSummary {
            overall: SentimentLabel::from_score(average),
            average_score: average,
            total_articles: total,
            high_impact_count,
            distribution,
            recommendation: recommendation(average, high_impact_count).to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preprocess() {
        assert_eq!(
            preprocess("BTC to $100K?! See https://x.com/abc #crypto @user"),
            "btc to $100k?! see  crypto user"
        );
        assert_eq!(preprocess("  www.site.io  "), "");
    }

    #[test]
    fn test_label_buckets() {
        assert_eq!(SentimentLabel::from_score(0.5), SentimentLabel::VeryPositive);
        assert_eq!(SentimentLabel::from_score(0.1), SentimentLabel::Positive);
        assert_eq!(SentimentLabel::from_score(0.0), SentimentLabel::Neutral);
        assert_eq!(SentimentLabel::from_score(-0.1), SentimentLabel::Neutral);
        assert_eq!(SentimentLabel::from_score(-0.3), SentimentLabel::Negative);
        assert_eq!(SentimentLabel::from_score(-0.51), SentimentLabel::VeryNegative);
        assert_eq!(SentimentLabel::Positive.to_string(), "Positive 📈");
    }

    #[test]
    fn test_impact_levels() {
        assert_eq!(ImpactLevel::assess("SEC sues exchange", -0.4), ImpactLevel::High);
        assert_eq!(ImpactLevel::assess("SEC sues exchange", -0.2), ImpactLevel::Low);
        assert_eq!(ImpactLevel::assess("Coin rallies", 0.6), ImpactLevel::MediumHigh);
        assert_eq!(ImpactLevel::assess("Coin rallies", 0.35), ImpactLevel::Medium);
        assert!(ImpactLevel::High.is_alert());
        assert!(!ImpactLevel::Medium.is_alert());
    }

    #[test]
    fn test_ban_headline() {
        let analyzer = SentimentAnalyzer::new();
        let a = analyzer.analyze_headline("China Bans Cryptocurrency Mining Operations", 1.0);
        assert!(a.combined_score < -0.3);
        assert_eq!(a.impact, ImpactLevel::High);
        assert!(a.keywords.contains(&"-ban".to_string()));
        assert_eq!(a.label, SentimentLabel::Negative);
    }

    #[test]
    fn test_source_weight_scales_score() {
        let analyzer = SentimentAnalyzer::new();
        let full = analyzer.analyze_headline("Bitcoin rally is bullish", 1.0);
        let half = analyzer.analyze_headline("Bitcoin rally is bullish", 0.5);
        assert!(full.combined_score > 0.0);
        assert!((half.combined_score - full.combined_score * 0.5).abs() < 1e-12);
        assert!(full.keywords.contains(&"+rally".to_string()));
        assert!(full.keywords.contains(&"+bullish".to_string()));
        // both scorers agree
        assert!(full.confidence > 0.2);
    }

    #[test]
    fn test_events() {
        let events = EventCategory::detect("Whale moves funds after exchange hack");
        assert!(events.contains(&EventCategory::Technical));
        assert!(events.contains(&EventCategory::Market));
        assert!(events.contains(&EventCategory::Institutional));
        assert_eq!(EventCategory::Regulatory.impact(), ImpactLevel::High);
    }

    #[test]
    fn test_summary() {
        let analyzer = SentimentAnalyzer::new();
        assert!(analyzer.summarize(&[]).is_none());

        let batch = analyzer.analyze_batch(&[
            ("China Bans Cryptocurrency Mining".into(), "Reuters".into(), 1.0),
            ("Network processes blocks".into(), "CoinDesk".into(), 0.9),
        ]);
        assert_eq!(batch[1].source.as_deref(), Some("CoinDesk"));

        let summary = analyzer.summarize(&batch).unwrap();
        assert_eq!(summary.total_articles, 2);
        assert_eq!(summary.high_impact_count, 1);
        assert_eq!(summary.distribution.neutral, 1);
        assert_eq!(summary.distribution.negative, 1);
        assert!(summary.recommendation.contains("high-impact"));
    }
}
