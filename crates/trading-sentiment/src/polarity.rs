//! Adjective-pattern polarity and subjectivity.
//!
//! Scores are averaged over the opinion words found in the text. An
//! intensifier directly before a word scales it up; a negation within the
//! two preceding words halves and flips its polarity.

use serde::{Deserialize, Serialize};

use crate::lexicon::is_negation;

const INTENSIFIER_SCALE: f64 = 1.3;
const NEGATION_SCALE: f64 = -0.5;

/// (word, polarity, subjectivity)
const OPINION_WORDS: &[(&str, f64, f64)] = &[
    ("good", 0.7, 0.6),
    ("great", 0.8, 0.75),
    ("excellent", 1.0, 1.0),
    ("amazing", 0.6, 0.9),
    ("awesome", 1.0, 1.0),
    ("best", 1.0, 0.3),
    ("better", 0.5, 0.5),
    ("positive", 0.23, 0.55),
    ("strong", 0.43, 0.73),
    ("successful", 0.75, 0.95),
    ("successfully", 0.75, 0.95),
    ("bullish", 0.5, 0.6),
    ("optimistic", 0.5, 0.6),
    ("safe", 0.5, 0.5),
    ("secure", 0.4, 0.6),
    ("happy", 0.8, 1.0),
    ("new", 0.14, 0.45),
    ("big", 0.0, 0.1),
    ("huge", 0.4, 0.9),
    ("high", 0.16, 0.54),
    ("higher", 0.25, 0.5),
    ("record", 0.2, 0.3),
    ("major", 0.06, 0.5),
    ("massive", 0.0, 1.0),
    ("stable", 0.2, 0.4),
    ("innovative", 0.5, 0.75),
    ("bad", -0.7, 0.67),
    ("worse", -0.4, 0.6),
    ("worst", -1.0, 1.0),
    ("terrible", -1.0, 1.0),
    ("awful", -1.0, 1.0),
    ("negative", -0.3, 0.4),
    ("weak", -0.38, 0.63),
    ("bearish", -0.5, 0.6),
    ("low", 0.0, 0.3),
    ("lower", 0.0, 0.0),
    ("risky", -0.5, 0.6),
    ("volatile", -0.2, 0.6),
    ("uncertain", -0.2, 0.6),
    ("illegal", -0.5, 0.5),
    ("fraudulent", -0.8, 0.8),
    ("failed", -0.5, 0.3),
    ("dangerous", -0.6, 0.9),
    ("sad", -0.5, 1.0),
    ("angry", -0.5, 1.0),
    ("poor", -0.4, 0.6),
    ("wrong", -0.5, 0.9),
    ("slow", -0.3, 0.39),
    ("fake", -0.5, 1.0),
];

const INTENSIFIERS: &[&str] = &[
    "very",
    "extremely",
    "really",
    "highly",
    "incredibly",
    "so",
    "too",
    "super",
    "most",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PolarityScores {
    /// In [-1, 1].
    pub polarity: f64,
    /// 0 is objective, 1 is subjective.
    pub subjectivity: f64,
}

fn opinion(word: &str) -> Option<(f64, f64)> {
    OPINION_WORDS
        .iter()
        .find(|(w, _, _)| *w == word)
        .map(|(_, p, s)| (*p, *s))
}

pub fn polarity(text: &str) -> PolarityScores {
    let words: Vec<String> = text
        .split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'')
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect();

    let mut scored = Vec::new();
    for (i, word) in words.iter().enumerate() {
        let Some((mut p, mut s)) = opinion(word) else {
            continue;
        };
        let previous = i.checked_sub(1).map(|j| words[j].as_str());
        if previous.is_some_and(|w| INTENSIFIERS.contains(&w)) {
            p = (p * INTENSIFIER_SCALE).clamp(-1.0, 1.0);
            s = (s * INTENSIFIER_SCALE).min(1.0);
        }
        let negated = (1..=2)
            .filter_map(|d| i.checked_sub(d))
            .any(|j| is_negation(&words[j]));
        if negated {
            p *= NEGATION_SCALE;
        }
        scored.push((p, s));
    }

    if scored.is_empty() {
        return PolarityScores::default();
    }
    let n = scored.len() as f64;
    PolarityScores {
        polarity: scored.iter().map(|(p, _)| p).sum::<f64>() / n,
        subjectivity: scored.iter().map(|(_, s)| s).sum::<f64>() / n,
    }
}
