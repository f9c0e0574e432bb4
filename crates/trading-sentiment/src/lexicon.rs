//! Rule-based valence scoring.
//!
//! Each known word carries a valence in roughly [-4, 4]. Word scores are
//! adjusted for preceding boosters and negations, capitalised emphasis and
//! a contrastive "but", then summed and squashed into a compound score in
//! [-1, 1]. The positive/negative/neutral shares describe how much of the
//! text carried each polarity.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const BOOSTER_INCREMENT: f64 = 0.293;
const CAPS_INCREMENT: f64 = 0.733;
const NEGATION_SCALAR: f64 = -0.74;
const EXCLAMATION_INCREMENT: f64 = 0.292;
const QUESTION_INCREMENT: f64 = 0.18;
const MAX_QUESTION_EMPHASIS: f64 = 0.96;
/// Normalization constant for the compound score.
const ALPHA: f64 = 15.0;

/// General-purpose market and news vocabulary.
const BASE_LEXICON: &[(&str, f64)] = &[
    ("good", 1.9),
    ("great", 3.1),
    ("excellent", 2.7),
    ("amazing", 2.8),
    ("awesome", 3.1),
    ("best", 3.2),
    ("better", 1.9),
    ("positive", 2.6),
    ("strong", 2.3),
    ("stronger", 2.1),
    ("gain", 2.4),
    ("gains", 2.1),
    ("growth", 1.6),
    ("grow", 1.8),
    ("grows", 1.8),
    ("profit", 1.9),
    ("profits", 1.9),
    ("win", 2.8),
    ("wins", 2.7),
    ("winning", 2.4),
    ("success", 2.7),
    ("successful", 2.8),
    ("successfully", 2.2),
    ("record", 1.1),
    ("rally", 2.0),
    ("rallies", 2.0),
    ("surge", 1.8),
    ("surges", 1.8),
    ("soar", 2.2),
    ("soars", 2.2),
    ("jump", 1.2),
    ("jumps", 1.2),
    ("rise", 1.3),
    ("rises", 1.3),
    ("boost", 1.7),
    ("boosts", 1.7),
    ("recover", 1.6),
    ("recovery", 1.4),
    ("rebound", 1.3),
    ("approve", 2.2),
    ("approves", 2.2),
    ("approved", 1.8),
    ("approval", 2.2),
    ("accept", 1.6),
    ("accepts", 1.6),
    ("support", 1.7),
    ("supports", 1.7),
    ("partnership", 1.5),
    ("upgrade", 1.5),
    ("optimistic", 2.3),
    ("optimism", 2.5),
    ("confidence", 2.3),
    ("confident", 2.2),
    ("opportunity", 1.8),
    ("innovation", 1.6),
    ("innovative", 1.7),
    ("secure", 1.4),
    ("safe", 1.9),
    ("benefit", 2.0),
    ("benefits", 1.6),
    ("happy", 2.7),
    ("love", 3.2),
    ("like", 1.5),
    ("welcome", 2.0),
    ("welcomes", 1.9),
    ("celebrate", 2.7),
    ("bad", -2.5),
    ("worse", -2.1),
    ("worst", -3.1),
    ("terrible", -2.1),
    ("awful", -2.0),
    ("negative", -2.7),
    ("weak", -1.9),
    ("weaker", -1.9),
    ("loss", -1.3),
    ("losses", -1.7),
    ("lose", -1.7),
    ("loses", -1.3),
    ("lost", -1.3),
    ("fall", -1.1),
    ("falls", -1.1),
    ("drop", -1.1),
    ("drops", -1.1),
    ("decline", -1.1),
    ("declines", -1.1),
    ("slump", -2.0),
    ("slumps", -2.0),
    ("tumble", -1.7),
    ("tumbles", -1.7),
    ("sink", -1.5),
    ("sinks", -1.5),
    ("collapse", -2.7),
    ("collapses", -2.7),
    ("fear", -2.2),
    ("fears", -1.8),
    ("panic", -2.3),
    ("risk", -1.1),
    ("risks", -1.1),
    ("risky", -1.4),
    ("warning", -1.4),
    ("warns", -0.4),
    ("threat", -2.4),
    ("threatens", -2.0),
    ("concern", -1.2),
    ("concerns", -1.2),
    ("worry", -1.9),
    ("worries", -1.9),
    ("uncertainty", -1.4),
    ("volatile", -1.1),
    ("ban", -2.6),
    ("bans", -2.6),
    ("banned", -2.0),
    ("reject", -1.7),
    ("rejects", -1.7),
    ("rejected", -2.3),
    ("lawsuit", -1.8),
    ("sue", -1.6),
    ("sues", -1.6),
    ("investigation", -1.1),
    ("crackdown", -1.9),
    ("penalty", -2.0),
    ("fine", 0.8),
    ("fined", -1.5),
    ("bankruptcy", -2.5),
    ("bankrupt", -2.6),
    ("default", -1.5),
    ("exploit", -1.5),
    ("exploited", -2.0),
    ("vulnerability", -1.6),
    ("breach", -1.8),
    ("stolen", -2.2),
    ("steal", -2.2),
    ("theft", -2.5),
    ("attack", -2.1),
    ("attacked", -2.0),
    ("fail", -2.5),
    ("fails", -1.8),
    ("failed", -2.3),
    ("failure", -2.3),
    ("problem", -1.7),
    ("problems", -1.7),
    ("trouble", -1.8),
    ("crisis", -3.1),
    ("recession", -2.1),
    ("sell-off", -1.4),
    ("selloff", -1.4),
    ("losing", -1.6),
    ("plummet", -2.4),
    ("plummets", -2.4),
    ("warned", -1.2),
    ("delay", -1.3),
    ("delayed", -1.2),
    ("hate", -2.7),
    ("sad", -2.1),
    ("angry", -2.3),
];

/// Crypto-market vocabulary layered over the base lexicon.
pub const CRYPTO_LEXICON: &[(&str, f64)] = &[
    ("moon", 3.0),
    ("mooning", 3.0),
    ("bullish", 2.5),
    ("pump", 2.0),
    ("hodl", 1.5),
    ("adoption", 2.0),
    ("institutional", 2.0),
    ("halving", 1.5),
    ("defi", 1.0),
    ("breakout", 2.0),
    ("dump", -3.0),
    ("crash", -3.0),
    ("scam", -3.0),
    ("hack", -3.0),
    ("bearish", -2.5),
    ("plunge", -2.5),
    ("fraud", -3.0),
    ("bubble", -2.0),
    ("fud", -1.5),
    ("rekt", -2.5),
];

const BOOSTERS_UP: &[&str] = &[
    "absolutely",
    "amazingly",
    "completely",
    "considerably",
    "decidedly",
    "deeply",
    "enormously",
    "entirely",
    "especially",
    "exceptionally",
    "extremely",
    "greatly",
    "highly",
    "hugely",
    "incredibly",
    "intensely",
    "majorly",
    "massively",
    "more",
    "most",
    "particularly",
    "purely",
    "quite",
    "really",
    "remarkably",
    "so",
    "substantially",
    "thoroughly",
    "totally",
    "tremendously",
    "unbelievably",
    "utterly",
    "very",
];

const BOOSTERS_DOWN: &[&str] = &[
    "almost",
    "barely",
    "hardly",
    "less",
    "little",
    "marginally",
    "occasionally",
    "partly",
    "scarcely",
    "slightly",
    "somewhat",
];

const NEGATIONS: &[&str] = &[
    "aint", "arent", "cannot", "cant", "couldnt", "didnt", "doesnt", "dont", "hadnt", "hasnt",
    "havent", "isnt", "neither", "never", "no", "nobody", "none", "nor", "not", "nothing",
    "nowhere", "shouldnt", "wasnt", "werent", "without", "wont", "wouldnt",
];

pub(crate) fn is_negation(word: &str) -> bool {
    NEGATIONS.contains(&word) || word.ends_with("n't")
}

/// Valence shares and the normalized compound score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ValenceScores {
    pub neg: f64,
    pub neu: f64,
    pub pos: f64,
    /// In [-1, 1].
    pub compound: f64,
}

#[derive(Debug, Clone)]
pub struct LexiconAnalyzer {
    lexicon: HashMap<String, f64>,
}

impl Default for LexiconAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl LexiconAnalyzer {
    /// Base vocabulary with the crypto terms applied on top.
    pub fn new() -> Self {
        let mut analyzer = Self {
            lexicon: BASE_LEXICON
                .iter()
                .map(|(w, v)| (w.to_string(), *v))
                .collect(),
        };
        analyzer.extend(CRYPTO_LEXICON.iter().map(|(w, v)| (w.to_string(), *v)));
        analyzer
    }

    /// Add or override word valences.
    pub fn extend(&mut self, words: impl IntoIterator<Item = (String, f64)>) {
        for (word, valence) in words {
            self.lexicon.insert(word.to_lowercase(), valence);
        }
    }

    pub fn valence(&self, word: &str) -> Option<f64> {
        self.lexicon.get(word).copied()
    }

    pub fn polarity_scores(&self, text: &str) -> ValenceScores {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return ValenceScores::default();
        }
        let lowered: Vec<String> = tokens.iter().map(|t| t.to_lowercase()).collect();
        let caps_differ = caps_differential(&tokens);

        let mut sentiments: Vec<f64> = tokens
            .iter()
            .enumerate()
            .map(|(i, token)| self.word_valence(i, token, &tokens, &lowered, caps_differ))
            .collect();

        if let Some(but) = lowered.iter().position(|w| w == "but") {
            for (i, s) in sentiments.iter_mut().enumerate() {
                if i < but {
                    *s *= 0.5;
                } else if i > but {
                    *s *= 1.5;
                }
            }
        }

        score_valence(&sentiments, text)
    }

    fn word_valence(
        &self,
        i: usize,
        token: &str,
        tokens: &[&str],
        lowered: &[String],
        caps_differ: bool,
    ) -> f64 {
        let word = lowered[i].as_str();
        if booster_scalar(word).is_some() {
            return 0.0;
        }
        let Some(mut valence) = self.valence(word) else {
            return 0.0;
        };

        if caps_differ && is_all_caps(token) {
            valence += CAPS_INCREMENT * valence.signum();
        }

        let mut negated = false;
        for distance in 1..=3 {
            let Some(j) = i.checked_sub(distance) else {
                break;
            };
            let previous = lowered[j].as_str();
            if self.valence(previous).is_none() {
                if let Some(mut scalar) = booster_scalar(previous) {
                    if valence < 0.0 {
                        scalar = -scalar;
                    }
                    if caps_differ && is_all_caps(tokens[j]) {
                        scalar += CAPS_INCREMENT * valence.signum();
                    }
                    scalar *= match distance {
                        1 => 1.0,
                        2 => 0.95,
                        _ => 0.9,
                    };
                    valence += scalar;
                }
            }
            if is_negation(previous) {
                negated = true;
            }
        }
        if negated {
            valence *= NEGATION_SCALAR;
        }
        valence
    }
}

/// Words with surrounding punctuation removed; single characters dropped.
fn tokenize(text: &str) -> Vec<&str> {
    text.split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric() && c != '\''))
        .filter(|w| w.chars().count() > 1)
        .collect()
}

fn is_all_caps(token: &str) -> bool {
    token.chars().any(|c| c.is_alphabetic()) && token == token.to_uppercase()
}

/// Some, but not all, tokens are capitalised.
fn caps_differential(tokens: &[&str]) -> bool {
    let caps = tokens.iter().filter(|t| is_all_caps(t)).count();
    caps > 0 && caps < tokens.len()
}

fn booster_scalar(word: &str) -> Option<f64> {
    if BOOSTERS_UP.contains(&word) {
        Some(BOOSTER_INCREMENT)
    } else if BOOSTERS_DOWN.contains(&word) {
        Some(-BOOSTER_INCREMENT)
    } else {
        None
    }
}

fn punctuation_emphasis(text: &str) -> f64 {
    let exclamations = text.matches('!').count().min(4) as f64 * EXCLAMATION_INCREMENT;
    let questions = text.matches('?').count();
    let question_emphasis = match questions {
        0 | 1 => 0.0,
        2 | 3 => questions as f64 * QUESTION_INCREMENT,
        _ => MAX_QUESTION_EMPHASIS,
    };
    exclamations + question_emphasis
}

/// x / sqrt(x^2 + alpha), clamped to [-1, 1].
pub fn normalize(score: f64) -> f64 {
    (score / (score * score + ALPHA).sqrt()).clamp(-1.0, 1.0)
}

fn score_valence(sentiments: &[f64], text: &str) -> ValenceScores {
    if sentiments.is_empty() {
        return ValenceScores::default();
    }
    let emphasis = punctuation_emphasis(text);
    let mut total: f64 = sentiments.iter().sum();
    if total > 0.0 {
        total += emphasis;
    } else if total < 0.0 {
        total -= emphasis;
    }

    let mut pos_sum = 0.0;
    let mut neg_sum = 0.0;
    let mut neutral = 0.0;
    for s in sentiments {
        if *s > 0.0 {
            pos_sum += s + 1.0;
        } else if *s < 0.0 {
            neg_sum += s - 1.0;
        } else {
            neutral += 1.0;
        }
    }
    if pos_sum > neg_sum.abs() {
        pos_sum += emphasis;
    } else if pos_sum < neg_sum.abs() {
        neg_sum -= emphasis;
    }

    let denominator = pos_sum + neg_sum.abs() + neutral;
    ValenceScores {
        neg: (neg_sum / denominator).abs(),
        neu: neutral / denominator,
        pos: pos_sum / denominator,
        compound: if total == 0.0 { 0.0 } else { normalize(total) },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compound(text: &str) -> f64 {
        LexiconAnalyzer::new().polarity_scores(text).compound
    }

    #[test]
    fn test_single_word() {
        let scores = LexiconAnalyzer::new().polarity_scores("bitcoin is bullish");
        assert!((scores.compound - 2.5 / (2.5f64 * 2.5 + 15.0).sqrt()).abs() < 1e-10);
        assert!((scores.pos + scores.neu + scores.neg - 1.0).abs() < 1e-10);
        assert!((scores.neu - 2.0 / 5.5).abs() < 1e-10);
    }

    #[test]
    fn test_unknown_words_are_neutral() {
        let scores = LexiconAnalyzer::new().polarity_scores("the network processed blocks");
        assert!((scores.compound - 0.0).abs() < 1e-12);
        assert!((scores.neu - 1.0).abs() < 1e-12);
        assert_eq!(LexiconAnalyzer::new().polarity_scores(""), ValenceScores::default());
    }

    #[test]
    fn test_negation_flips() {
        assert!(compound("bitcoin is not bullish") < 0.0);
        assert!(compound("this isn't a scam") > 0.0);
    }

    #[test]
    fn test_boosters() {
        assert!(compound("very bullish") > compound("bullish"));
        assert!(compound("slightly bullish") < compound("bullish"));
        assert!(compound("very bearish") < compound("bearish"));
    }

    #[test]
    fn test_exclamation_and_caps() {
        assert!(compound("bullish!!!") > compound("bullish"));
        assert!(compound("bitcoin is BULLISH") > compound("bitcoin is bullish"));
        // all caps carries no differential emphasis
        assert!((compound("BITCOIN IS BULLISH") - compound("bitcoin is bullish")).abs() < 1e-12);
    }

    #[test]
    fn test_but_shifts_weight() {
        assert!(compound("good news but bad timing") < 0.0);
        assert!(compound("bad start but great finish") > 0.0);
    }

    #[test]
    fn test_crypto_terms_override() {
        let analyzer = LexiconAnalyzer::new();
        assert_eq!(analyzer.valence("crash"), Some(-3.0));
        assert_eq!(analyzer.valence("moon"), Some(3.0));
        let mut custom = LexiconAnalyzer::new();
        custom.extend([("Airdrop".to_string(), 1.2)]);
        assert_eq!(custom.valence("airdrop"), Some(1.2));
    }

    #[test]
    fn test_normalize_bounds() {
        assert!(normalize(1e6) <= 1.0);
        assert!(normalize(-1e6) >= -1.0);
        assert!((normalize(0.0) - 0.0).abs() < 1e-12);
    }
}
