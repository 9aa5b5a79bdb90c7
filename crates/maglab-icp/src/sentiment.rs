//! Lightweight lexicon sentiment for comment snippets.
//!
//! Best-effort enrichment only: sentiment is stored on events for display
//! and never feeds into ICP scoring.

use maglab_core::Sentiment;

/// Word weights tuned for business/social-selling comment register.
///
/// Keys are lowercase single words. Values in `(0.0, 1.0]` are positive,
/// in `[-1.0, 0.0)` are negative. The summed score is clamped to `[-1.0, 1.0]`.
const LEXICON: &[(&str, f32)] = &[
    // Positive signals
    ("great", 0.4),
    ("good", 0.3),
    ("excellent", 0.5),
    ("amazing", 0.5),
    ("awesome", 0.5),
    ("love", 0.5),
    ("loved", 0.5),
    ("congrats", 0.5),
    ("congratulations", 0.5),
    ("helpful", 0.4),
    ("insightful", 0.4),
    ("interested", 0.4),
    ("agree", 0.3),
    ("thanks", 0.3),
    ("thank", 0.3),
    ("valuable", 0.4),
    ("brilliant", 0.5),
    ("inspiring", 0.4),
    ("excited", 0.4),
    ("win", 0.4),
    // Negative signals
    ("spam", -0.7),
    ("scam", -0.8),
    ("misleading", -0.6),
    ("wrong", -0.4),
    ("disagree", -0.4),
    ("bad", -0.4),
    ("terrible", -0.6),
    ("worst", -0.6),
    ("hate", -0.6),
    ("annoying", -0.5),
    ("useless", -0.6),
    ("boring", -0.4),
    ("overhyped", -0.5),
    ("clickbait", -0.6),
    ("nonsense", -0.5),
    ("unsubscribe", -0.4),
];

const POSITIVE_THRESHOLD: f32 = 0.15;
const NEGATIVE_THRESHOLD: f32 = -0.15;

/// Score a text string using the lexicon.
///
/// Splits text into lowercase words, sums matching weights, and clamps
/// the result to `[-1.0, 1.0]`. Returns `0.0` for empty or unknown text.
#[must_use]
fn lexicon_score(text: &str) -> f32 {
    let mut score = 0.0_f32;
    for word in text.split_whitespace() {
        let w = word
            .trim_matches(|c: char| !c.is_alphabetic())
            .to_lowercase();
        for &(lex_word, weight) in LEXICON {
            if w == lex_word {
                score += weight;
                break;
            }
        }
    }
    score.clamp(-1.0, 1.0)
}

/// Classify a comment snippet as positive/neutral/negative.
///
/// Thresholds sit at ±0.15 of the clamped lexicon sum; anything in between
/// — including empty or unrecognized text — is neutral.
#[must_use]
pub fn comment_sentiment(text: &str) -> Sentiment {
    let score = lexicon_score(text);
    if score > POSITIVE_THRESHOLD {
        Sentiment::Positive
    } else if score < NEGATIVE_THRESHOLD {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    }
}
