//! Lexical sentiment tagging for candidate turns.
//!
//! Keyword scoring with a short negation window. Deterministic, no external call,
//! advisory only: the engine records the label but never branches on it.

use crate::screening::models::Sentiment;

const POSITIVE_WORDS: &[&str] = &[
    "good", "great", "excellent", "awesome", "amazing", "love", "loved", "like", "enjoy",
    "enjoyed", "happy", "glad", "excited", "exciting", "fantastic", "wonderful", "confident",
    "passionate", "interesting", "interested", "fun", "nice", "perfect", "thanks", "thank",
    "appreciate", "comfortable", "proud", "successful", "success", "easy", "best", "sure",
    "absolutely", "definitely", "eager", "keen",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bad", "terrible", "awful", "hate", "hated", "dislike", "boring", "bored", "annoying",
    "annoyed", "frustrated", "frustrating", "difficult", "hard", "confused", "confusing",
    "unsure", "worried", "nervous", "anxious", "stressed", "stressful", "angry", "sad", "upset",
    "disappointed", "poor", "worst", "struggle", "struggled", "struggling", "fail", "failed",
    "problem", "problems", "unfortunately", "sorry", "weak",
];

const NEGATORS: &[&str] = &[
    "not", "no", "never", "dont", "don't", "doesnt", "doesn't", "didnt", "didn't", "isnt",
    "isn't", "wasnt", "wasn't", "cant", "can't", "cannot", "wont", "won't", "hardly",
];

/// How many following tokens a negator flips.
const NEGATION_WINDOW: usize = 2;

/// Classifies an utterance. Empty or whitespace-only input is `Neutral`.
pub fn classify(utterance: &str) -> Sentiment {
    let lowered = utterance.to_lowercase();
    let tokens: Vec<&str> = lowered
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|t| !t.is_empty())
        .collect();

    let mut score: i32 = 0;
    let mut negate_remaining = 0usize;

    for token in tokens {
        if NEGATORS.contains(&token) {
            negate_remaining = NEGATION_WINDOW;
            continue;
        }

        let polarity = if POSITIVE_WORDS.contains(&token) {
            1
        } else if NEGATIVE_WORDS.contains(&token) {
            -1
        } else {
            0
        };

        if polarity != 0 {
            score += if negate_remaining > 0 { -polarity } else { polarity };
            negate_remaining = 0;
        } else {
            negate_remaining = negate_remaining.saturating_sub(1);
        }
    }

    match score {
        s if s > 0 => Sentiment::Positive,
        s if s < 0 => Sentiment::Negative,
        _ => Sentiment::Neutral,
    }
}
