//! Communication feature extraction for model inference.
//!
//! Turns raw message text into the four numeric features the communication
//! model was trained on. The keyword lists and the sentiment lexicon are
//! part of the trained-model contract: serving must score text against the
//! same fixed lists the training corpus used, or the model silently
//! receives out-of-distribution inputs.

use crate::types::CommunicationFeatures;

/// Urgency keyword set shared with training. The urgency score is the
/// fraction of this set present in the lowercased message.
const URGENCY_KEYWORDS: [&str; 12] = [
    "immediately",
    "urgent",
    "verify",
    "block",
    "click",
    "suspend",
    "kyc",
    "otp",
    "password",
    "confirm",
    "alert",
    "update",
];

/// Subset of phrases whose presence marks a message as manipulative.
const MANIPULATION_KEYWORDS: [&str; 6] = ["verify", "otp", "confirm", "suspend", "blocked", "click"];

/// Scored in place of empty or missing message text so the downstream
/// numeric fields are always defined.
pub const EMPTY_TEXT_PLACEHOLDER: &str = "no communication found";

/// Fixed polarity lexicon shared with training.
const POSITIVE_WORDS: [&str; 16] = [
    "good",
    "great",
    "thanks",
    "thank",
    "happy",
    "pleased",
    "welcome",
    "glad",
    "love",
    "appreciate",
    "excellent",
    "wonderful",
    "helpful",
    "congratulations",
    "enjoy",
    "best",
];

const NEGATIVE_WORDS: [&str; 16] = [
    "bad",
    "sorry",
    "problem",
    "issue",
    "unfortunately",
    "suspended",
    "unauthorized",
    "warning",
    "failure",
    "failed",
    "loss",
    "angry",
    "scam",
    "threat",
    "penalty",
    "terrible",
];

/// Deterministic, pure extractor: same text in, same features out.
pub struct FeatureExtractor;

impl FeatureExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract communication features from raw message text. Never fails:
    /// empty input is scored as [`EMPTY_TEXT_PLACEHOLDER`].
    pub fn extract(&self, raw_text: &str) -> CommunicationFeatures {
        let text = if raw_text.trim().is_empty() {
            EMPTY_TEXT_PLACEHOLDER
        } else {
            raw_text
        };
        let lowered = text.to_lowercase();

        let matched = URGENCY_KEYWORDS
            .iter()
            .filter(|kw| lowered.contains(*kw))
            .count();
        let urgency_score = matched as f64 / URGENCY_KEYWORDS.len() as f64;

        let is_manipulative = u8::from(
            MANIPULATION_KEYWORDS
                .iter()
                .any(|kw| lowered.contains(*kw)),
        );

        let sentiment_score = sentiment_polarity(&lowered);

        CommunicationFeatures::new(sentiment_score, urgency_score, is_manipulative)
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Lexicon polarity in [-1, 1]: (positive hits - negative hits) over all
/// sentiment-bearing tokens; 0 when the text carries no lexicon words.
fn sentiment_polarity(lowered: &str) -> f64 {
    let mut positive = 0usize;
    let mut negative = 0usize;

    for token in lowered.split(|c: char| !c.is_alphanumeric()) {
        if token.is_empty() {
            continue;
        }
        if POSITIVE_WORDS.contains(&token) {
            positive += 1;
        } else if NEGATIVE_WORDS.contains(&token) {
            negative += 1;
        }
    }

    let total = positive + negative;
    if total == 0 {
        return 0.0;
    }
    (positive as f64 - negative as f64) / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urgency_is_the_matched_fraction_of_the_keyword_set() {
        let extractor = FeatureExtractor::new();
        let comm = extractor.extract("URGENT: please verify your account");
        // "urgent" and "verify" out of 12 keywords, rounded to 4 places.
        assert_eq!(comm.urgency_score, 0.1667);
    }

    #[test]
    fn manipulation_flag_fires_on_the_fixed_subset() {
        let extractor = FeatureExtractor::new();
        assert_eq!(extractor.extract("enter the otp now").is_manipulative, 1);
        assert_eq!(extractor.extract("see you at lunch").is_manipulative, 0);
    }

    #[test]
    fn empty_text_scores_the_placeholder() {
        let extractor = FeatureExtractor::new();
        let comm = extractor.extract("");
        let placeholder = extractor.extract(EMPTY_TEXT_PLACEHOLDER);
        assert_eq!(comm, placeholder);
        assert_eq!(comm.urgency_score, 0.0);
        assert_eq!(comm.sentiment_score, 0.0);
        assert_eq!(comm.is_manipulative, 0);
        assert_eq!(comm.communication_score, 0.0);

        let whitespace = extractor.extract("   \n\t");
        assert_eq!(whitespace, placeholder);
    }

    #[test]
    fn sentiment_is_signed_and_bounded() {
        let extractor = FeatureExtractor::new();
        let positive = extractor.extract("thanks, great service, very happy");
        assert!(positive.sentiment_score > 0.0);
        assert!(positive.sentiment_score <= 1.0);

        let negative = extractor.extract("terrible problem, account suspended, sorry");
        assert!(negative.sentiment_score < 0.0);
        assert!(negative.sentiment_score >= -1.0);
    }

    #[test]
    fn extraction_is_deterministic() {
        let extractor = FeatureExtractor::new();
        let text = "urgent: unauthorized login, verify your password immediately";
        assert_eq!(extractor.extract(text), extractor.extract(text));
    }

    #[test]
    fn composite_matches_the_fixed_formula() {
        let extractor = FeatureExtractor::new();
        let comm = extractor.extract("please confirm this urgent update");
        let expected = 0.6 * comm.urgency_score
            + 0.3 * comm.sentiment_score
            + 0.1 * f64::from(comm.is_manipulative);
        assert!((comm.communication_score - expected).abs() < 1e-4);
    }
}
