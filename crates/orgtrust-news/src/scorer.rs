//! Domain-specific lexicon scorer for business trust sentiment.

/// Domain-specific word weights.
///
/// Keys are lowercase single words. Values in `(0.0, 1.0]` are positive,
/// in `[-1.0, 0.0)` are negative. The final score is clamped to `[-1.0, 1.0]`.
pub(crate) const LEXICON: &[(&str, f32)] = &[
    // Positive signals
    ("award", 0.5),
    ("awarded", 0.5),
    ("expansion", 0.4),
    ("expands", 0.4),
    ("growth", 0.4),
    ("profit", 0.4),
    ("profitable", 0.4),
    ("partnership", 0.4),
    ("contract", 0.3),
    ("hires", 0.3),
    ("hiring", 0.3),
    ("launch", 0.3),
    ("launches", 0.3),
    ("milestone", 0.4),
    ("investment", 0.3),
    ("funding", 0.3),
    ("certified", 0.4),
    ("innovative", 0.3),
    ("record", 0.3),
    ("wins", 0.5),
    // Negative signals
    ("bankruptcy", -0.8),
    ("bankrupt", -0.8),
    ("insolvency", -0.8),
    ("liquidation", -0.7),
    ("fraud", -0.8),
    ("scam", -0.8),
    ("lawsuit", -0.5),
    ("sued", -0.5),
    ("scandal", -0.6),
    ("fine", -0.3),
    ("fined", -0.4),
    ("penalty", -0.4),
    ("investigation", -0.4),
    ("investigated", -0.4),
    ("recall", -0.6),
    ("layoffs", -0.5),
    ("closure", -0.5),
    ("closes", -0.4),
    ("default", -0.5),
    ("violation", -0.5),
];

/// Score a text string using the domain lexicon.
///
/// Splits text into lowercase words, sums matching weights, and clamps
/// the result to `[-1.0, 1.0]`. Returns `0.0` for empty or unknown text.
#[must_use]
pub fn lexicon_score(text: &str) -> f32 {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_returns_zero() {
        assert_eq!(lexicon_score(""), 0.0);
    }

    #[test]
    fn unknown_text_returns_zero() {
        assert_eq!(lexicon_score("the quick brown fox"), 0.0);
    }

    #[test]
    fn positive_keyword_returns_positive() {
        let score = lexicon_score("local firm wins industry award");
        assert!(score > 0.0, "expected positive score, got {score}");
    }

    #[test]
    fn negative_keyword_returns_negative() {
        let score = lexicon_score("company files for bankruptcy");
        assert!(score < 0.0, "expected negative score, got {score}");
    }

    #[test]
    fn mixed_text_returns_intermediate() {
        let score = lexicon_score("record growth overshadowed by lawsuit");
        // record (+0.3) + growth (+0.4) + lawsuit (-0.5) = +0.2
        assert!(
            score > -1.0 && score < 1.0,
            "expected intermediate score, got {score}"
        );
    }

    #[test]
    fn score_clamps_to_positive_one() {
        let text = "award expansion growth profit partnership milestone certified wins";
        assert_eq!(lexicon_score(text), 1.0);
    }

    #[test]
    fn score_clamps_to_negative_one() {
        let text = "bankruptcy fraud lawsuit scandal recall layoffs insolvency";
        assert_eq!(lexicon_score(text), -1.0);
    }

    #[test]
    fn punctuation_stripped_from_words() {
        let score = lexicon_score("bankruptcy!");
        assert!(score < 0.0, "expected negative score, got {score}");
    }
}
