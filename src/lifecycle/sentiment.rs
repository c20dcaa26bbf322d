//! Keyword sentiment over the end-of-call summary and transcript.
//!
//! A coarse keyword count, not language analysis. Keywords match whole words
//! only, and where phrases overlap the longest one wins, so "pas de problème"
//! counts once as positive rather than also as a complaint. Word lists cover
//! French and English calls.

use crate::domain::Sentiment;

const POSITIVE_WORDS: &[&str] = &[
    "satisfait",
    "satisfaite",
    "merci",
    "parfait",
    "excellent",
    "génial",
    "très bien",
    "ravi",
    "ravie",
    "pas de problème",
    "aucun problème",
    "thank",
    "thanks",
    "great",
    "perfect",
    "pleased",
    "no problem",
];

const NEGATIVE_WORDS: &[&str] = &[
    "mécontent",
    "mécontente",
    "problème",
    "problèmes",
    "pas intéressé",
    "pas intéressée",
    "annuler",
    "déçu",
    "déçue",
    "plainte",
    "not interested",
    "cancel",
    "problem",
    "problems",
    "complaint",
    "angry",
    "disappointed",
];

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Longest keyword at the head of `tokens`: its length in words and whether it is positive.
fn longest_match(tokens: &[String]) -> Option<(usize, bool)> {
    let keywords = POSITIVE_WORDS
        .iter()
        .map(|k| (k, true))
        .chain(NEGATIVE_WORDS.iter().map(|k| (k, false)));

    let mut best: Option<(usize, bool)> = None;
    for (keyword, positive) in keywords {
        let len = keyword.split(' ').count();
        if len > tokens.len() || best.is_some_and(|(longest, _)| longest >= len) {
            continue;
        }
        if keyword.split(' ').zip(tokens).all(|(k, t)| t.as_str() == k) {
            best = Some((len, positive));
        }
    }
    best
}

/// Classify the concatenation of `summary` and `transcript`.
pub fn classify(summary: Option<&str>, transcript: Option<&str>) -> Sentiment {
    let tokens = words(&format!("{} {}", summary.unwrap_or_default(), transcript.unwrap_or_default()));

    let (mut positive, mut negative) = (0usize, 0usize);
    let mut i = 0;
    while i < tokens.len() {
        match longest_match(&tokens[i..]) {
            Some((len, true)) => {
                positive += 1;
                i += len;
            }
            Some((len, false)) => {
                negative += 1;
                i += len;
            }
            None => i += 1,
        }
    }

    if positive > negative {
        Sentiment::Positive
    } else if negative > positive {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_french_positive_summary() {
        assert_eq!(
            classify(Some("Le client est très satisfait, merci"), None),
            Sentiment::Positive
        );
    }

    #[test]
    fn test_negative_transcript() {
        assert_eq!(
            classify(None, Some("User: I am not interested, please cancel")),
            Sentiment::Negative
        );
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(classify(Some("PARFAIT"), None), Sentiment::Positive);
    }

    #[test]
    fn test_tie_and_empty_are_neutral() {
        assert_eq!(classify(None, None), Sentiment::Neutral);
        assert_eq!(classify(Some("merci"), Some("problème")), Sentiment::Neutral);
        assert_eq!(classify(Some("Rappel demain"), None), Sentiment::Neutral);
    }

    #[test]
    fn test_matches_whole_words_only() {
        assert_eq!(classify(Some("Cancellation policy explained"), None), Sentiment::Neutral);
        assert_eq!(classify(Some("Problématique de livraison abordée"), None), Sentiment::Neutral);
        assert_eq!(classify(Some("Thankful for the callback"), None), Sentiment::Neutral);
    }

    #[test]
    fn test_reassuring_phrase_is_positive() {
        assert_eq!(classify(Some("Pas de problème, merci"), None), Sentiment::Positive);
        assert_eq!(classify(None, Some("User: no problem at all")), Sentiment::Positive);
    }

    #[test]
    fn test_punctuation_separates_words() {
        assert_eq!(classify(Some("Client déçu... veut annuler!"), None), Sentiment::Negative);
    }

    #[test]
    fn test_counts_occurrences() {
        assert_eq!(
            classify(Some("merci merci merci"), Some("un problème")),
            Sentiment::Positive
        );
    }
}
