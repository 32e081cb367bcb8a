//! Stopwords and sentiment lexicon for the qualitative detector.
//!
//! Resources are a plain value handed to the detector at construction, so
//! tests and callers can swap in their own lists or run without any.

use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Positive,
    Negative,
}

#[derive(Debug, Clone, Default)]
pub struct TextResources {
    stopwords: HashSet<String>,
    lexicon: HashMap<String, Polarity>,
}

const ENGLISH_STOPWORDS: &[&str] = &[
    "a", "about", "after", "all", "also", "am", "an", "and", "any", "are", "as", "at", "be",
    "because", "been", "before", "being", "but", "by", "can", "could", "did", "do", "does",
    "doing", "for", "from", "had", "has", "have", "having", "he", "her", "here", "him", "his",
    "how", "i", "if", "in", "into", "is", "it", "its", "just", "me", "more", "most", "my", "no",
    "not", "of", "on", "once", "only", "or", "other", "our", "out", "over", "own", "same", "she",
    "so", "some", "such", "than", "that", "the", "their", "them", "then", "there", "these",
    "they", "this", "those", "through", "to", "too", "under", "until", "up", "very", "was", "we",
    "were", "what", "when", "where", "which", "while", "who", "whom", "why", "will", "with",
    "would", "you", "your",
];

const POSITIVE_WORDS: &[&str] = &[
    "amazing", "appreciate", "awesome", "best", "better", "clear", "comfortable", "easy",
    "efficient", "enjoy", "enjoyed", "excellent", "fantastic", "fast", "friendly", "glad",
    "good", "great", "happy", "helpful", "impressed", "love", "loved", "nice", "perfect",
    "pleasant", "quick", "recommend", "reliable", "satisfied", "smooth", "supportive",
    "thank", "thanks", "useful", "valuable", "welcoming", "wonderful",
];

const NEGATIVE_WORDS: &[&str] = &[
    "angry", "annoying", "awful", "bad", "broken", "confusing", "delay", "delayed",
    "difficult", "disappointed", "disappointing", "dislike", "expensive", "frustrated",
    "frustrating", "hard", "hate", "horrible", "issue", "issues", "lacking", "late", "poor",
    "problem", "problems", "rude", "slow", "terrible", "unclear", "unhappy", "unhelpful",
    "unreliable", "useless", "worse", "worst", "wrong",
];

impl TextResources {
    /// Built-in English stopwords and a small general-purpose lexicon.
    pub fn english() -> Self {
        let lexicon = POSITIVE_WORDS
            .iter()
            .map(|w| (w.to_string(), Polarity::Positive))
            .chain(
                NEGATIVE_WORDS
                    .iter()
                    .map(|w| (w.to_string(), Polarity::Negative)),
            )
            .collect();
        Self {
            stopwords: ENGLISH_STOPWORDS.iter().map(|w| w.to_string()).collect(),
            lexicon,
        }
    }

    /// No stopwords and no lexicon.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(
        stopwords: impl IntoIterator<Item = String>,
        lexicon: impl IntoIterator<Item = (String, Polarity)>,
    ) -> Self {
        Self {
            stopwords: stopwords.into_iter().map(|w| w.to_lowercase()).collect(),
            lexicon: lexicon
                .into_iter()
                .map(|(w, p)| (w.to_lowercase(), p))
                .collect(),
        }
    }

    pub fn is_stopword(&self, token: &str) -> bool {
        self.stopwords.contains(token)
    }

    pub fn polarity(&self, token: &str) -> Option<Polarity> {
        self.lexicon.get(token).copied()
    }

    pub fn has_lexicon(&self) -> bool {
        !self.lexicon.is_empty()
    }

    pub fn lexicon_size(&self) -> usize {
        self.lexicon.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_resources() {
        let resources = TextResources::english();
        assert!(resources.is_stopword("the"));
        assert!(!resources.is_stopword("onboarding"));
        assert_eq!(resources.polarity("great"), Some(Polarity::Positive));
        assert_eq!(resources.polarity("slow"), Some(Polarity::Negative));
        assert_eq!(resources.polarity("table"), None);
        assert!(resources.has_lexicon());
    }

    #[test]
    fn test_empty_resources() {
        let resources = TextResources::empty();
        assert!(!resources.is_stopword("the"));
        assert!(!resources.has_lexicon());
    }

    #[test]
    fn test_custom_resources_are_lowercased() {
        let resources = TextResources::new(
            vec!["Le".to_string()],
            vec![("Bon".to_string(), Polarity::Positive)],
        );
        assert!(resources.is_stopword("le"));
        assert_eq!(resources.polarity("bon"), Some(Polarity::Positive));
        assert_eq!(resources.lexicon_size(), 1);
    }
}
