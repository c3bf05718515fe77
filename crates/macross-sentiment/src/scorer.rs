use std::collections::HashMap;

/// Maps text to a polarity in `[-1, 1]`.
pub trait PolarityScorer: Send + Sync {
    fn polarity(&self, text: &str) -> f64;
}

/// Rule-based scorer over a word lexicon.
///
/// Each lexicon hit contributes its weight, sign-flipped when directly
/// preceded by a negation and scaled by a preceding intensifier. The
/// polarity is the mean over hits, clamped to `[-1, 1]`; text without hits
/// is neutral (0.0).
pub struct LexiconScorer {
    words: HashMap<String, f64>,
    negations: Vec<&'static str>,
    intensifiers: HashMap<&'static str, f64>,
}

const POSITIVE: &[(&str, f64)] = &[
    ("beat", 0.6),
    ("beats", 0.6),
    ("boost", 0.5),
    ("bullish", 0.8),
    ("gain", 0.5),
    ("gains", 0.5),
    ("good", 0.7),
    ("great", 0.8),
    ("growth", 0.6),
    ("high", 0.3),
    ("jump", 0.6),
    ("jumps", 0.6),
    ("outperform", 0.7),
    ("profit", 0.6),
    ("rally", 0.7),
    ("record", 0.6),
    ("rise", 0.5),
    ("rises", 0.5),
    ("soar", 0.8),
    ("soars", 0.8),
    ("strong", 0.5),
    ("surge", 0.7),
    ("surges", 0.7),
    ("upgrade", 0.6),
    ("win", 0.6),
];

const NEGATIVE: &[(&str, f64)] = &[
    ("bad", -0.7),
    ("bearish", -0.8),
    ("concern", -0.5),
    ("concerns", -0.5),
    ("crash", -0.9),
    ("decline", -0.6),
    ("declines", -0.6),
    ("downgrade", -0.6),
    ("drop", -0.6),
    ("drops", -0.6),
    ("fall", -0.5),
    ("falls", -0.5),
    ("fear", -0.6),
    ("fears", -0.6),
    ("fraud", -0.9),
    ("lawsuit", -0.6),
    ("loss", -0.6),
    ("losses", -0.6),
    ("low", -0.3),
    ("miss", -0.6),
    ("misses", -0.6),
    ("plunge", -0.8),
    ("plunges", -0.8),
    ("risk", -0.4),
    ("slide", -0.5),
    ("slump", -0.7),
    ("weak", -0.5),
    ("worst", -1.0),
];

const NEGATIONS: &[&str] = &[
    "not", "no", "never", "cannot", "cant", "don't", "dont", "doesn't", "doesnt", "didn't",
    "didnt", "won't", "wont", "isn't", "isnt", "aren't", "arent", "wasn't", "wasnt", "hardly",
    "barely",
];

const INTENSIFIERS: &[(&str, f64)] = &[
    ("very", 1.3),
    ("extremely", 1.6),
    ("highly", 1.3),
    ("significantly", 1.3),
    ("sharply", 1.4),
    ("slightly", 0.5),
    ("somewhat", 0.7),
];

impl Default for LexiconScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl LexiconScorer {
    pub fn new() -> Self {
        let words = POSITIVE
            .iter()
            .chain(NEGATIVE)
            .map(|&(w, s)| (w.to_string(), s))
            .collect();
        Self {
            words,
            negations: NEGATIONS.to_vec(),
            intensifiers: INTENSIFIERS.iter().copied().collect(),
        }
    }

    /// Add or replace a lexicon entry.
    pub fn with_word(mut self, word: &str, weight: f64) -> Self {
        self.words.insert(word.to_lowercase(), weight.clamp(-1.0, 1.0));
        self
    }

    pub fn weight(&self, word: &str) -> Option<f64> {
        self.words.get(&word.to_lowercase()).copied()
    }

    fn is_negation(&self, word: &str) -> bool {
        self.negations.iter().any(|n| *n == word)
    }
}

impl PolarityScorer for LexiconScorer {
    fn polarity(&self, text: &str) -> f64 {
        let mut hits: Vec<f64> = Vec::new();
        let mut negate = false;
        let mut scale = 1.0;

        for token in tokens(text) {
            if self.is_negation(&token) {
                negate = true;
                continue;
            }
            if let Some(&mult) = self.intensifiers.get(token.as_str()) {
                scale = mult;
                continue;
            }
            if let Some(&weight) = self.words.get(&token) {
                let signed = if negate { -weight } else { weight };
                hits.push(signed * scale);
            }
            negate = false;
            scale = 1.0;
        }

        if hits.is_empty() {
            return 0.0;
        }
        (hits.iter().sum::<f64>() / hits.len() as f64).clamp(-1.0, 1.0)
    }
}

/// Lowercased words with surrounding punctuation stripped.
fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'')
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
}
