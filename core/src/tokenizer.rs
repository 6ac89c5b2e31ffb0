use crate::config::{PositionCounting, TokenizerConfig};
use crate::normalize::{EnglishStemmer, Lowercase, Normalizer};
use anyhow::{Context, Result};
use regex::Regex;
use std::sync::Arc;

/// Splits text on a delimiter pattern, normalizes each piece and keeps the
/// pieces that pass the admission rule, together with their positions.
#[derive(Clone)]
pub struct Tokenizer {
    delimiters: Regex,
    normalizer: Arc<dyn Normalizer>,
    min_term_len: usize,
    max_term_len: usize,
    positions: PositionCounting,
}

impl std::fmt::Debug for Tokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tokenizer")
            .field("delimiters", &self.delimiters.as_str())
            .field("min_term_len", &self.min_term_len)
            .field("max_term_len", &self.max_term_len)
            .field("positions", &self.positions)
            .finish_non_exhaustive()
    }
}

impl Tokenizer {
    /// Build a tokenizer whose normalizer is chosen by `config.stem`.
    pub fn new(config: &TokenizerConfig) -> Result<Self> {
        let normalizer: Arc<dyn Normalizer> = if config.stem {
            Arc::new(EnglishStemmer)
        } else {
            Arc::new(Lowercase)
        };
        Self::with_normalizer(config, normalizer)
    }

    pub fn with_normalizer(config: &TokenizerConfig, normalizer: Arc<dyn Normalizer>) -> Result<Self> {
        let delimiters = Regex::new(&config.delimiters)
            .with_context(|| format!("invalid delimiter pattern {:?}", config.delimiters))?;
        Ok(Self {
            delimiters,
            normalizer,
            min_term_len: config.min_term_len,
            max_term_len: config.max_term_len,
            positions: config.positions,
        })
    }

    /// Tokenize text into admitted `(term, position)` pairs, positions strictly increasing.
    pub fn tokenize(&self, text: &str) -> Vec<(String, usize)> {
        let mut terms = Vec::new();
        let mut pos = 0usize;
        for raw in self.delimiters.split(text) {
            match self.admit(raw) {
                Some(term) => {
                    terms.push((term, pos));
                    pos += 1;
                }
                None => {
                    tracing::trace!(token = raw, "discarding token");
                    if self.positions == PositionCounting::AllTokens {
                        pos += 1;
                    }
                }
            }
        }
        terms
    }

    /// Normalize one raw token and return it if it is admissible.
    pub fn admit(&self, raw: &str) -> Option<String> {
        let term = self.normalizer.normalize(raw);
        self.is_admissible(&term).then_some(term)
    }

    /// Admission rule for an already-normalized term.
    pub fn is_admissible(&self, term: &str) -> bool {
        if term.is_empty() {
            return false;
        }
        let len = term.chars().count();
        len >= self.min_term_len && len < self.max_term_len && !is_numeric(term)
    }
}

/// True when the whole token reads as a number, e.g. `42`, `3.14`, `-1e5`,
/// or consists only of digits from any script, e.g. `١٢٣`.
pub fn is_numeric(token: &str) -> bool {
    if token.parse::<f64>().is_ok() {
        return true;
    }
    !token.is_empty() && token.chars().all(char::is_numeric)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenizer() -> Tokenizer {
        Tokenizer::new(&TokenizerConfig::default()).unwrap()
    }

    #[test]
    fn basic_tokenize() {
        let t = tokenizer().tokenize("the cat sat on the mat");
        let cat = t.iter().find(|(w, _)| w == "cat").unwrap();
        assert_eq!(cat.1, 1);
        let mat = t.iter().find(|(w, _)| w == "mat").unwrap();
        assert_eq!(mat.1, 5);
    }

    #[test]
    fn length_bounds() {
        let t = tokenizer();
        assert!(!t.is_admissible("a"));
        assert!(t.is_admissible("ab"));
        assert!(t.is_admissible("abcdefghi"));
        assert!(!t.is_admissible("abcdefghij"));
        assert!(!t.is_admissible(""));
    }

    #[test]
    fn numbers_are_rejected() {
        let t = tokenizer();
        for n in ["42", "2012", "3.14", "1e5", "-7", "inf", "nan"] {
            assert!(!t.is_admissible(n), "{n} should be rejected");
        }
        // Arabic-Indic and Devanagari digits
        assert!(!t.is_admissible("١٢٣"));
        assert!(!t.is_admissible("४२"));
        assert!(t.tokenize("page ١٢٣ ends").iter().all(|(w, _)| w != "١٢٣"));
        assert!(t.is_admissible("b52"));
        assert!(t.is_admissible("3d"));
    }

    #[test]
    fn discarded_tokens_consume_positions() {
        let t = tokenizer().tokenize("a quick 12 fox");
        assert_eq!(t, vec![("quick".to_string(), 1), ("fox".to_string(), 3)]);
    }

    #[test]
    fn admitted_only_positions_leave_no_gaps() {
        let config = TokenizerConfig { positions: PositionCounting::AdmittedOnly, ..Default::default() };
        let t = Tokenizer::new(&config).unwrap().tokenize("a quick 12 fox");
        assert_eq!(t, vec![("quick".to_string(), 0), ("fox".to_string(), 1)]);
    }

    #[test]
    fn custom_delimiters() {
        let config = TokenizerConfig { delimiters: ";".into(), ..Default::default() };
        let t = Tokenizer::new(&config).unwrap().tokenize("new york;los angeles");
        let words: Vec<&str> = t.iter().map(|(w, _)| w.as_str()).collect();
        assert_eq!(words, vec!["new york"]);
    }

    #[test]
    fn stemming_happens_before_admission() {
        let config = TokenizerConfig { stem: true, ..Default::default() };
        let t = Tokenizer::new(&config).unwrap();
        // eleven chars, stems to "connect"
        assert_eq!(t.admit("Connections"), Some("connect".to_string()));
        assert_eq!(tokenizer().admit("Connections"), None);
    }
}
