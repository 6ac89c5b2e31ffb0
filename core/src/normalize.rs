//! Pluggable token normalization.

use lazy_static::lazy_static;
use rust_stemmers::{Algorithm, Stemmer};
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
}

/// Maps a raw token to its canonical term form.
///
/// Implementations must be pure: the same input always yields the same output.
pub trait Normalizer: Send + Sync {
    fn normalize(&self, token: &str) -> String;
}

impl<F> Normalizer for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn normalize(&self, token: &str) -> String {
        self(token)
    }
}

/// NFKC folding followed by lowercasing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lowercase;

impl Normalizer for Lowercase {
    fn normalize(&self, token: &str) -> String {
        token.nfkc().collect::<String>().to_lowercase()
    }
}

/// [`Lowercase`] followed by the English Snowball stemmer.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishStemmer;

impl Normalizer for EnglishStemmer {
    fn normalize(&self, token: &str) -> String {
        let lowered = Lowercase.normalize(token);
        STEMMER.stem(&lowered).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercase_folds_compatibility_forms() {
        assert_eq!(Lowercase.normalize("HeLLo"), "hello");
        // fullwidth latin letters fold under NFKC
        assert_eq!(Lowercase.normalize("ＡＢＣ"), "abc");
    }

    #[test]
    fn stemmer_lowercases_first() {
        assert_eq!(EnglishStemmer.normalize("Running"), "run");
        assert_eq!(EnglishStemmer.normalize("cats"), "cat");
    }

    #[test]
    fn closures_are_normalizers() {
        let upper = |t: &str| t.to_uppercase();
        assert_eq!(upper.normalize("abc"), "ABC");
    }
}
