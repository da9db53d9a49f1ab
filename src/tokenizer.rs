use std::collections::HashMap;

use rust_stemmers::{Algorithm, Stemmer};
use unicode_segmentation::UnicodeSegmentation;

/// Splits raw text into word-shaped tokens. Kept as a trait so the rest of
/// the pipeline doesn't care whether segmentation comes from
/// `unicode-segmentation` or something else.
pub trait Tokenizer {
    fn tokenize(&self, text: &str) -> Vec<String>;
}

/// Unicode word boundary tokenizer. `unicode_words()` already drops
/// whitespace and most punctuation for us.
pub struct UnicodeWordTokenizer;

impl Tokenizer for UnicodeWordTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        text.unicode_words().map(|w| w.to_string()).collect()
    }
}

/// Combines a [`Tokenizer`] with a Porter stemmer to turn raw text into the
/// normalized term stream used by both indexing and querying. Indexing and
/// querying must never disagree on normalization, so both route through the
/// same `process`.
pub struct TextAdapter<T: Tokenizer> {
    tokenizer: T,
    stemmer: Stemmer,
}

impl TextAdapter<UnicodeWordTokenizer> {
    pub fn english() -> Self {
        TextAdapter {
            tokenizer: UnicodeWordTokenizer,
            stemmer: Stemmer::create(Algorithm::English),
        }
    }
}

impl<T: Tokenizer> TextAdapter<T> {
    /// Tokenize, drop non-alphanumeric tokens, stem, lowercase.
    pub fn process(&self, text: &str) -> Vec<String> {
        self.tokenizer
            .tokenize(text)
            .into_iter()
            .filter(|tok| !tok.is_empty() && tok.chars().all(char::is_alphanumeric))
            .map(|tok| self.stemmer.stem(&tok).to_lowercase())
            .collect()
    }

    /// Computes the lnc-weighted, cosine-normalized document vector for one
    /// document's text: term -> weight.
    pub fn doc_vector(&self, text: &str) -> HashMap<String, f64> {
        let mut tf: HashMap<String, u32> = HashMap::new();
        for term in self.process(text) {
            *tf.entry(term).or_insert(0) += 1;
        }

        let mut weights: HashMap<String, f64> = tf
            .into_iter()
            .map(|(term, count)| (term, 1.0 + (count as f64).log10()))
            .collect();

        let norm = weights.values().map(|w| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for w in weights.values_mut() {
                *w /= norm;
            }
        }
        weights
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_punctuation_and_stems() {
        let adapter = TextAdapter::english();
        let tokens = adapter.process("Cats, cats, and dogs-running!");
        assert!(tokens.contains(&"cat".to_string()));
        assert!(tokens.contains(&"dog".to_string()));
        assert!(tokens.contains(&"run".to_string()));
        assert!(tokens.iter().all(|t| t.chars().all(|c| c.is_lowercase() || c.is_numeric())));
    }

    #[test]
    fn doc_vector_is_cosine_normalized() {
        let adapter = TextAdapter::english();
        let vector = adapter.doc_vector("cat cat dog");
        let norm: f64 = vector.values().map(|w| w * w).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-9);
    }

    #[test]
    fn empty_text_yields_empty_vector() {
        let adapter = TextAdapter::english();
        assert!(adapter.doc_vector("").is_empty());
    }

    proptest::proptest! {
        #[test]
        fn doc_vector_always_unit_norm_or_empty(
            words in proptest::collection::vec("[a-z]{1,8}", 0..30),
        ) {
            let adapter = TextAdapter::english();
            let text = words.join(" ");
            let vector = adapter.doc_vector(&text);
            if vector.is_empty() {
                proptest::prop_assert!(words.is_empty());
            } else {
                let norm: f64 = vector.values().map(|w| w * w).sum::<f64>().sqrt();
                proptest::prop_assert!((norm - 1.0).abs() < 1e-9);
            }
        }
    }
}
