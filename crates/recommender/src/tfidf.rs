//! TF-IDF vectorizer for product descriptions
//!
//! Documents are lowercased and split on anything that is not alphanumeric or
//! `_`; tokens shorter than two characters and stop words are dropped. Terms
//! are weighted by raw count times a smoothed inverse document frequency
//!
//! ```text
//! idf(t) = ln((1 + n) / (1 + df(t))) + 1
//! ```
//!
//! and every row is L2-normalized, so the dot product of two rows is their
//! cosine similarity.

use crate::stopwords::StopWords;
use ndarray::{Array1, Array2};
use std::collections::{BTreeMap, BTreeSet};

const MIN_TOKEN_CHARS: usize = 2;

/// Split text into lowercase word tokens
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| token.chars().count() >= MIN_TOKEN_CHARS)
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    stop_words: StopWords,
    /// Term to column index, in sorted term order
    vocabulary: BTreeMap<String, usize>,
    idf: Array1<f64>,
}

impl Default for TfidfVectorizer {
    fn default() -> Self {
        Self::new(StopWords::english())
    }
}

impl TfidfVectorizer {
    pub fn new(stop_words: StopWords) -> Self {
        Self {
            stop_words,
            vocabulary: BTreeMap::new(),
            idf: Array1::zeros(0),
        }
    }

    fn analyze(&self, document: &str) -> Vec<String> {
        tokenize(document)
            .into_iter()
            .filter(|token| !self.stop_words.contains(token))
            .collect()
    }

    /// Learn the vocabulary and idf weights, then return the normalized
    /// `documents × vocabulary` weight matrix.
    ///
    /// Documents without any surviving term produce an all-zero row.
    pub fn fit_transform<S: AsRef<str>>(&mut self, documents: &[S]) -> Array2<f64> {
        let analyzed: Vec<Vec<String>> = documents
            .iter()
            .map(|doc| self.analyze(doc.as_ref()))
            .collect();

        let mut doc_freq: BTreeMap<&str, usize> = BTreeMap::new();
        for tokens in &analyzed {
            let unique: BTreeSet<&str> = tokens.iter().map(String::as_str).collect();
            for term in unique {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        let n_docs = documents.len() as f64;
        self.vocabulary = doc_freq
            .keys()
            .enumerate()
            .map(|(idx, term)| (term.to_string(), idx))
            .collect();
        self.idf = doc_freq
            .values()
            .map(|&df| ((1.0 + n_docs) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        let mut matrix = Array2::<f64>::zeros((documents.len(), self.vocabulary.len()));
        for (row, tokens) in analyzed.iter().enumerate() {
            for token in tokens {
                if let Some(&col) = self.vocabulary.get(token) {
                    matrix[[row, col]] += 1.0;
                }
            }
        }

        for mut row in matrix.rows_mut() {
            row *= &self.idf;
            let norm = row.iter().map(|v| v * v).sum::<f64>().sqrt();
            if norm > 0.0 {
                row /= norm;
            }
        }

        matrix
    }

    pub fn vocabulary(&self) -> &BTreeMap<String, usize> {
        &self.vocabulary
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn idf(&self, term: &str) -> Option<f64> {
        self.vocabulary.get(term).map(|&idx| self.idf[idx])
    }
}
