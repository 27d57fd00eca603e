//! Per-program similarity index and question answering.
//!
//! Retrieval is purely lexical: every fragment becomes a sparse tf-idf
//! vector over unigram and bigram features, the question is projected into
//! the same space, and cosine similarity ranks the fragments. The weighting
//! model is pinned for reproducibility: Unicode word tokens of length >= 2,
//! smoothed idf `ln((1 + n) / (1 + df)) + 1`, a 90% document-frequency cap,
//! and L2-normalized vectors.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, instrument};

use progscout_shared::TextFragment;

/// Fragments scoring at or below this cosine similarity are discarded.
/// The floor is exclusive: a score of exactly this value does not survive.
pub const SIMILARITY_FLOOR: f32 = 0.08;

/// Number of ranked fragments considered per question.
pub const DEFAULT_TOP_K: usize = 5;

/// A term enters the vocabulary only if it appears in at most this share
/// of the fragments.
const MAX_DF_RATIO: f32 = 0.9;

/// How many surviving fragments are concatenated into the answer text.
const ANSWER_FRAGMENTS: usize = 2;

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("valid regex"));

// ---------------------------------------------------------------------------
// AnswerOutcome
// ---------------------------------------------------------------------------

/// Outcome of answering one question against a program's index.
///
/// "No data" and "out of domain" are valid results the caller renders as
/// fallback messages, not errors.
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerOutcome {
    /// The question matched indexed content.
    Answered {
        /// Top two surviving fragments, joined with a single space.
        text: String,
        /// All surviving fragments in rank order, for citation.
        sources: Vec<String>,
    },
    /// The program has no indexed fragments at all.
    NoData,
    /// Nothing scored above the similarity floor.
    OutOfDomain,
}

// ---------------------------------------------------------------------------
// SimilarityIndex
// ---------------------------------------------------------------------------

/// Tf-idf index over one program's text fragments. Built from a corpus
/// snapshot and read-only afterwards; rebuilt, never patched, when the
/// fragment list changes.
#[derive(Debug, Clone)]
pub struct SimilarityIndex {
    /// Feature string -> feature id, ids assigned in sorted term order so
    /// identical corpora build identical vocabularies.
    vocabulary: HashMap<String, usize>,
    /// Smoothed inverse document frequency per feature id.
    idf: Vec<f32>,
    /// One L2-normalized sparse vector per fragment, in fragment order.
    vectors: Vec<HashMap<usize, f32>>,
    /// Fragment texts, kept for answer extraction.
    fragments: Vec<String>,
}

impl SimilarityIndex {
    /// Build the index over a fragment list. An empty list yields an index
    /// that answers every question with [`AnswerOutcome::NoData`].
    #[instrument(skip_all, fields(fragments = fragments.len()))]
    pub fn build(fragments: &[TextFragment]) -> Self {
        let texts: Vec<String> = fragments.iter().map(|f| f.as_str().to_owned()).collect();
        let docs: Vec<Vec<String>> = texts.iter().map(|text| features(text)).collect();
        let n = docs.len();

        let mut df: HashMap<&str, usize> = HashMap::new();
        for doc in &docs {
            let unique: HashSet<&str> = doc.iter().map(String::as_str).collect();
            for term in unique {
                *df.entry(term).or_default() += 1;
            }
        }

        // Sorted terms give stable feature ids across builds. A term in
        // more than MAX_DF_RATIO of the fragments carries no signal and is
        // dropped; with a single fragment this empties the vocabulary.
        let mut terms: Vec<&str> = df
            .iter()
            .filter(|&(_, &count)| count as f32 <= MAX_DF_RATIO * n as f32)
            .map(|(&term, _)| term)
            .collect();
        terms.sort_unstable();

        let vocabulary: HashMap<String, usize> = terms
            .iter()
            .enumerate()
            .map(|(id, term)| ((*term).to_owned(), id))
            .collect();
        let idf: Vec<f32> = terms
            .iter()
            .map(|term| ((1.0 + n as f32) / (1.0 + df[*term] as f32)).ln() + 1.0)
            .collect();
        let vectors: Vec<HashMap<usize, f32>> = docs
            .iter()
            .map(|doc| project(doc, &vocabulary, &idf))
            .collect();

        debug!(vocabulary = vocabulary.len(), "similarity index built");
        Self {
            vocabulary,
            idf,
            vectors,
            fragments: texts,
        }
    }

    /// Answer a free-text question from the indexed fragments.
    ///
    /// The question is projected into the index's vector space and scored
    /// against every fragment. The top `top_k` fragments are kept, anything
    /// at or below [`SIMILARITY_FLOOR`] is discarded, and the top two
    /// survivors joined with a single space form the answer text. All
    /// survivors are returned as sources in rank order.
    pub fn answer(&self, question: &str, top_k: usize) -> AnswerOutcome {
        if self.fragments.is_empty() {
            return AnswerOutcome::NoData;
        }

        let query = project(&features(question), &self.vocabulary, &self.idf);
        let ranked = self.rank(&query, top_k);
        let surviving = shortlist(&ranked);
        if surviving.is_empty() {
            debug!(best = ?ranked.first(), "no fragment above the similarity floor");
            return AnswerOutcome::OutOfDomain;
        }

        let text = surviving
            .iter()
            .take(ANSWER_FRAGMENTS)
            .map(|&position| self.fragments[position].as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let sources = surviving
            .iter()
            .map(|&position| self.fragments[position].clone())
            .collect();
        AnswerOutcome::Answered { text, sources }
    }

    /// Number of indexed fragments.
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// The `top_k` best-scoring fragment positions with their similarities,
    /// best first. Ties break toward the earlier fragment so equal-scoring
    /// answers keep page order.
    fn rank(&self, query: &HashMap<usize, f32>, top_k: usize) -> Vec<(usize, f32)> {
        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(position, vector)| (position, dot(query, vector)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        scored.truncate(top_k);
        scored
    }
}

// ---------------------------------------------------------------------------
// Feature extraction and vector math
// ---------------------------------------------------------------------------

/// Lowercased unigrams plus space-joined adjacent bigrams.
fn features(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let tokens: Vec<&str> = TOKEN_RE.find_iter(&lower).map(|m| m.as_str()).collect();
    let mut features: Vec<String> = tokens.iter().map(|t| (*t).to_owned()).collect();
    for pair in tokens.windows(2) {
        features.push(format!("{} {}", pair[0], pair[1]));
    }
    features
}

/// Tf-idf projection of a feature list into an L2-normalized sparse vector.
/// Features outside the vocabulary contribute nothing.
fn project(
    terms: &[String],
    vocabulary: &HashMap<String, usize>,
    idf: &[f32],
) -> HashMap<usize, f32> {
    let mut vector: HashMap<usize, f32> = HashMap::new();
    for term in terms {
        if let Some(&id) = vocabulary.get(term) {
            *vector.entry(id).or_default() += 1.0;
        }
    }
    for (id, weight) in vector.iter_mut() {
        *weight *= idf[*id];
    }

    let norm = vector.values().map(|w| w * w).sum::<f32>().sqrt();
    if norm > 0.0 {
        for weight in vector.values_mut() {
            *weight /= norm;
        }
    }
    vector
}

/// Ranked positions that survive the similarity floor, rank order kept.
/// Exactly [`SIMILARITY_FLOOR`] does not survive.
fn shortlist(ranked: &[(usize, f32)]) -> Vec<usize> {
    ranked
        .iter()
        .filter(|(_, score)| *score > SIMILARITY_FLOOR)
        .map(|(position, _)| *position)
        .collect()
}

/// Dot product of two sparse vectors; cosine similarity when both sides
/// are L2-normalized.
fn dot(a: &HashMap<usize, f32>, b: &HashMap<usize, f32>) -> f32 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small
        .iter()
        .filter_map(|(id, weight)| large.get(id).map(|other| weight * other))
        .sum()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
