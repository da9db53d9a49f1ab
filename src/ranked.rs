use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::rc::Rc;

use crate::cursor::{FileCursor, PostingCursor};
use crate::dictionary::Dictionary;
use crate::error::Result;
use crate::posting::DocId;
use crate::tokenizer::TextAdapter;

const TOP_K: usize = 10;

/// Wraps an `f64` score so it can sit in a `BinaryHeap` ordered by score,
/// highest first, ties favoring the smaller doc_id. `f64` has no total order
/// in general (NaN), but scores here are always finite sums of finite
/// products, so `partial_cmp` always succeeds.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ScoredDoc {
    score: f64,
    doc_id: DocId,
}

impl Eq for ScoredDoc {}

impl PartialOrd for ScoredDoc {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScoredDoc {
    fn cmp(&self, other: &Self) -> Ordering {
        // Higher score is Ord-greater, so `BinaryHeap::pop()` yields the
        // highest score first. Ties favor the smaller doc_id, so it must
        // also be Ord-greater on equal scores.
        self.score
            .partial_cmp(&other.score)
            .unwrap_or(Ordering::Equal)
            .then(self.doc_id.cmp(&other.doc_id).reverse())
    }
}

/// Computes the ltc query weight vector: logarithmic term frequency, idf
/// weighting, cosine-normalized. Terms absent from the dictionary are
/// dropped before this is called.
fn ltc_weights(query_terms: &[String], dictionary: &Dictionary) -> HashMap<String, f64> {
    let mut tf: HashMap<String, u32> = HashMap::new();
    for term in query_terms {
        *tf.entry(term.clone()).or_insert(0) += 1;
    }

    let mut weights: HashMap<String, f64> = tf
        .into_iter()
        .map(|(term, count)| {
            let l = 1.0 + (count as f64).log10();
            let idf = dictionary.get(&term).map(|e| e.idf).unwrap_or(0.0);
            (term, l * idf)
        })
        .collect();

    let norm = weights.values().map(|w| w * w).sum::<f64>().sqrt();
    if norm > 0.0 {
        for w in weights.values_mut() {
            *w /= norm;
        }
    }
    weights
}

/// Evaluates a free-text ranked query and returns up to the top 10 doc ids
/// in descending score order, ties broken by smaller doc_id.
pub fn evaluate<T: crate::tokenizer::Tokenizer>(
    query: &str,
    adapter: &TextAdapter<T>,
    dictionary: &Dictionary,
    postings_file: &Rc<RefCell<std::fs::File>>,
) -> Result<Vec<DocId>> {
    let tokens: Vec<String> = adapter
        .process(query)
        .into_iter()
        .filter(|t| dictionary.get(t).is_some())
        .collect();

    if tokens.is_empty() {
        return Ok(Vec::new());
    }

    let query_weights = ltc_weights(&tokens, dictionary);

    let mut scores: HashMap<DocId, f64> = HashMap::new();
    let mut seen_terms: Vec<&String> = Vec::new();
    for term in &tokens {
        if seen_terms.contains(&term) {
            continue;
        }
        seen_terms.push(term);
        let w_q = query_weights[term];
        let entry = dictionary.get(term).expect("filtered to present terms");
        let end = crate::cursor::line_end(postings_file, entry.offset)?;
        let mut cursor = FileCursor::new(Rc::clone(postings_file), entry.offset, end)?;
        while let Some(doc_id) = cursor.value() {
            // Ranked scoring never uses skip pointers: every posting on the
            // line contributes to the accumulator, so it's a plain scan.
            let weight = cursor.weight().expect("value() returned Some");
            *scores.entry(doc_id).or_insert(0.0) += weight * w_q;
            cursor.advance()?;
        }
    }

    Ok(top_k(scores))
}

fn top_k(scores: HashMap<DocId, f64>) -> Vec<DocId> {
    let mut heap: BinaryHeap<ScoredDoc> = scores
        .into_iter()
        .map(|(doc_id, score)| ScoredDoc { score, doc_id })
        .collect();

    // `heap.pop()` yields the highest score first (ties: smaller doc_id
    // first), already in final ranked order.
    let mut best: Vec<ScoredDoc> = Vec::new();
    while best.len() < TOP_K {
        match heap.pop() {
            Some(sd) => best.push(sd),
            None => break,
        }
    }
    best.into_iter().map(|sd| sd.doc_id).collect()
}
