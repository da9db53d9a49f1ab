use std::cell::RefCell;
use std::fs::File;
use std::path::Path;
use std::rc::Rc;

use tracing::debug;

use crate::boolean;
use crate::dictionary::Dictionary;
use crate::error::Result;
use crate::posting::DocId;
use crate::ranked;
use crate::tokenizer::{TextAdapter, Tokenizer};

/// Holds the loaded dictionary and a shared handle on the postings file,
/// and dispatches each query line to the Boolean or ranked evaluator.
pub struct Searcher<T: Tokenizer> {
    adapter: TextAdapter<T>,
    dictionary: Dictionary,
    postings_file: Rc<RefCell<File>>,
}

impl Searcher<crate::tokenizer::UnicodeWordTokenizer> {
    pub fn open(dict_path: &Path, postings_path: &Path) -> Result<Self> {
        let dictionary = Dictionary::load(dict_path)?;
        let postings_file = Rc::new(RefCell::new(File::open(postings_path)?));
        Ok(Searcher {
            adapter: TextAdapter::english(),
            dictionary,
            postings_file,
        })
    }
}

impl<T: Tokenizer> Searcher<T> {
    /// Evaluates one query line, choosing the Boolean or ranked evaluator
    /// based on whether it contains literal operator tokens.
    pub fn search(&self, query: &str) -> Result<Vec<DocId>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }
        if boolean::looks_boolean(query) {
            debug!(query, evaluator = "boolean", "evaluating query");
            boolean::evaluate(query, &self.adapter, &self.dictionary, &self.postings_file)
        } else {
            debug!(query, evaluator = "ranked", "evaluating query");
            ranked::evaluate(query, &self.adapter, &self.dictionary, &self.postings_file)
        }
    }

    /// Evaluates every line of `queries` and writes space-separated doc_id
    /// results to `results_out`, one line per query, no trailing newline
    /// after the final line.
    pub fn run(&self, queries: &[String]) -> Result<Vec<String>> {
        let mut out = Vec::with_capacity(queries.len());
        for query in queries {
            let ids = match self.search(query) {
                Ok(ids) => ids,
                Err(e) => {
                    tracing::warn!(query, error = %e, "query failed, emitting empty result");
                    Vec::new()
                }
            };
            let rendered = ids
                .iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
                .join(" ");
            out.push(rendered);
        }
        Ok(out)
    }
}
