use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::posting::{DocId, Posting, PostingLine, TermId};
use crate::term_table::TermTable;

/// In-memory inverted index for one block of documents, built up by
/// `add_document` and flushed sorted by term_id.
#[derive(Default)]
pub struct Block {
    // term_id -> postings for this block only, built in arrival order and
    // sorted just before flushing.
    postings: BTreeMap<TermId, Vec<Posting>>,
}

impl Block {
    pub fn new() -> Self {
        Block {
            postings: BTreeMap::new(),
        }
    }

    /// Folds one document's weighted term vector into this block, assigning
    /// term ids from `terms` as new terms are encountered.
    pub fn add_document(&mut self, doc_id: DocId, vector: &std::collections::HashMap<String, f64>, terms: &mut TermTable) {
        for (term, &weight) in vector {
            let term_id = terms.id_for(term);
            self.postings
                .entry(term_id)
                .or_insert_with(Vec::new)
                .push(Posting::new(doc_id, weight));
        }
    }

    /// Writes this block to `path`, one line per term_id in ascending order.
    /// `BTreeMap` already iterates in key order, so no extra sort is needed.
    pub fn flush(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        for (&term_id, postings) in &self.postings {
            let mut postings = postings.clone();
            postings.sort_by_key(|p| p.doc_id);
            let line = PostingLine { term_id, postings };
            writer.write_all(line.render().as_bytes())?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Deterministic numbered path for block `id` inside `scratch_dir`, e.g.
/// `block000`.
pub fn block_path(scratch_dir: &Path, id: u32) -> PathBuf {
    scratch_dir.join(format!("block{:03}", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn flush_writes_terms_in_id_order() {
        let mut terms = TermTable::new();
        let mut block = Block::new();

        let mut cat_doc: HashMap<String, f64> = HashMap::new();
        cat_doc.insert("cat".to_string(), 1.0);
        block.add_document(1, &cat_doc, &mut terms);

        let mut dog_doc: HashMap<String, f64> = HashMap::new();
        dog_doc.insert("dog".to_string(), 1.0);
        block.add_document(2, &dog_doc, &mut terms);

        let dir = tempdir().unwrap();
        let path = block_path(dir.path(), 0);
        block.flush(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert!(lines.next().unwrap().starts_with("0 1,1"));
        assert!(lines.next().unwrap().starts_with("1 2,1"));
    }
}
