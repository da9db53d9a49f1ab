use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use tracing::info;
use walkdir::WalkDir;

use crate::block::{block_path, Block};
use crate::dictionary::build_dictionary;
use crate::error::{self, Result};
use crate::merge::merge_all;
use crate::posting::{DocId, Posting, PostingLine};
use crate::skip;
use crate::term_table::TermTable;
use crate::tokenizer::{TextAdapter, Tokenizer};

/// Orchestrates the full BSBI pipeline: enumerate documents, invert them in
/// blocks, merge blocks, add skip pointers, build the dictionary.
pub struct Indexer<T: Tokenizer> {
    adapter: TextAdapter<T>,
    block_size: usize,
}

impl Indexer<crate::tokenizer::UnicodeWordTokenizer> {
    pub fn new(block_size: usize) -> Self {
        Indexer {
            adapter: TextAdapter::english(),
            block_size,
        }
    }
}

impl<T: Tokenizer> Indexer<T> {
    /// Reads every document under `input_dir`, builds the index, and writes
    /// `dict_out`/`postings_out`. `scratch_dir` holds intermediate block
    /// files and is never touched again once this returns.
    pub fn build(
        &self,
        input_dir: &Path,
        dict_out: &Path,
        postings_out: &Path,
        scratch_dir: &Path,
    ) -> Result<()> {
        let docs = list_documents(input_dir)?;
        if docs.is_empty() {
            return Err(error::Error::EmptyCollection {
                path: input_dir.to_path_buf(),
            });
        }
        info!(doc_count = docs.len(), "enumerated documents");

        let mut terms = TermTable::new();
        let mut block_ids = Vec::new();
        let mut next_block_id: u32 = 0;
        let mut all_doc_ids: Vec<DocId> = Vec::with_capacity(docs.len());

        for chunk in docs.chunks(self.block_size) {
            let mut block = Block::new();
            for (doc_id, path) in chunk {
                all_doc_ids.push(*doc_id);
                let text = fs::read_to_string(path).map_err(|source| error::Error::ReadDocument {
                    path: path.clone(),
                    source,
                })?;
                let vector = self.adapter.doc_vector(&text);
                block.add_document(*doc_id, &vector, &mut terms);
            }
            let path = block_path(scratch_dir, next_block_id);
            block.flush(&path)?;
            info!(block_id = next_block_id, docs = chunk.len(), "flushed block");
            block_ids.push(next_block_id);
            next_block_id += 1;
        }

        let merged_path = merge_all(scratch_dir, block_ids, next_block_id)?;
        info!("merge complete");

        all_doc_ids.sort_unstable();
        let term_count = terms.len();
        augment_and_append_universal(&merged_path, postings_out, &all_doc_ids, term_count)?;

        let id_to_term = terms.id_to_term();
        let dictionary = build_dictionary(postings_out, &id_to_term, all_doc_ids.len() as u64)?;
        dictionary.save(dict_out)?;

        info!(
            doc_count = all_doc_ids.len(),
            term_count,
            "indexing complete"
        );
        Ok(())
    }
}

/// Enumerates top-level files in `input_dir` whose filename parses as a
/// doc_id, sorted ascending by that id (the ordering the rest of the
/// pipeline relies on for merge-by-concatenation to be valid).
fn list_documents(input_dir: &Path) -> Result<Vec<(DocId, PathBuf)>> {
    let mut docs = Vec::new();
    for entry in WalkDir::new(input_dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
    {
        let entry = entry.map_err(|source| error::Error::ReadDir {
            path: input_dir.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        let doc_id: DocId = name.parse().map_err(|_| error::Error::BadDocId {
            path: entry.path().to_path_buf(),
        })?;
        docs.push((doc_id, entry.path().to_path_buf()));
    }
    docs.sort_by_key(|(id, _)| *id);
    Ok(docs)
}

/// Reads the merged (but not yet skip-augmented) postings file, augments
/// every line, appends the synthetic `_universal` line, and writes the
/// result to `postings_out`.
fn augment_and_append_universal(
    merged_path: &Path,
    postings_out: &Path,
    all_doc_ids: &[DocId],
    term_count: u32,
) -> Result<()> {
    let reader = BufReader::new(File::open(merged_path)?);
    let mut writer = File::create(postings_out)?;

    for line in reader.lines() {
        let line = line?;
        let mut parsed = PostingLine::parse(&line)?;
        skip::augment(&mut parsed);
        writer.write_all(parsed.render().as_bytes())?;
    }

    let mut universal = PostingLine {
        term_id: term_count,
        postings: all_doc_ids.iter().map(|&id| Posting::new(id, 0.0)).collect(),
    };
    skip::augment(&mut universal);
    writer.write_all(universal.render().as_bytes())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::Dictionary;
    use tempfile::tempdir;

    fn write_doc(dir: &Path, id: u32, text: &str) {
        fs::write(dir.join(id.to_string()), text).unwrap();
    }

    #[test]
    fn builds_dictionary_and_postings_for_small_collection() {
        let docs_dir = tempdir().unwrap();
        write_doc(docs_dir.path(), 1, "cat cat fish");
        write_doc(docs_dir.path(), 2, "dog dog");
        write_doc(docs_dir.path(), 3, "cat dog");
        write_doc(docs_dir.path(), 4, "fish fish fish");

        let scratch = tempdir().unwrap();
        let dict_path = docs_dir.path().join("dictionary.json");
        let postings_path = docs_dir.path().join("postings.txt");

        let indexer = Indexer::new(2); // small block size to exercise merging
        indexer
            .build(docs_dir.path(), &dict_path, &postings_path, scratch.path())
            .unwrap();

        let dictionary = Dictionary::load(&dict_path).unwrap();
        assert!(dictionary.get("cat").is_some());
        assert!(dictionary.get("dog").is_some());
        assert!(dictionary.get("fish").is_some());
        assert!(dictionary.get("_universal").is_some());

        let contents = fs::read_to_string(&postings_path).unwrap();
        assert_eq!(contents.lines().count(), 4); // cat, dog, fish, _universal
    }

    #[test]
    fn rejects_empty_collection() {
        let docs_dir = tempdir().unwrap();
        let scratch = tempdir().unwrap();
        let indexer = Indexer::new(1000);
        let result = indexer.build(
            docs_dir.path(),
            &docs_dir.path().join("d"),
            &docs_dir.path().join("p"),
            scratch.path(),
        );
        assert!(result.is_err());
    }
}
