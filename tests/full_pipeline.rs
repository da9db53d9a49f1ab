use std::fs;

use tempfile::tempdir;
use vsmsearch::{Indexer, Searcher};

fn build(docs: &[(u32, &str)]) -> (tempfile::TempDir, std::path::PathBuf, std::path::PathBuf) {
    let docs_dir = tempdir().unwrap();
    for (id, text) in docs {
        fs::write(docs_dir.path().join(id.to_string()), text).unwrap();
    }
    let scratch = tempdir().unwrap();
    let dict_path = docs_dir.path().join("dictionary.json");
    let postings_path = docs_dir.path().join("postings.txt");
    Indexer::new(1000)
        .build(docs_dir.path(), &dict_path, &postings_path, scratch.path())
        .unwrap();
    (docs_dir, dict_path, postings_path)
}

const COLLECTION: &[(u32, &str)] = &[
    (1, "cat cat fish"),
    (2, "dog dog"),
    (3, "cat dog"),
    (4, "fish fish fish"),
];

#[test]
fn boolean_queries_match_propositional_semantics() {
    let (_docs, dict, postings) = build(COLLECTION);
    let searcher = Searcher::open(&dict, &postings).unwrap();

    assert_eq!(searcher.search("cat AND dog").unwrap(), vec![3]);
    assert_eq!(searcher.search("cat OR dog").unwrap(), vec![1, 2, 3]);
    assert_eq!(searcher.search("NOT cat").unwrap(), vec![2, 4]);
    assert_eq!(searcher.search("cat AND NOT dog").unwrap(), vec![1]);
    assert_eq!(
        searcher.search("(cat OR dog) AND NOT fish").unwrap(),
        vec![2, 3]
    );
}

#[test]
fn ranked_single_term_query_favors_higher_weight_doc() {
    let (_docs, dict, postings) = build(COLLECTION);
    let searcher = Searcher::open(&dict, &postings).unwrap();

    // doc 4 mentions "fish" three times (still normalized to weight 1.0,
    // since it's the only term in that doc); doc 1 mentions it once
    // alongside "cat", so doc 1's fish weight is diluted by the second
    // term. The single-term query should rank doc 4 first.
    let ranked = searcher.search("fish").unwrap();
    assert_eq!(ranked.first(), Some(&4));
}

#[test]
fn idempotent_rebuild_produces_identical_files() {
    let docs_dir = tempdir().unwrap();
    for (id, text) in COLLECTION {
        fs::write(docs_dir.path().join(id.to_string()), text).unwrap();
    }

    let out1 = tempdir().unwrap();
    let scratch1 = tempdir().unwrap();
    let dict_path = out1.path().join("dictionary.json");
    let postings_path = out1.path().join("postings.txt");
    Indexer::new(1000)
        .build(docs_dir.path(), &dict_path, &postings_path, scratch1.path())
        .unwrap();

    let out2 = tempdir().unwrap();
    let scratch2 = tempdir().unwrap();
    let dict_path2 = out2.path().join("dictionary.json");
    let postings_path2 = out2.path().join("postings.txt");
    Indexer::new(1000)
        .build(docs_dir.path(), &dict_path2, &postings_path2, scratch2.path())
        .unwrap();

    assert_eq!(
        fs::read_to_string(&postings_path).unwrap(),
        fs::read_to_string(&postings_path2).unwrap()
    );
    assert_eq!(
        fs::read_to_string(&dict_path).unwrap(),
        fs::read_to_string(&dict_path2).unwrap()
    );
}

#[test]
fn empty_collection_is_rejected() {
    let docs_dir = tempdir().unwrap();
    let scratch = tempdir().unwrap();
    let result = Indexer::new(1000).build(
        docs_dir.path(),
        &docs_dir.path().join("d"),
        &docs_dir.path().join("p"),
        scratch.path(),
    );
    assert!(result.is_err());
}
