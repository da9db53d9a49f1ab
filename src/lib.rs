pub mod block;
pub mod boolean;
pub mod config;
pub mod cursor;
pub mod dictionary;
pub mod error;
pub mod indexer;
pub mod merge;
pub mod posting;
pub mod ranked;
pub mod searcher;
pub mod skip;
pub mod term_table;
pub mod tokenizer;

pub use error::{Error, Result};
pub use indexer::Indexer;
pub use searcher::Searcher;
