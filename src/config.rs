use std::path::PathBuf;

use clap::Parser;

/// Default number of documents per BSBI block.
pub const DEFAULT_BLOCK_SIZE: usize = 1000;

/// `index -i <dir> -d <dict_out> -p <postings_out> [--block-size N] [--scratch-dir DIR]`
#[derive(Debug, Parser)]
#[command(name = "index", about = "Build a dictionary and postings file from a document directory")]
pub struct IndexArgs {
    /// Directory of documents, each named after its integer doc_id.
    #[arg(short = 'i', long = "input")]
    pub input_dir: PathBuf,

    /// Output dictionary path.
    #[arg(short = 'd', long = "dict")]
    pub dict_out: PathBuf,

    /// Output postings path.
    #[arg(short = 'p', long = "postings")]
    pub postings_out: PathBuf,

    /// Documents per block before flushing to disk.
    #[arg(long = "block-size", default_value_t = DEFAULT_BLOCK_SIZE)]
    pub block_size: usize,

    /// Scratch directory for intermediate block files. Defaults to a fresh
    /// temporary directory removed when indexing finishes.
    #[arg(long = "scratch-dir")]
    pub scratch_dir: Option<PathBuf>,
}

/// `search -d <dict> -p <postings> -q <queries_in> -o <results_out>`
#[derive(Debug, Parser)]
#[command(name = "search", about = "Answer Boolean and ranked queries against a built index")]
pub struct SearchArgs {
    #[arg(short = 'd', long = "dict")]
    pub dict_in: PathBuf,

    #[arg(short = 'p', long = "postings")]
    pub postings_in: PathBuf,

    #[arg(short = 'q', long = "queries")]
    pub queries_in: PathBuf,

    #[arg(short = 'o', long = "output")]
    pub results_out: PathBuf,
}
