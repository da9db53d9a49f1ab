use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use vsmsearch::config::IndexArgs;
use vsmsearch::{Error, Indexer};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = IndexArgs::parse();

    let scratch = match &args.scratch_dir {
        Some(dir) => {
            if let Err(e) = std::fs::create_dir_all(dir) {
                eprintln!("error: could not create scratch directory: {}", e);
                return ExitCode::from(2);
            }
            None
        }
        None => match tempfile::tempdir() {
            Ok(dir) => Some(dir),
            Err(e) => {
                eprintln!("error: could not create scratch directory: {}", e);
                return ExitCode::from(2);
            }
        },
    };

    let scratch_path = args
        .scratch_dir
        .as_deref()
        .unwrap_or_else(|| scratch.as_ref().unwrap().path());

    let indexer = Indexer::new(args.block_size);
    match indexer.build(&args.input_dir, &args.dict_out, &args.postings_out, scratch_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e @ (Error::EmptyCollection { .. } | Error::BadDocId { .. })) => {
            eprintln!("error: {}", e);
            eprintln!(
                "usage: index -i <input_dir> -d <dict_out> -p <postings_out> [--block-size N] [--scratch-dir DIR]"
            );
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
