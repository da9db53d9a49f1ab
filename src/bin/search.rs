use std::fs;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use vsmsearch::config::SearchArgs;
use vsmsearch::Searcher;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = SearchArgs::parse();

    let searcher = match Searcher::open(&args.dict_in, &args.postings_in) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let queries_text = match fs::read_to_string(&args.queries_in) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: could not read {}: {}", args.queries_in.display(), e);
            return ExitCode::FAILURE;
        }
    };
    let queries: Vec<String> = queries_text.lines().map(str::to_string).collect();

    let results = match searcher.run(&queries) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = fs::write(&args.results_out, results.join("\n")) {
        eprintln!("error: could not write {}: {}", args.results_out.display(), e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
