use snafu::Snafu;
use std::path::PathBuf;

/// Crate-wide error type. Configuration problems are caller-visible and map
/// to exit code 2 in the binaries; everything else is an I/O or internal
/// invariant failure.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("could not read directory {}: {}", path.display(), source))]
    ReadDir {
        path: PathBuf,
        source: walkdir::Error,
    },

    #[snafu(display("could not read document {}: {}", path.display(), source))]
    ReadDocument {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("document filename {} is not a valid doc id", path.display()))]
    BadDocId { path: PathBuf },

    #[snafu(display("could not open {}: {}", path.display(), source))]
    OpenFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("could not write to {}: {}", path.display(), source))]
    WriteFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("io error: {}", source))]
    Io { source: std::io::Error },

    #[snafu(display("could not parse dictionary: {}", source))]
    DictionaryFormat { source: serde_json::Error },

    #[snafu(display("malformed postings line: {}", detail))]
    PostingsFormat { detail: String },

    #[snafu(display(
        "merge produced non-monotone doc_id sequence for term {}: {} >= {}",
        term_id,
        prev,
        next
    ))]
    MergeInvariant {
        term_id: u32,
        prev: u32,
        next: u32,
    },

    #[snafu(display("no documents found under {}", path.display()))]
    EmptyCollection { path: PathBuf },

    #[snafu(display("could not create scratch directory: {}", source))]
    ScratchDir { source: std::io::Error },
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io { source }
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Error::DictionaryFormat { source }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
