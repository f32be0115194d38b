use std::path::PathBuf;

use thiserror::Error;

/// Failures that make an input document unusable. These abort the run.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("document not found: {}", .0.display())]
    Missing(PathBuf),

    #[error("failed to read {}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not a valid OCR document", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("page range {first}..={last} does not fit a document with {pages} page(s)")]
    PageRange {
        first: usize,
        last: usize,
        pages: usize,
    },

    #[error("no year given and the document does not carry one")]
    MissingYear,
}
