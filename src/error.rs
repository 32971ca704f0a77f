use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in {}: {}", .path.display(), .source)]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unexpected shape in {}: expected {}", .path.display(), .expected)]
    UnexpectedShape { path: PathBuf, expected: &'static str },
}
