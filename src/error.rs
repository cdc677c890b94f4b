use std::path::PathBuf;

/// Failures of the layers around the lifter: loading documents and pipeline
/// configs. Lifting itself never fails.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid {what} ({origin}): {message}")]
    Decode {
        what: &'static str,
        origin: String,
        message: String,
    },

    #[error("invalid name pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("JSON pointer {pointer} selects nothing in {origin}")]
    Pointer { pointer: String, origin: String },

    #[error("jq filter failed on {origin}: {message}")]
    Jq { origin: String, message: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
