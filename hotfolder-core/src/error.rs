//! Error types for hotfolder-core.

use thiserror::Error;

/// Errors raised while parsing domain values.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The action column of an audit record is not a known action.
    #[error("unknown action '{0}'")]
    UnknownAction(String),

    /// An audit line does not have the `<date> <time> <ACTION> <path>` shape.
    #[error("malformed audit record: {0:?}")]
    MalformedRecord(String),

    /// The timestamp columns of an audit line failed to parse.
    #[error("invalid audit timestamp in {line:?}: {source}")]
    InvalidTimestamp {
        line: String,
        #[source]
        source: chrono::ParseError,
    },
}
