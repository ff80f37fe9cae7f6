use thiserror::Error;

/// Fatal errors. Per-row problems (unresolved names, misaligned upgrade cells) are
/// carried as data on the record and never surface here.
#[derive(Error, Debug)]
pub enum StarforgeError {
    #[error("failed to read lookup table '{path}': {source}")]
    LookupRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse lookup table '{path}': {source}")]
    LookupParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid lookup table '{path}': {message}")]
    LookupShape { path: String, message: String },

    #[error("malformed tournament header: {0}")]
    MalformedHeader(String),

    #[error("tournament header is missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("failed to read tournament file '{path}': {source}")]
    TournamentRead {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("failed to read workbook '{path}': {message}")]
    Workbook { path: String, message: String },

    #[error("converted fleet file '{path}' has no '{column}' column")]
    ConvertedColumn { path: String, column: &'static str },

    #[error("failed to write '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("invalid config '{path}': {message}")]
    Config { path: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StarforgeError>;
