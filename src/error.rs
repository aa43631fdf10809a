use thiserror::Error;

/// Failures while reading and validating an import file.
///
/// None of these touch the current store; the user can simply retry.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Error reading file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid file format: {0}")]
    Parse(String),

    #[error("Invalid data format: {0}")]
    Validation(String),
}

/// Failures of the persistent key-value store or of the data kept in it.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage io error for key `{key}`: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("stored data under key `{key}` is corrupt: {reason}")]
    Corrupt { key: String, reason: String },

    #[error("failed to serialize meals: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("No data to import. Please select a file first.")]
    NothingToImport,

    #[error("no {slot} entry logged for {date}")]
    NotFound { date: String, slot: String },
}
