use crate::DocId;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed caller input, e.g. an unknown search mode name.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unknown document id {0}")]
    UnknownDocument(DocId),

    /// The persisted index could not be trusted; rebuild it from source documents.
    #[error("corrupt persisted state: {0}")]
    CorruptPersistedState(String),

    /// Rejected before any index state was touched.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
