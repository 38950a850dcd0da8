/// Errors surfaced by ward operations.
///
/// `Validation`, `NotFound` and `DuplicateMrn` describe the caller's request; `Store` wraps a
/// failure of the record store collaborator. API layers map each variant to a status code.
#[derive(Debug, thiserror::Error)]
pub enum WardError {
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("an active patient with MRN '{0}' already exists")]
    DuplicateMrn(String),
    #[error("record store error: {0}")]
    Store(#[from] StoreError),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl WardError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn patient_not_found(id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("patient {}", id))
    }
}

/// Failures of a record store adapter.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to create storage directory: {0}")]
    DirCreation(std::io::Error),
    #[error("failed to write record file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to read record file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to serialize record: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize record: {0}")]
    Deserialization(serde_json::Error),
    #[error(
        "create failed and cleanup also failed (path: {path}): create={create_error}; cleanup={cleanup_error}",
        path = path.display()
    )]
    CleanupAfterCreateFailed {
        path: std::path::PathBuf,
        #[source]
        create_error: Box<StoreError>,
        cleanup_error: std::io::Error,
    },
    #[error("record store unavailable: {0}")]
    Unavailable(String),
}

pub type WardResult<T> = std::result::Result<T, WardError>;
