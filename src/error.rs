use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by stores, the tree builder, and collaborator seams.
///
/// Unknown recipe/project ids are deliberately *not* errors — lookups
/// return `None`/empty instead. `MissingReference` is reserved for
/// operations that were asked to mutate something that does not exist.
#[derive(Debug, Error)]
pub enum Error {
    #[error("missing reference: {0}")]
    MissingReference(String),

    /// A folder's parent chain or item list loops back on itself.
    #[error("folder cycle detected at folder {folder_id}")]
    FolderCycle { folder_id: String },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("remote error: {0}")]
    Remote(String),
}

impl Error {
    pub fn missing(what: impl Into<String>) -> Self {
        Error::MissingReference(what.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Error::Storage(msg.into())
    }
}
