use std::future::Future;

use trajview_core::Catalog;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("trajectory not found: {id}")]
    NotFound { id: String, tried: Vec<String> },

    #[error("invalid trajectory id: {0:?}")]
    InvalidId(String),

    #[error("HTTP {status} from {url}: {body}")]
    Http {
        status: u16,
        url: String,
        body: String,
    },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("unexpected response body: {0}")]
    Decode(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Read-only, filename-addressed trajectory storage.
///
/// Futures must be `Send` so the replay host can run fetches as tasks.
pub trait TrajectoryStore: Send + Sync + 'static {
    /// Every trajectory filename the store holds.
    fn list_files(&self) -> impl Future<Output = Result<Vec<String>, StoreError>> + Send;

    /// Filenames grouped by model. Stores that group remotely override this.
    fn catalog(&self) -> impl Future<Output = Result<Catalog, StoreError>> + Send {
        async move { Ok(Catalog::from_filenames(self.list_files().await?)) }
    }

    /// Raw bytes of one trajectory. `.json` is appended when missing.
    /// The body is returned unparsed so callers can report malformed JSON.
    fn fetch(&self, id: &str) -> impl Future<Output = Result<Vec<u8>, StoreError>> + Send;
}

/// Validate a trajectory id and turn it into a plain filename.
///
/// Ids are single path components: no separators, no `..`, no NUL.
pub fn filename_for_id(id: &str) -> Result<String, StoreError> {
    let trimmed = id.trim();
    let invalid = trimmed.is_empty()
        || trimmed.contains(['/', '\\', '\0'])
        || trimmed == "."
        || trimmed.starts_with("..");
    if invalid {
        return Err(StoreError::InvalidId(id.to_string()));
    }
    Ok(trajview_core::route::with_extension(trimmed))
}
