use thiserror::Error;

pub type ViewerResult<T> = Result<T, ViewerError>;

#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("Server returned {code} for {url}")]
    Status { code: u16, url: String },

    #[error("Malformed response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Background task failed: {0}")]
    Task(String),
}

impl ViewerError {
    /// Connection errors, non-2xx responses and malformed bodies all count as
    /// one kind of failure: the service could not give us what we asked for.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            ViewerError::Transport { .. } | ViewerError::Status { .. } | ViewerError::Decode { .. }
        )
    }
}

impl From<rust_xlsxwriter::XlsxError> for ViewerError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        ViewerError::Export(err.to_string())
    }
}

impl From<tokio::task::JoinError> for ViewerError {
    fn from(err: tokio::task::JoinError) -> Self {
        ViewerError::Task(err.to_string())
    }
}
