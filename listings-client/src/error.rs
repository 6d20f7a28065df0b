use request_cache::DeduplicationError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ListingsError {
    #[error("Network error: {0}")]
    Transport(String),
    #[error("Invalid response: {0}")]
    Decode(String),
    #[error("{message}")]
    Backend { status: u16, message: String },
    #[error("Request aborted: {0}")]
    Aborted(String),
}

impl ListingsError {
    pub fn backend(status: u16, message: Option<String>, fallback: &str) -> Self {
        ListingsError::Backend {
            status,
            message: message.unwrap_or_else(|| fallback.to_string()),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ListingsError::Backend { status: 404, .. })
    }
}

impl From<surf::Error> for ListingsError {
    fn from(err: surf::Error) -> Self {
        ListingsError::Transport(err.to_string())
    }
}

impl From<DeduplicationError<ListingsError>> for ListingsError {
    fn from(err: DeduplicationError<ListingsError>) -> Self {
        match err {
            DeduplicationError::Failed(err) => (*err).clone(),
            DeduplicationError::Aborted(reason) => ListingsError::Aborted(reason),
        }
    }
}
