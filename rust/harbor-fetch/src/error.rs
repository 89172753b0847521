use thiserror::Error;

/// Failures that a [crate::Fetcher] may report.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("No resource found for key {0:?}")]
    NotFound(String),

    #[error("Invalid fetch key {key:?}: {reason}")]
    InvalidKey { key: String, reason: &'static str },

    #[error("Missing or invalid configuration: {0}")]
    Configuration(String),

    #[error("Source could not be read: {0}")]
    Transport(anyhow::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("No fetcher is registered with plugin id {0:?}")]
    UnknownFetcher(String),

    #[error("A fetcher is already registered with plugin id {0:?}")]
    DuplicateFetcher(String),
}

impl From<anyhow::Error> for FetchError {
    fn from(error: anyhow::Error) -> Self {
        FetchError::Transport(error)
    }
}

impl FetchError {
    pub(crate) fn invalid_key(key: &str, reason: &'static str) -> Self {
        FetchError::InvalidKey {
            key: key.to_string(),
            reason,
        }
    }
}
