use thiserror::Error;

/// Uniform failure of a content store fetch.
///
/// Transport errors, non-success statuses, query syntax errors and
/// undecodable bodies all collapse into this one variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("fetch failed: {message}")]
    FetchFailed { message: String },
}

impl FetchError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::FetchFailed {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::FetchFailed { message } => message,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(error: reqwest::Error) -> Self {
        Self::failed(format!("http error: {error}"))
    }
}
