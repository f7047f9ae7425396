use thiserror::Error;

use crate::{config::LoadError, content::FetchError, infra::error::InfraError};

/// Failures surfaced by the `marquee` binary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] LoadError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("failed to write output: {0}")]
    Output(String),
}

impl AppError {
    pub fn output(message: impl Into<String>) -> Self {
        Self::Output(message.into())
    }
}
