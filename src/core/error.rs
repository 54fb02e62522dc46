use std::path::PathBuf;

use thiserror::Error;

pub type ComposeResult<T> = Result<T, ComposeError>;

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },
    #[error("could not determine duration of '{}'", path.display())]
    DurationUnavailable { path: PathBuf },
    #[error("{name} must be set before this operation")]
    MissingCollaborator { name: &'static str },
    #[error("{program} binary not found in PATH")]
    BinaryNotFound { program: String },
    #[error("ffmpeg process failed (exit_code={exit_code:?}): {stderr}")]
    ProcessFailed {
        exit_code: Option<i32>,
        stderr: String,
    },
    #[error("failed to probe '{}': {message}", path.display())]
    Probe { path: PathBuf, message: String },
    #[error("{label} failed")]
    ExecutionFailed { label: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl ComposeError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }
}
