use bourse_core::{CoreError, HttpError};
use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] bourse_core::ValidationError),

    #[error("command error: {0}")]
    Command(String),

    #[error("failed to set up http transport: {0}")]
    Transport(#[from] HttpError),

    #[error("strict mode failed: warnings={warning_count}, errors={error_count}")]
    StrictModeViolation {
        warning_count: usize,
        error_count: usize,
    },

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<CoreError> for CliError {
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::Validation(error) => Self::Validation(error),
            CoreError::Serialization(error) => Self::Serialization(error),
            CoreError::Io(error) => Self::Io(error),
        }
    }
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) | Self::Command(_) => 2,
            Self::Serialization(_) => 4,
            Self::StrictModeViolation { .. } => 5,
            Self::Transport(_) => 6,
            Self::Io(_) => 10,
        }
    }
}
