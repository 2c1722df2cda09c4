use thiserror::Error;

/// Terminal failure kinds for a split run. None of them are retried.
#[derive(Debug, Error)]
pub enum SplitError {
    /// Invalid or ambiguous combination of options.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Inputs that exist but do not satisfy the run's preconditions.
    #[error("validation error: {0}")]
    Validation(String),

    /// Malformed table content.
    #[error("failed to load {path}: {reason}")]
    Load { path: String, reason: String },

    /// Output directory or file could not be created or written.
    #[error("failed to write {path}: {reason}")]
    Output { path: String, reason: String },
}

impl SplitError {
    pub fn load(path: impl std::fmt::Display, reason: impl std::fmt::Display) -> Self {
        SplitError::Load {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn output(path: impl std::fmt::Display, reason: impl std::fmt::Display) -> Self {
        SplitError::Output {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SplitError>;
