//! Error types for the cepfast application.

use cepfast_race::RaceError;

/// Top-level error type for the lookup tool.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Configuration file or flag error.
    #[error("config error: {0}")]
    Config(String),

    /// The lookup race did not produce a winner.
    #[error(transparent)]
    Lookup(#[from] RaceError),

    /// Output rendering error.
    #[error("render error: {0}")]
    Render(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, AppError>;
