use thiserror::Error;

/// Shared error type used across all gmboard crates.
#[derive(Debug, Error)]
pub enum AppError {
    /// Chain read failed after exhausting all retry attempts.
    #[error("chain unavailable: {0}")]
    ChainUnavailable(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] eyre::Error),
}
