//! Error types for detector construction

use thiserror::Error;

/// Errors raised while building a detector
///
/// Detection itself never fails: a window that cannot be classified simply
/// produces no operation.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration values out of range
    #[error("invalid detector config: {0}")]
    InvalidConfig(String),

    /// Streaming detector created outside a tokio runtime
    #[error("streaming detector requires a tokio runtime")]
    NoRuntime,

    /// TOML fragment failed to parse
    #[error("failed to parse detector config: {0}")]
    Config(#[from] toml::de::Error),
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, Error>;
