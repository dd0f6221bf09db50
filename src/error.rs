//! Error types for meter construction and configuration loading.
//!
//! Drawing never fails; everything here happens before the first frame.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("invalid color '{value}'")]
    InvalidColor { value: String },

    #[error("too many graph items: {count} (at most 254)")]
    TooManyItems { count: usize },
}

impl GraphError {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}
