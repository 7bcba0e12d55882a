//! Error type for set-up operations
//!
//! Drawing never fails loudly: a skipped lock or an out-of-range rectangle is
//! a silent no-op. Only building surfaces and loading configuration can fail.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GfxError {
    #[error("invalid surface dimensions {width}x{height} (pitch {pitch})")]
    InvalidDimensions { width: i32, height: i32, pitch: i32 },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("backend error: {0}")]
    Backend(String),
}

impl From<String> for GfxError {
    fn from(msg: String) -> Self {
        GfxError::Backend(msg)
    }
}

pub type Result<T> = std::result::Result<T, GfxError>;
