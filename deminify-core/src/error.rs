//! Error types for deminification

use thiserror::Error;

/// Errors surfaced at the public entry points of the crate.
///
/// Lookups that simply find nothing are not errors; they are reported as
/// absent values or as [`crate::DeminificationError`] flags on a frame.
#[derive(Debug, Error)]
pub enum DeminifyError {
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("failed to decode source map: {0}")]
    SourceMapDecode(#[from] sourcemap::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DeminifyError>;
