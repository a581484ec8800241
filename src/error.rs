//! Engine error type.

use thiserror::Error;

use crate::config::ConfigError;

/// Precondition failures surfaced by the renderer.
///
/// Malformed markup and unsafe content are never errors; they degrade to
/// plain text or a neutralized attribute instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error("renderer is not initialized: no successful parse yet")]
    Uninitialized,

    #[error("render target could not be resolved to a root node")]
    NoTarget,

    #[error("no schema entry for block kind `{0}` and no fallback registered")]
    UnmappedKind(&'static str),

    #[error("no schema entry for mark kind `{0}`")]
    UnmappedMark(&'static str),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
