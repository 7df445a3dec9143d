use thiserror::Error;

/// Errors surfaced by the engine. None of them are fatal to a running world.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Densities or size leave no room to place something.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Save file could not be written, read or decoded.
    #[error("persistence error for '{path}': {reason}")]
    Persistence { path: String, reason: String },

    /// Malformed add/modify/remove request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("world is not initialised; call init_world before tick")]
    NotInitialised,
}

impl EngineError {
    pub(crate) fn persistence(path: &std::path::Path, reason: impl std::fmt::Display) -> Self {
        EngineError::Persistence {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
