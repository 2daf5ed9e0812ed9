use thiserror::Error;

/// Errors surfaced by the layout engine.
///
/// Graph-topology problems are never reported here; they are dropped at
/// ingestion and counted in [`crate::model::IngestReport`].
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no viewport has been supplied for this surface")]
    MissingViewport,

    #[error("invalid viewport {width}x{height}")]
    InvalidViewport { width: f32, height: f32 },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using [`EngineError`].
pub type Result<T> = std::result::Result<T, EngineError>;
