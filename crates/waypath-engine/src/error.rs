//! Error types for the engine binary.
//!
//! [`AppError`] wraps every failure mode during startup and the simulated
//! trip so `main` can propagate with `?`.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: waypath_core::config::ConfigError,
    },

    /// The sample catalog could not be built.
    #[error("catalog error: {source}")]
    Catalog {
        /// The underlying catalog error.
        #[from]
        source: waypath_catalog::CatalogError,
    },

    /// A planning operation failed.
    #[error("engine error: {source}")]
    Engine {
        /// The underlying engine error.
        #[from]
        source: waypath_core::error::EngineError,
    },

    /// The `traveler` config section could not be read.
    #[error("traveler config error: {message}")]
    Traveler {
        /// Description of the failure.
        message: String,
    },

    /// The trip summary could not be serialized.
    #[error("output error: {source}")]
    Output {
        /// The underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}
