//! Error types for the trainer_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for trainer_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catalog validation error
    #[error("Catalog validation error: {0}")]
    CatalogValidation(String),

    /// A named workout or exercise does not exist
    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },

    /// An operation was called outside the state it requires
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A workout definition failed validation
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// The backing store rejected a read or write
    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl Error {
    pub fn workout_not_found(name: impl Into<String>) -> Self {
        Error::NotFound {
            kind: "Workout",
            name: name.into(),
        }
    }

    pub fn exercise_not_found(name: impl Into<String>) -> Self {
        Error::NotFound {
            kind: "Exercise",
            name: name.into(),
        }
    }

    /// True for the "named thing is absent" family of errors
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}
