use thiserror::Error;

/// Result type for model operations
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors raised while decoding or checking a dataset document
#[derive(Error, Debug)]
pub enum ModelError {
    /// The document is not valid JSON or does not match the dataset shape
    #[error("Invalid dataset document: {0}")]
    Decode(#[from] serde_json::Error),

    /// `totalServices` disagrees with the number of services present
    #[error("Service count mismatch: totalServices={declared}, actual={actual}")]
    ServiceCountMismatch { declared: usize, actual: usize },
}
