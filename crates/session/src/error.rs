use thiserror::Error;

pub type Result<T> = std::result::Result<T, SessionError>;

/// Why a dataset could not be brought into memory
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Cannot read {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Request to {location} failed: {source}")]
    Transport {
        location: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to {location} returned HTTP {status}")]
    Status { location: String, status: u16 },

    #[error("Invalid dataset at {location}: {source}")]
    Decode {
        location: String,
        #[source]
        source: iam_model::ModelError,
    },

    #[error("Rejected dataset at {location}: {source}")]
    Shape {
        location: String,
        #[source]
        source: iam_search::SearchError,
    },
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    Load(#[from] LoadError),
}
