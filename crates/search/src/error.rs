use thiserror::Error;

pub type Result<T> = std::result::Result<T, SearchError>;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Dataset error: {0}")]
    ModelError(#[from] iam_model::ModelError),
}
