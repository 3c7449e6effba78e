use iris_abstraction::ApiError;
use thiserror::Error;

pub type WorkflowResult<T> = std::result::Result<T, WorkflowError>;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("dataset error: {0}")]
    Dataset(String),

    #[error("image file error: {0}")]
    ImageFile(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
