use thiserror::Error;

use crate::api::ApiError;

#[derive(Error, Debug)]
pub enum FrontError {
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error(transparent)]
    Api(#[from] ApiError),
}
