use shared::{domain::ItemId, error::ApiError};
use thiserror::Error;

/// Rejections raised by the core. None of them leave partially applied state behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid input: item {0} does not exist")]
    UnknownItem(ItemId),
}

impl ViewError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}

impl From<ViewError> for ApiError {
    fn from(value: ViewError) -> Self {
        ApiError::validation(value.to_string())
    }
}
