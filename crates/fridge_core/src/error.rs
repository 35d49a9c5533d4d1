//! crates/fridge_core/src/error.rs
//!
//! The error type returned by the core services.

use crate::ports::PortError;

/// Failures a caller of the core services has to handle.
///
/// Parse failures and fallback text are not here: they are ordinary results
/// (`RecipeOutcome`, `IngredientOutcome`).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Not enough {name} in the fridge: {available} available, {requested} requested.")]
    InsufficientQuantity {
        name: String,
        available: i64,
        requested: i64,
    },

    #[error("The fridge is empty! Please add some ingredients first.")]
    EmptyFridge,

    #[error("No image data received.")]
    EmptyImage,

    /// The record kept changing underneath a check-then-act update.
    #[error("{0} was modified concurrently, please retry.")]
    Conflict(String),

    #[error("{call} failed: {message}")]
    Transport { call: &'static str, message: String },

    #[error("Unexpected response format from {call}: {message}")]
    UnexpectedResponseFormat { call: &'static str, message: String },

    #[error("Storage error: {0}")]
    Store(String),
}

impl ServiceError {
    /// True for errors caused by the request itself rather than a dependency.
    pub fn is_client_fault(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::NotFound(_)
                | Self::InsufficientQuantity { .. }
                | Self::EmptyFridge
                | Self::EmptyImage
                | Self::Conflict(_)
        )
    }

    /// Tags a model-port error with the call site that produced it.
    pub(crate) fn from_model(call: &'static str, error: PortError) -> Self {
        match error {
            PortError::Transport(message) => Self::Transport { call, message },
            PortError::UnexpectedResponseFormat(message) => {
                Self::UnexpectedResponseFormat { call, message }
            }
            other => Self::Transport {
                call,
                message: other.to_string(),
            },
        }
    }
}

impl From<PortError> for ServiceError {
    fn from(error: PortError) -> Self {
        match error {
            PortError::NotFound(what) => Self::NotFound(what),
            PortError::OutOfRange(_) => Self::Validation("Quantity is too large.".to_string()),
            other => Self::Store(other.to_string()),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
