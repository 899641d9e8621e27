//! Request payloads accepted by the JSON API.
//!
//! Each form is validated with `validator` and converted into a payload of
//! domain value objects before it reaches the repository.

use thiserror::Error;
use validator::ValidationErrors;

use crate::domain::types::TypeConstraintError;

pub mod automations;
pub mod contacts;
pub mod deals;
pub mod integrations;
pub mod tasks;

#[derive(Debug, Error)]
/// Errors that can occur when processing form data.
pub enum FormError {
    #[error("validation errors: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("invalid email address")]
    InvalidEmail,

    #[error("invalid name")]
    InvalidName,

    #[error("invalid phone number")]
    InvalidPhoneNumber,

    #[error("invalid url")]
    InvalidUrl,

    #[error("invalid identifier")]
    InvalidId,

    #[error("invalid amount")]
    InvalidAmount,

    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("{0} is required")]
    Missing(&'static str),

    #[error("malformed CSV: {0}")]
    Csv(String),
}

impl From<TypeConstraintError> for FormError {
    fn from(err: TypeConstraintError) -> Self {
        match err {
            TypeConstraintError::NonPositiveId => FormError::InvalidId,
            TypeConstraintError::InvalidEmail => FormError::InvalidEmail,
            TypeConstraintError::EmptyString => FormError::InvalidName,
            TypeConstraintError::InvalidPhone => FormError::InvalidPhoneNumber,
            TypeConstraintError::InvalidUrl => FormError::InvalidUrl,
            TypeConstraintError::NegativeAmount => FormError::InvalidAmount,
            TypeConstraintError::InvalidValue(message) => FormError::InvalidValue(message),
        }
    }
}

/// Treats absent and blank optional strings alike.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
