//! Business workflows invoked by the HTTP routes and the sync worker.
//!
//! Services are plain functions generic over the repository traits so they
//! can be tested against [`crate::repository::mock::MockRepository`].

use thiserror::Error;

use crate::domain::types::TypeConstraintError;
use crate::forms::FormError;
use crate::integrations::IntegrationError;
use crate::models::auth::AuthenticatedUser;
use crate::repository::errors::RepositoryError;

pub mod automations;
pub mod avito_sync;
pub mod contacts;
pub mod dashboard;
pub mod deals;
pub mod integrations;
pub mod tasks;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("authentication required")]
    Unauthorized,

    /// The advertising platform rejected the integration's own credentials.
    #[error("the advertising platform rejected the integration credentials")]
    UpstreamUnauthorized,

    #[error("access denied")]
    Forbidden,

    #[error("not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("{0}")]
    Form(String),

    #[error("{0}")]
    TypeConstraint(String),

    #[error("rate limited by upstream service")]
    RateLimited,

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => ServiceError::NotFound,
            RepositoryError::Duplicate(message) => ServiceError::Conflict(message),
            RepositoryError::ConstraintViolation(message) => ServiceError::Form(message),
            RepositoryError::ValidationError(message) => ServiceError::TypeConstraint(message),
            other => ServiceError::Internal(other.to_string()),
        }
    }
}

impl From<TypeConstraintError> for ServiceError {
    fn from(err: TypeConstraintError) -> Self {
        ServiceError::TypeConstraint(err.to_string())
    }
}

impl From<FormError> for ServiceError {
    fn from(err: FormError) -> Self {
        ServiceError::Form(err.to_string())
    }
}

impl From<IntegrationError> for ServiceError {
    fn from(err: IntegrationError) -> Self {
        match err {
            IntegrationError::Unauthorized => ServiceError::UpstreamUnauthorized,
            IntegrationError::RateLimited => ServiceError::RateLimited,
            other => ServiceError::Upstream(other.to_string()),
        }
    }
}

/// Returns `true` when `role` is among `roles`.
pub fn check_role(role: &str, roles: &[String]) -> bool {
    roles.iter().any(|r| r == role)
}

/// Fails with [`ServiceError::Forbidden`] unless the user holds `role`.
pub fn ensure_role(user: &AuthenticatedUser, role: &str) -> ServiceResult<()> {
    if check_role(role, &user.roles) {
        Ok(())
    } else {
        Err(ServiceError::Forbidden)
    }
}
