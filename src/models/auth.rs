//! Bearer-token authentication for the JSON API.

use std::future::{Ready, ready};

use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{FromRequest, HttpRequest, web};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::domain::manager::NewManager;
use crate::domain::types::{Email, HubId, ManagerName, TypeConstraintError};
use crate::services::ServiceError;

/// Secret shared with the identity provider that signs user tokens.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub secret: String,
}

/// Claims carried by the bearer token of every API request.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub sub: String,
    pub email: String,
    pub hub_id: i32,
    pub name: String,
    pub roles: Vec<String>,
    pub exp: usize,
}

impl AuthenticatedUser {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Verifies an HS256 token and returns its claims.
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<AuthenticatedUser>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
    }

    /// Signs the claims; used by tooling and tests.
    pub fn to_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        encode(
            &Header::new(Algorithm::HS256),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    fn from_http_request(req: &HttpRequest) -> Result<Self, ServiceError> {
        let config = req.app_data::<web::Data<AuthConfig>>().ok_or_else(|| {
            log::error!("AuthConfig is not registered as application data");
            ServiceError::Internal("authentication is not configured".to_string())
        })?;

        let token = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(ServiceError::Unauthorized)?;

        Self::from_token(token, &config.secret).map_err(|err| {
            log::warn!("Rejected bearer token: {err}");
            ServiceError::Unauthorized
        })
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = ServiceError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Self::from_http_request(req))
    }
}

impl TryFrom<&AuthenticatedUser> for NewManager {
    type Error = TypeConstraintError;

    fn try_from(user: &AuthenticatedUser) -> Result<Self, Self::Error> {
        let email = Email::new(user.email.as_str())?;
        // Identity providers may omit the display name.
        let name = ManagerName::new(user.name.as_str())
            .or_else(|_| ManagerName::new(email.as_str()))?;
        Ok(NewManager::new(HubId::new(user.hub_id)?, name, email))
    }
}
