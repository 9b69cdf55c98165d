//! Request body extractors with uniform `INVALID_REQUEST` rejections.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;
use validator::Validate;

use invenfinder_core::error::AppError;

use crate::dto::request::CredentialsRequest;
use crate::error::ApiError;

fn invalid_request() -> ApiError {
    ApiError(AppError::validation("Invalid request body"))
}

/// A JSON body that parsed and passed its `validator` rules.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|e| {
            tracing::debug!(error = %e, "Rejected request body");
            invalid_request()
        })?;
        value
            .validate()
            .map_err(|e| ApiError(AppError::validation(format!("Invalid request body: {e}"))))?;
        Ok(Self(value))
    }
}

/// Username and password, both present and non-empty.
///
/// Missing or empty username gives `NO_USERNAME`, then missing or empty
/// password gives `NO_PASSWORD`; an unparseable body gives
/// `INVALID_REQUEST`.
#[derive(Debug, Clone)]
pub struct LoginCredentials {
    /// Username.
    pub username: String,
    /// Password.
    pub password: String,
}

impl LoginCredentials {
    /// Checks a parsed body for both fields.
    pub fn from_body(body: CredentialsRequest) -> Result<Self, AppError> {
        let username = body.username.filter(|u| !u.is_empty()).ok_or_else(|| {
            AppError::validation("Username must be provided").with_code("NO_USERNAME")
        })?;
        let password = body.password.filter(|p| !p.is_empty()).ok_or_else(|| {
            AppError::validation("Password must be provided").with_code("NO_PASSWORD")
        })?;
        Ok(Self { username, password })
    }
}

impl<S: Send + Sync> FromRequest<S> for LoginCredentials {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|_| invalid_request())?;
        let body: CredentialsRequest =
            serde_json::from_slice(&bytes).map_err(|_| invalid_request())?;
        Ok(Self::from_body(body)?)
    }
}
