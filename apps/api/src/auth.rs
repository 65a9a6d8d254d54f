//! Request identity.
//!
//! Authentication happens upstream; requests arrive with the authenticated
//! user's id in the `x-user-id` header. Handlers that need an identity take
//! [`CurrentUser`] as an extractor, which rejects with 401 before any work
//! starts.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::errors::AppError;

pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated caller.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or(AppError::Unauthorized)?;

        let user_id = header.parse::<Uuid>().map_err(|_| AppError::Unauthorized)?;
        Ok(CurrentUser(user_id))
    }
}
