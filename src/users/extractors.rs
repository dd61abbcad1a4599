use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tracing::warn;

use super::{errors::ApiError, repo_types::UserId};

/// Header the gateway sets after authenticating the request.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Id of the calling user, taken from [`USER_ID_HEADER`].
pub struct CallerId(pub UserId);

#[async_trait]
impl<S> FromRequestParts<S> for CallerId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized("missing X-User-Id header"))?;

        match raw.trim().parse::<UserId>() {
            Ok(id) if id > 0 => Ok(CallerId(id)),
            _ => {
                warn!(header = raw, "invalid id header");
                Err(ApiError::Unauthorized("invalid X-User-Id header"))
            }
        }
    }
}
