use async_trait::async_trait;

use crate::users::UserId;

/// Issues an auth token for a user id.
///
/// Implemented by the remote auth-service client and by the local JWT signer.
#[async_trait]
pub trait TokenIssuer: Send + Sync {
    async fn generate_token(&self, user_id: UserId) -> anyhow::Result<String>;
}
