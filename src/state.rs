use std::sync::Arc;

use crate::auth::{issuer_from_config, TokenIssuer};
use crate::config::AppConfig;
use crate::rdbms::Rdbms;
use crate::users::UserRepository;

#[derive(Clone)]
pub struct AppState {
    pub users: UserRepository,
    pub tokens: Arc<dyn TokenIssuer>,
}

impl AppState {
    pub async fn init(config: &AppConfig) -> anyhow::Result<Self> {
        let rdbms = Rdbms::connect(&config.db).await?;
        let users = UserRepository::new(rdbms, config.migrations_dir.clone());
        let tokens = issuer_from_config(&config.token)?;

        Ok(Self { users, tokens })
    }

    pub fn from_parts(users: UserRepository, tokens: Arc<dyn TokenIssuer>) -> Self {
        Self { users, tokens }
    }

    /// State over a test database with tokens of the form `token-{id}`.
    #[cfg(test)]
    pub(crate) fn for_tests(t: &crate::test_support::TestDb) -> Self {
        use async_trait::async_trait;

        use crate::users::UserId;

        struct FakeTokens;
        #[async_trait]
        impl TokenIssuer for FakeTokens {
            async fn generate_token(&self, user_id: UserId) -> anyhow::Result<String> {
                Ok(format!("token-{user_id}"))
            }
        }

        Self::from_parts(
            UserRepository::new(t.db.clone(), crate::test_support::MIGRATIONS),
            Arc::new(FakeTokens),
        )
    }
}
