use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::{encode, EncodingKey, Header};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, error};

use super::{claims::Claims, token::TokenIssuer};
use crate::{config::JwtConfig, users::UserId};

/// Signs HS256 access tokens locally when no auth service is configured.
#[derive(Clone)]
pub struct JwtIssuer {
    encoding: EncodingKey,
    issuer: String,
    audience: String,
    ttl: Duration,
}

impl JwtIssuer {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::from_secs((cfg.ttl_minutes.max(1) as u64) * 60),
        }
    }

    pub fn sign(&self, user_id: UserId) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = Claims {
            sub: user_id,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding).map_err(|e| {
            error!(error = %e, user_id, "jwt sign failed");
            e
        })?;
        debug!(user_id, "jwt signed");
        Ok(token)
    }
}

#[async_trait]
impl TokenIssuer for JwtIssuer {
    async fn generate_token(&self, user_id: UserId) -> anyhow::Result<String> {
        self.sign(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, DecodingKey, Validation};

    fn cfg() -> JwtConfig {
        JwtConfig {
            secret: "test-secret".into(),
            issuer: "test-issuer".into(),
            audience: "test-aud".into(),
            ttl_minutes: 5,
        }
    }

    fn validation(issuer: &str, audience: &str) -> Validation {
        let mut v = Validation::default();
        v.set_issuer(&[issuer]);
        v.set_audience(&[audience]);
        v
    }

    #[tokio::test]
    async fn issued_token_carries_user_id() {
        let issuer = JwtIssuer::new(&cfg());
        let token = issuer.generate_token(42).await.unwrap();

        let data = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"test-secret"),
            &validation("test-issuer", "test-aud"),
        )
        .unwrap();
        assert_eq!(data.claims.sub, 42);
        assert_eq!(data.claims.exp - data.claims.iat, 5 * 60);
    }

    #[test]
    fn token_is_rejected_for_other_audience_or_secret() {
        let token = JwtIssuer::new(&cfg()).sign(7).unwrap();

        assert!(decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"test-secret"),
            &validation("test-issuer", "someone-else"),
        )
        .is_err());
        assert!(decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"other-secret"),
            &validation("test-issuer", "test-aud"),
        )
        .is_err());
    }
}
