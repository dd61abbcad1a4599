use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::error;

use super::token::TokenIssuer;
use crate::users::UserId;

#[derive(Debug, Serialize)]
struct IdMessage {
    value: UserId,
}

#[derive(Debug, Deserialize)]
struct TokenMessage {
    value: String,
}

/// Client for the auth service's token endpoint (`POST /v1/tokens`).
#[derive(Clone)]
pub struct RemoteTokenIssuer {
    http: reqwest::Client,
    endpoint: String,
}

impl RemoteTokenIssuer {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .context("build auth service client")?;
        Ok(Self {
            http,
            endpoint: format!("{}/v1/tokens", base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl TokenIssuer for RemoteTokenIssuer {
    async fn generate_token(&self, user_id: UserId) -> anyhow::Result<String> {
        let res = self
            .http
            .post(&self.endpoint)
            .json(&IdMessage { value: user_id })
            .send()
            .await
            .and_then(|r| r.error_for_status());

        let res = match res {
            Ok(r) => r,
            Err(e) => {
                error!(error = %e, user_id, "error generating token for given id");
                anyhow::bail!("error generating token for given id");
            }
        };

        match res.json::<TokenMessage>().await {
            Ok(token) => Ok(token.value),
            Err(e) => {
                error!(error = %e, user_id, "undecodable auth service response");
                Err(e).context("decode auth service response")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};

    async fn spawn(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/")
    }

    #[tokio::test]
    async fn fetches_token_for_id() {
        let app = Router::new().route(
            "/v1/tokens",
            post(|Json(body): Json<Value>| async move {
                Json(json!({ "value": format!("token-{}", body["value"]) }))
            }),
        );
        let client = RemoteTokenIssuer::new(&spawn(app).await).unwrap();

        assert_eq!(client.generate_token(12).await.unwrap(), "token-12");
    }

    #[tokio::test]
    async fn undecodable_body_is_an_error() {
        let app = Router::new().route("/v1/tokens", post(|| async { Json(json!({"token": 1})) }));
        let client = RemoteTokenIssuer::new(&spawn(app).await).unwrap();

        let err = client.generate_token(1).await.unwrap_err();
        assert!(err.to_string().contains("decode auth service response"));
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let app = Router::new().route(
            "/v1/tokens",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let client = RemoteTokenIssuer::new(&spawn(app).await).unwrap();

        let err = client.generate_token(1).await.unwrap_err();
        assert!(err.to_string().contains("error generating token"));
    }
}
