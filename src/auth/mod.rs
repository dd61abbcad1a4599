//! Credentials and token issuance.

pub mod claims;
pub mod client;
pub mod jwt;
pub mod password;
pub mod token;

use std::sync::Arc;

use crate::config::TokenConfig;

pub use client::RemoteTokenIssuer;
pub use jwt::JwtIssuer;
pub use token::TokenIssuer;

/// Picks the remote auth service when configured, else the local signer.
pub fn issuer_from_config(cfg: &TokenConfig) -> anyhow::Result<Arc<dyn TokenIssuer>> {
    Ok(match cfg {
        TokenConfig::Remote(url) => Arc::new(RemoteTokenIssuer::new(url)?),
        TokenConfig::Jwt(jwt) => Arc::new(JwtIssuer::new(jwt)),
    })
}
