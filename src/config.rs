use anyhow::Context;
use serde::Deserialize;

use crate::rdbms::Engine;

#[derive(Debug, Clone, Deserialize)]
pub struct DbConfig {
    pub engine: Engine,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// Where auth tokens come from.
#[derive(Debug, Clone, Deserialize)]
pub enum TokenConfig {
    /// Remote auth service base URL.
    Remote(String),
    /// Sign locally.
    Jwt(JwtConfig),
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub db: DbConfig,
    pub migrations_dir: String,
    pub host: String,
    pub port: u16,
    pub token: TokenConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let engine: Engine = env_or("DB_ENGINE", "postgres").parse()?;
        let db = DbConfig {
            engine,
            host: env_or("DB_HOST", "localhost"),
            port: env_parse("DB_PORT", 5432),
            username: env_or("DB_USERNAME", "postgres"),
            password: env_or("DB_PASSWORD", ""),
            database: env_or("DB_NAME", "users"),
            max_connections: env_parse("DB_MAX_CONNECTIONS", 10),
        };

        let token = match std::env::var("AUTH_SERVICE_URL") {
            Ok(url) if !url.trim().is_empty() => TokenConfig::Remote(url),
            _ => TokenConfig::Jwt(JwtConfig {
                secret: std::env::var("JWT_SECRET")
                    .context("JWT_SECRET is required when AUTH_SERVICE_URL is unset")?,
                issuer: env_or("JWT_ISSUER", "accounts"),
                audience: env_or("JWT_AUDIENCE", "accounts-users"),
                ttl_minutes: env_parse("JWT_TTL_MINUTES", 60),
            }),
        };

        Ok(Self {
            db,
            migrations_dir: env_or("MIGRATIONS_DIR", "migrations"),
            host: env_or("APP_HOST", "0.0.0.0"),
            port: env_parse("APP_PORT", 8080),
            token,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
