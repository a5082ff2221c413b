use std::{env, net::SocketAddr, str::FromStr, time::Duration};

use anyhow::Context;

use crate::cart::CartEncoding;

/// Fallback session secret for local development only.
pub const DEV_SECRET_KEY: &str = "default_secret_key";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub host: String,
    pub port: u16,
    pub session: SessionSettings,
    pub orders: OrderSettings,
}

/// Session cookie settings. `secure_cookie` must be on behind HTTPS.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub secret_key: String,
    pub secure_cookie: bool,
}

/// Connection settings. `url` wins over the individual parts when set.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub max_connections: u32,
    pub timeout: Duration,
}

/// Switches for the order pipeline.
#[derive(Debug, Clone)]
pub struct OrderSettings {
    pub cart_encoding: CartEncoding,
    pub require_login: bool,
    pub currency_label: String,
}

impl Default for OrderSettings {
    fn default() -> Self {
        Self {
            cart_encoding: CartEncoding::default(),
            require_login: true,
            currency_label: "Nrs".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let cart_encoding = match var("CART_ENCODING") {
            Some(raw) => raw
                .parse::<CartEncoding>()
                .map_err(|err| anyhow::anyhow!("CART_ENCODING: {err}"))?,
            None => CartEncoding::default(),
        };
        let require_login = match var("REQUIRE_LOGIN") {
            Some(raw) => parse_flag(&raw)
                .with_context(|| format!("REQUIRE_LOGIN is not a boolean: {raw}"))?,
            None => true,
        };
        let secure_cookie = match var("SESSION_SECURE") {
            Some(raw) => parse_flag(&raw)
                .with_context(|| format!("SESSION_SECURE is not a boolean: {raw}"))?,
            None => false,
        };

        let database = DatabaseConfig {
            url: var("DATABASE_URL"),
            host: var("DB_HOST").unwrap_or_else(|| "localhost".to_string()),
            port: parse_var(var("DB_PORT")).unwrap_or(5432),
            user: var("DB_USER").unwrap_or_else(|| "postgres".to_string()),
            password: lookup("DB_PASSWORD").unwrap_or_default(),
            name: var("DB_NAME").unwrap_or_else(|| "gourmet_bistro".to_string()),
            max_connections: parse_var(var("DB_MAX_CONNECTIONS")).unwrap_or(10),
            timeout: Duration::from_secs(parse_var(var("DB_TIMEOUT_SECS")).unwrap_or(5)),
        };

        Ok(Self {
            database,
            host: var("APP_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_var(var("APP_PORT")).unwrap_or(3000),
            session: SessionSettings {
                secret_key: var("SECRET_KEY").unwrap_or_else(|| DEV_SECRET_KEY.to_string()),
                secure_cookie,
            },
            orders: OrderSettings {
                cart_encoding,
                require_login,
                currency_label: var("CURRENCY_LABEL").unwrap_or_else(|| "Nrs".to_string()),
            },
        })
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let ip = self
            .host
            .parse::<std::net::IpAddr>()
            .with_context(|| format!("APP_HOST is not an IP address: {}", self.host))?;
        Ok(SocketAddr::from((ip, self.port)))
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.session.secret_key == DEV_SECRET_KEY
    }
}

fn parse_var<T: FromStr>(value: Option<String>) -> Option<T> {
    value.and_then(|v| v.trim().parse().ok())
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
