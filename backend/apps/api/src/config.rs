//! Process Configuration
//!
//! Read once at startup from the environment (after `.env` is loaded).

use anyhow::{Context, bail};
use sqlx::postgres::{PgConnectOptions, PgSslMode};

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DB_PORT: u16 = 5432;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Origins always allowed by CORS, next to `FRONTEND_URL`
const LOCAL_ORIGINS: [&str; 2] = ["http://localhost:3000", "http://localhost:3001"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseSource {
    Url(String),
    Parts {
        host: String,
        port: u16,
        username: String,
        password: String,
        database: String,
        ssl: bool,
    },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseSource,
    pub max_connections: u32,
    pub port: u16,
    pub environment: String,
    pub allowed_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database = match get("DATABASE_URL") {
            Some(url) => DatabaseSource::Url(url),
            None => {
                let require = |key: &str| {
                    get(key).with_context(|| format!("{key} or DATABASE_URL must be set"))
                };
                DatabaseSource::Parts {
                    host: require("DB_HOST")?,
                    port: parse_or(get("DB_PORT"), "DB_PORT", DEFAULT_DB_PORT)?,
                    username: require("DB_USERNAME")?,
                    password: get("DB_PASSWORD").unwrap_or_default(),
                    database: require("DB_NAME")?,
                    ssl: get("DB_SSL").is_some_and(|v| v.eq_ignore_ascii_case("true")),
                }
            }
        };

        let max_connections = parse_or(
            get("DB_MAX_CONNECTIONS"),
            "DB_MAX_CONNECTIONS",
            DEFAULT_MAX_CONNECTIONS,
        )?;
        if max_connections == 0 {
            bail!("DB_MAX_CONNECTIONS must be at least 1");
        }

        let mut allowed_origins: Vec<String> =
            LOCAL_ORIGINS.iter().map(|o| o.to_string()).collect();
        if let Some(frontend) = get("FRONTEND_URL") {
            let frontend = frontend.trim().trim_end_matches('/').to_string();
            if !allowed_origins.contains(&frontend) {
                allowed_origins.push(frontend);
            }
        }

        Ok(Self {
            database,
            max_connections,
            port: parse_or(get("PORT"), "PORT", DEFAULT_PORT)?,
            environment: get("APP_ENV").unwrap_or_else(|| "development".to_string()),
            allowed_origins,
        })
    }

    pub fn connect_options(&self) -> anyhow::Result<PgConnectOptions> {
        match &self.database {
            DatabaseSource::Url(url) => url.parse().context("DATABASE_URL is not a valid URL"),
            DatabaseSource::Parts {
                host,
                port,
                username,
                password,
                database,
                ssl,
            } => Ok(PgConnectOptions::new()
                .host(host)
                .port(*port)
                .username(username)
                .password(password)
                .database(database)
                .ssl_mode(if *ssl {
                    PgSslMode::Require
                } else {
                    PgSslMode::Prefer
                })),
        }
    }
}

fn parse_or<T>(value: Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
{
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .ok()
            .with_context(|| format!("{key} has an invalid value: {raw}")),
        None => Ok(default),
    }
}
