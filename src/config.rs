use std::str::FromStr;

use serde::Deserialize;

/// Where stages and leads are read from and written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoardBackend {
    Sqlite,
    Rest,
}

impl FromStr for BoardBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sqlite" => Ok(BoardBackend::Sqlite),
            "rest" => Ok(BoardBackend::Rest),
            _ => Err(format!("Invalid board backend: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub cors_origin: String,
    pub backend: BoardBackend,
    pub crm_api_url: String,
    pub crm_api_token: Option<String>,
    pub crm_account_id: Option<i64>,
    pub persist_timeout_ms: u64,
    pub refresh_after_persist: bool,
    pub rollback_on_failure: bool,
}

fn env_flag(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let backend = match std::env::var("BOARD_SOURCE") {
            Ok(v) => v.parse::<BoardBackend>().map_err(anyhow::Error::msg)?,
            Err(_) => BoardBackend::Sqlite,
        };

        Ok(Self {
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(21650),
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:crm_board.db".into()),
            cors_origin: std::env::var("CORS_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".into()),
            backend,
            crm_api_url: std::env::var("CRM_API_URL")
                .unwrap_or_else(|_| "http://localhost:8000/api".into()),
            crm_api_token: std::env::var("CRM_API_TOKEN").ok().filter(|v| !v.is_empty()),
            crm_account_id: std::env::var("CRM_ACCOUNT_ID")
                .ok()
                .and_then(|v| v.parse().ok()),
            persist_timeout_ms: std::env::var("PERSIST_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10_000),
            refresh_after_persist: env_flag("REFRESH_AFTER_PERSIST", true),
            rollback_on_failure: env_flag("ROLLBACK_ON_FAILURE", true),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 21650,
            database_url: "sqlite:crm_board.db".into(),
            cors_origin: "http://localhost:3000,http://127.0.0.1:3000".into(),
            backend: BoardBackend::Sqlite,
            crm_api_url: "http://localhost:8000/api".into(),
            crm_api_token: None,
            crm_account_id: None,
            persist_timeout_ms: 10_000,
            refresh_after_persist: true,
            rollback_on_failure: true,
        }
    }
}
