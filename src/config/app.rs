use anyhow::{bail, Result};
use std::env;

/// Which store backs the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub log_level: String,
    pub store_backend: StoreBackend,
    pub seed_templates: bool,
    pub backfill_past_workouts: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .unwrap_or(3000);
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let store_backend = parse_backend(&env::var("STORE_BACKEND").unwrap_or_else(|_| "postgres".to_string()))?;
        let seed_templates = parse_flag(env::var("SEED_TEMPLATES").ok(), true);
        let backfill_past_workouts = parse_flag(env::var("BACKFILL_PAST_WORKOUTS").ok(), true);

        Ok(AppConfig {
            host,
            port,
            environment,
            log_level,
            store_backend,
            seed_templates,
            backfill_past_workouts,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_backend(value: &str) -> Result<StoreBackend> {
    match value.trim().to_ascii_lowercase().as_str() {
        "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
        "memory" | "in-memory" => Ok(StoreBackend::Memory),
        other => bail!("STORE_BACKEND must be 'postgres' or 'memory', got '{}'", other),
    }
}

fn parse_flag(value: Option<String>, default: bool) -> bool {
    match value.as_deref().map(|v| v.trim().to_ascii_lowercase()) {
        Some(v) if ["1", "true", "yes", "on"].contains(&v.as_str()) => true,
        Some(v) if ["0", "false", "no", "off"].contains(&v.as_str()) => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_accept_common_spellings() {
        assert!(parse_flag(Some("TRUE".to_string()), false));
        assert!(!parse_flag(Some("off".to_string()), true));
        assert!(parse_flag(Some("maybe".to_string()), true));
        assert!(!parse_flag(None, false));
    }

    #[test]
    fn backend_names() {
        assert_eq!(parse_backend("Memory").unwrap(), StoreBackend::Memory);
        assert_eq!(parse_backend("postgresql").unwrap(), StoreBackend::Postgres);
        assert!(parse_backend("sqlite").is_err());
    }
}
