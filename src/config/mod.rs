//! Configuration module for the Travelhub backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key for API authentication (required in production)
    pub api_psk: Option<String>,
    /// Path to SQLite document store file
    pub db_path: PathBuf,
    /// Path to Tantivy search index directory
    pub index_path: PathBuf,
    /// Directory holding uploaded images and videos
    pub upload_dir: PathBuf,
    /// Public base URL used to build blob download links
    pub public_url: String,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// User IDs that always get the admin role
    pub admin_ids: Vec<String>,
    /// Upper bound for a single multipart request body
    pub max_upload_bytes: usize,
    pub integrations: IntegrationsConfig,
}

/// Endpoints and keys for the third-party dashboard widgets.
#[derive(Debug, Clone)]
pub struct IntegrationsConfig {
    pub weather_url: String,
    pub translate_url: String,
    pub translate_key: Option<String>,
    pub flights_url: String,
    pub flights_key: Option<String>,
    pub currency_url: String,
    /// Minimum delay between two lookups of the same flight
    pub flight_cooldown: Duration,
}

impl Default for IntegrationsConfig {
    fn default() -> Self {
        Self {
            weather_url: "https://api.open-meteo.com/v1/forecast".to_string(),
            translate_url: "https://libretranslate.com/translate".to_string(),
            translate_key: None,
            flights_url: "https://api.aviationstack.com/v1/flights".to_string(),
            flights_key: None,
            currency_url: "https://open.er-api.com/v6/latest".to_string(),
            flight_cooldown: Duration::from_secs(30),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let api_psk = env::var("TRAVELHUB_API_PSK").ok();

        let db_path = env::var("TRAVELHUB_DB_PATH")
            .unwrap_or_else(|_| "./data/travelhub.sqlite".to_string())
            .into();

        let index_path = env::var("TRAVELHUB_INDEX_PATH")
            .unwrap_or_else(|_| "./data/index".to_string())
            .into();

        let upload_dir = env::var("TRAVELHUB_UPLOAD_DIR")
            .unwrap_or_else(|_| "./data/uploads".to_string())
            .into();

        let public_url = env::var("TRAVELHUB_PUBLIC_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:8080".to_string())
            .trim_end_matches('/')
            .to_string();

        let bind_addr = env::var("TRAVELHUB_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .expect("Invalid TRAVELHUB_BIND_ADDR format");

        let log_level = env::var("TRAVELHUB_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let admin_ids = env::var("TRAVELHUB_ADMIN_IDS")
            .map(|v| parse_list(&v))
            .unwrap_or_default();

        let max_upload_mb: usize = env::var("TRAVELHUB_MAX_UPLOAD_MB")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(50);

        let defaults = IntegrationsConfig::default();
        let integrations = IntegrationsConfig {
            weather_url: env::var("TRAVELHUB_WEATHER_URL").unwrap_or(defaults.weather_url),
            translate_url: env::var("TRAVELHUB_TRANSLATE_URL").unwrap_or(defaults.translate_url),
            translate_key: env::var("TRAVELHUB_TRANSLATE_KEY").ok(),
            flights_url: env::var("TRAVELHUB_FLIGHTS_URL").unwrap_or(defaults.flights_url),
            flights_key: env::var("TRAVELHUB_FLIGHTS_KEY").ok(),
            currency_url: env::var("TRAVELHUB_CURRENCY_URL").unwrap_or(defaults.currency_url),
            flight_cooldown: env::var("TRAVELHUB_FLIGHT_COOLDOWN_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.flight_cooldown),
        };

        Self {
            api_psk,
            db_path,
            index_path,
            upload_dir,
            public_url,
            bind_addr,
            log_level,
            admin_ids,
            max_upload_bytes: max_upload_mb * 1024 * 1024,
            integrations,
        }
    }

    /// Whether the given user ID is listed as a configured admin.
    pub fn is_admin_id(&self, user_id: &str) -> bool {
        self.admin_ids.iter().any(|id| id == user_id)
    }
}

/// Split a comma separated list, dropping blanks.
fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        // Clear any existing env vars
        for key in [
            "TRAVELHUB_API_PSK",
            "TRAVELHUB_DB_PATH",
            "TRAVELHUB_INDEX_PATH",
            "TRAVELHUB_UPLOAD_DIR",
            "TRAVELHUB_PUBLIC_URL",
            "TRAVELHUB_BIND_ADDR",
            "TRAVELHUB_LOG_LEVEL",
            "TRAVELHUB_ADMIN_IDS",
            "TRAVELHUB_MAX_UPLOAD_MB",
            "TRAVELHUB_FLIGHT_COOLDOWN_SECS",
        ] {
            env::remove_var(key);
        }

        let config = Config::from_env();

        assert!(config.api_psk.is_none());
        assert_eq!(config.db_path, PathBuf::from("./data/travelhub.sqlite"));
        assert_eq!(config.index_path, PathBuf::from("./data/index"));
        assert_eq!(config.upload_dir, PathBuf::from("./data/uploads"));
        assert_eq!(config.public_url, "http://127.0.0.1:8080");
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.log_level, "info");
        assert!(config.admin_ids.is_empty());
        assert_eq!(config.max_upload_bytes, 50 * 1024 * 1024);
        assert_eq!(
            config.integrations.flight_cooldown,
            Duration::from_secs(30)
        );
    }

    #[test]
    fn test_parse_admin_list() {
        assert_eq!(
            parse_list(" alice, ,bob ,"),
            vec!["alice".to_string(), "bob".to_string()]
        );
        assert!(parse_list("").is_empty());
    }
}
