use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::shared::period::HourBucketing;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub warehouse: WarehouseConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory with a prebuilt renderer bundle, served as fallback
    #[serde(default)]
    pub static_dir: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            static_dir: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct WarehouseConfig {
    pub project_id: String,
    /// One dataset per storefront, all sharing the `order` / `order_line` shape
    pub storefronts: Vec<String>,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default)]
    pub location: Option<String>,
    /// OAuth bearer token; `WAREHOUSE_ACCESS_TOKEN` overrides it
    #[serde(default)]
    pub access_token: Option<String>,
    /// Per HTTP request
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Whole query including polling for job completion
    #[serde(default = "default_query_timeout_secs")]
    pub query_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_geo_lookup_path")]
    pub geo_lookup_path: String,
    #[serde(default)]
    pub hour_bucketing: HourBucketing,
    #[serde(default = "default_top_products_limit")]
    pub top_products_limit: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: default_cache_ttl_secs(),
            geo_lookup_path: default_geo_lookup_path(),
            hour_bucketing: HourBucketing::default(),
            top_products_limit: default_top_products_limit(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// Plain shared password; `DASHBOARD_PASSWORD` overrides it
    #[serde(default)]
    pub password: Option<String>,
    /// Argon2 PHC string, takes precedence over `password`
    #[serde(default)]
    pub password_hash: Option<String>,
    #[serde(default = "default_session_hours")]
    pub session_hours: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            password: None,
            password_hash: None,
            session_hours: default_session_hours(),
        }
    }
}

fn default_port() -> u16 {
    3000
}

fn default_api_base_url() -> String {
    "https://bigquery.googleapis.com/bigquery/v2".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_query_timeout_secs() -> u64 {
    120
}

fn default_cache_ttl_secs() -> u64 {
    600
}

fn default_geo_lookup_path() -> String {
    "data/latitude-longitude-countries.csv".to_string()
}

fn default_top_products_limit() -> usize {
    10
}

fn default_session_hours() -> i64 {
    24
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[server]
port = 3000

[warehouse]
project_id = "performancemarketing-364011"
storefronts = ["shopify_dk", "shopify_com", "shopify_de", "shopify_no", "shopify_se", "shopify_uk"]
timeout_secs = 30
query_timeout_secs = 120

[dashboard]
cache_ttl_secs = 600
geo_lookup_path = "data/latitude-longitude-countries.csv"
hour_bucketing = "round"
top_products_limit = 10

[auth]
session_hours = 24
"#;

/// Load configuration from config.toml file
///
/// Search order:
/// 1. Next to the executable (for production)
/// 2. Falls back to embedded default config
///
/// Secrets from the environment are applied on top in both cases.
pub fn load_config() -> anyhow::Result<Config> {
    let mut config = match find_config_file() {
        Some(config_path) => {
            tracing::info!("Loading config from: {}", config_path.display());
            let contents = std::fs::read_to_string(&config_path)?;
            toml::from_str::<Config>(&contents)?
        }
        None => {
            tracing::info!("Using default embedded configuration");
            toml::from_str::<Config>(DEFAULT_CONFIG)?
        }
    };

    apply_env_overrides(&mut config);
    Ok(config)
}

fn find_config_file() -> Option<PathBuf> {
    let exe_path = std::env::current_exe().ok()?;
    let config_path = exe_path.parent()?.join("config.toml");
    if config_path.exists() {
        Some(config_path)
    } else {
        tracing::warn!("config.toml not found at: {}", config_path.display());
        None
    }
}

fn apply_env_overrides(config: &mut Config) {
    if let Ok(token) = std::env::var("WAREHOUSE_ACCESS_TOKEN") {
        if !token.trim().is_empty() {
            config.warehouse.access_token = Some(token);
        }
    }
    if let Ok(password) = std::env::var("DASHBOARD_PASSWORD") {
        if !password.is_empty() {
            config.auth.password = Some(password);
        }
    }
}

/// Resolve a configured file path
///
/// Absolute paths are used as is. Relative paths are looked up next to the
/// executable first and then relative to the current directory.
pub fn resolve_path(path: &str) -> PathBuf {
    let candidate = Path::new(path);
    if candidate.is_absolute() {
        return candidate.to_path_buf();
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let resolved = exe_dir.join(candidate);
            if resolved.exists() {
                return resolved;
            }
        }
    }

    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_loads() {
        let config: Result<Config, _> = toml::from_str(DEFAULT_CONFIG);
        assert!(config.is_ok());
        let config = config.unwrap();
        assert_eq!(config.warehouse.storefronts.len(), 6);
        assert_eq!(config.dashboard.cache_ttl_secs, 600);
        assert_eq!(config.dashboard.hour_bucketing, HourBucketing::Round);
        assert_eq!(config.auth.session_hours, 24);
        assert!(config.auth.password.is_none());
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [warehouse]
            project_id = "p"
            storefronts = ["shopify_dk"]
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.warehouse.timeout_secs, 30);
        assert_eq!(config.warehouse.query_timeout_secs, 120);
        assert_eq!(
            config.warehouse.api_base_url,
            "https://bigquery.googleapis.com/bigquery/v2"
        );
        assert_eq!(config.dashboard.top_products_limit, 10);
    }

    #[test]
    fn test_floor_bucketing_parses() {
        let config: Config = toml::from_str(
            r#"
            [warehouse]
            project_id = "p"
            storefronts = []

            [dashboard]
            hour_bucketing = "floor"
            "#,
        )
        .unwrap();
        assert_eq!(config.dashboard.hour_bucketing, HourBucketing::Floor);
    }

    #[test]
    fn test_resolve_absolute_path_unchanged() {
        let path = if cfg!(windows) { "C:\\data\\geo.csv" } else { "/data/geo.csv" };
        assert_eq!(resolve_path(path), PathBuf::from(path));
    }
}
