//! Application configuration from file and environment variables
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Environment variables (prefixed with AGORA_, sections split by `__`,
//!    e.g. AGORA_DATABASE__MAX_CONNECTIONS)
//! 2. Config file (config.toml)
//! 3. Default values
//!
//! Secrets like the database password and the default admin password should
//! be kept in environment variables, not in the config file.

use config::{Config, ConfigError, Environment, File};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

/// Global application configuration
pub static APP_CONFIG: Lazy<RwLock<AppConfig>> = Lazy::new(|| {
    RwLock::new(AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config file, using defaults: {}", e);
        AppConfig::default()
    }))
});

/// Site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub name: String,
    /// Address the push-channel server binds to
    pub bind_address: String,
    /// Default env_logger filter when RUST_LOG is not set
    pub log_filter: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: "Agora".to_string(),
            bind_address: "0.0.0.0:8080".to_string(),
            log_filter: "info".to_string(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Connection URL (should be in env var AGORA_DATABASE__URL)
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 10,
        }
    }
}

/// Default administrator seeded at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub username: String,
    pub email: String,
    /// Initial password (should be in env var AGORA_ADMIN__PASSWORD)
    #[serde(default)]
    pub password: String,
    /// Admin emails must end with this suffix; empty accepts any address
    pub required_domain: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            email: "admin@localhost".to_string(),
            password: String::new(),
            required_domain: String::new(),
        }
    }
}

/// Admin session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Random bytes per admin token; values below 24 are raised to 24
    pub token_bytes: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { token_bytes: 32 }
    }
}

/// Notification push configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    /// Forward new notifications to connected WebSocket clients
    pub push_enabled: bool,
    /// Mailbox capacity of the push server actor
    pub mailbox_capacity: usize,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            push_enabled: true,
            mailbox_capacity: 64,
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub site: SiteConfig,
    pub database: DatabaseConfig,
    pub admin: AdminConfig,
    pub session: SessionConfig,
    pub notifications: NotificationsConfig,
}

impl AppConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("config.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &str) -> Result<Self, ConfigError> {
        use config::FileFormat;

        let config = Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(File::new(path, FileFormat::Toml).required(false))
            // e.g., AGORA_DATABASE__URL, AGORA_ADMIN__REQUIRED_DOMAIN
            .add_source(
                Environment::with_prefix("AGORA")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Reload configuration from file
    pub fn reload() -> Result<(), ConfigError> {
        let new_config = Self::load()?;
        if let Ok(mut config) = APP_CONFIG.write() {
            *config = new_config;
            log::info!("Configuration reloaded");
        }
        Ok(())
    }
}

/// Initialize application configuration
///
/// Triggers the lazy load of the config file and logs the result.
pub fn init() {
    let config = get_config();
    log::info!("Configuration loaded: site.name = {}", config.site.name);
}

/// Get the current application configuration
pub fn get_config() -> AppConfig {
    APP_CONFIG.read().map(|c| c.clone()).unwrap_or_default()
}

pub fn site() -> SiteConfig {
    get_config().site
}

pub fn database() -> DatabaseConfig {
    get_config().database
}

pub fn admin() -> AdminConfig {
    get_config().admin
}

pub fn session() -> SessionConfig {
    get_config().session
}

pub fn notifications() -> NotificationsConfig {
    get_config().notifications
}
