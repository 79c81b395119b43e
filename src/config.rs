use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub security: SecurityConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Event bus buffer size (default: 100)
    pub event_bus_buffer_size: usize,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/skyguard.db".to_string(),
            log_level: "info".to_string(),
            event_bus_buffer_size: 100,
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 7310,
            cors_allowed_origins: vec![
                "http://localhost:7310".to_string(),
                "http://127.0.0.1:7310".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Shared secret for the token signature layer. Startup fails when empty.
    pub session_secret: String,

    /// PEM file holding the RSA private key that unseals tokens.
    /// Startup fails when missing. Provision with `skyguard keygen`.
    pub private_key_path: String,

    /// 32-byte hex key for at-rest encryption of incident descriptions.
    pub data_key_hex: String,

    /// Session token lifetime.
    pub token_ttl_hours: i64,

    /// Login lockout policy.
    pub lockout: LockoutConfig,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            session_secret: String::new(),
            private_key_path: "data/skyguard_key.pem".to_string(),
            data_key_hex: String::new(),
            token_ttl_hours: 24,
            lockout: LockoutConfig::default(),
        }
    }
}

/// Sliding-window lockout parameters. Injected into the authentication
/// service at construction, never read as globals.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LockoutConfig {
    /// Failed attempts in the window before the account locks.
    pub max_failed_attempts: u32,

    /// Trailing window over which failures are counted, in seconds.
    pub ban_duration_seconds: u64,
}

impl Default for LockoutConfig {
    fn default() -> Self {
        Self {
            max_failed_attempts: 5,
            ban_duration_seconds: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub loki_enabled: bool,

    pub loki_url: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            security: SecurityConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default().with_env_overrides())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config.with_env_overrides())
    }

    /// Secrets may come from the environment instead of the config file.
    fn with_env_overrides(mut self) -> Self {
        if let Ok(secret) = std::env::var("SKYGUARD_SESSION_SECRET") {
            self.security.session_secret = secret;
        }
        if let Ok(key) = std::env::var("SKYGUARD_DATA_KEY") {
            self.security.data_key_hex = key;
        }
        self
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    pub fn create_default_if_missing() -> Result<PathBuf> {
        let path = PathBuf::from("skyguard.toml");
        if !path.exists() {
            Self::default().save_to_path(&path)?;
        }
        Ok(path)
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("skyguard.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("skyguard").join("skyguard.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".skyguard").join("skyguard.toml"));
        }

        paths
    }

    /// Missing key material is fatal: the service must refuse to start rather
    /// than fail per-request.
    pub fn validate(&self) -> Result<()> {
        if self.security.session_secret.len() < 32 {
            anyhow::bail!(
                "security.session_secret must be at least 32 characters (set SKYGUARD_SESSION_SECRET or the config file)"
            );
        }

        if self.security.data_key_hex.len() != 64
            || hex::decode(&self.security.data_key_hex).is_err()
        {
            anyhow::bail!(
                "security.data_key_hex must be 32 bytes of hex (set SKYGUARD_DATA_KEY or the config file)"
            );
        }

        if !Path::new(&self.security.private_key_path).exists() {
            anyhow::bail!(
                "security.private_key_path does not exist: {} (run `skyguard keygen` first)",
                self.security.private_key_path
            );
        }

        if self.security.token_ttl_hours <= 0 {
            anyhow::bail!("security.token_ttl_hours must be positive");
        }

        if self.security.lockout.max_failed_attempts == 0 {
            anyhow::bail!("security.lockout.max_failed_attempts must be > 0");
        }

        Ok(())
    }
}
