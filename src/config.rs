use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub security: SecurityConfig,

    #[serde(default)]
    pub defaults: DefaultsConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// SQLite connection string or path (e.g. "sqlite:notey.db").
    pub database_path: String,

    /// Directory where uploaded project images and note attachments land.
    pub upload_path: String,

    pub log_level: String,

    /// 0 = let tokio pick.
    pub worker_threads: usize,

    pub max_db_connections: u32,

    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:notey.db".to_string(),
            upload_path: "uploads".to_string(),
            log_level: "notey=info,tower_http=warn".to_string(),
            worker_threads: 0,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,

    pub port: u16,

    pub cors_allowed_origins: Vec<String>,

    /// Session cookie expires after this much inactivity.
    pub session_inactivity_minutes: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8020,
            cors_allowed_origins: vec!["*".to_string()],
            session_inactivity_minutes: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB.
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations).
    pub argon2_time_cost: u32,

    pub argon2_parallelism: u32,

    pub minimum_password_length: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
            minimum_password_length: 8,
        }
    }
}

/// Stock values applied when a user or project is created without them.
/// Fixed at process start; never mutated at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    pub project_image_url: String,

    pub profile_color: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            project_image_url: "https://images.unsplash.com/photo-1518976024611-28bf4b48222e"
                .to_string(),
            profile_color: "#ffffff".to_string(),
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
            metrics_enabled: false,
            loki_enabled: false,
            loki_url: "http://127.0.0.1:3100".to_string(),
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
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
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

    pub fn validate(&self) -> Result<()> {
        if self.general.database_path.is_empty() {
            anyhow::bail!("general.database_path must not be empty");
        }
        if self.general.max_db_connections < self.general.min_db_connections {
            anyhow::bail!("general.max_db_connections must be >= min_db_connections");
        }
        if self.security.minimum_password_length < 4 {
            anyhow::bail!("security.minimum_password_length must be at least 4");
        }
        if self.server.session_inactivity_minutes <= 0 {
            anyhow::bail!("server.session_inactivity_minutes must be positive");
        }
        if self.observability.loki_enabled {
            url::Url::parse(&self.observability.loki_url)
                .context("observability.loki_url is not a valid URL")?;
        }
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("notey").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".notey").join("config.toml"));
        }

        paths
    }
}

#[cfg(test)]
mod tests {
    use super::Config;

    #[test]
    fn default_config_validates() {
        Config::default().validate().expect("defaults should pass");
    }

    #[test]
    fn rejects_inverted_pool_bounds() {
        let mut config = Config::default();
        config.general.max_db_connections = 1;
        config.general.min_db_connections = 4;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: Config = toml::from_str(
            r#"
            [server]
            port = 9000
            "#,
        )
        .expect("partial config should parse");

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.general.max_db_connections, 5);
        assert_eq!(config.defaults.profile_color, "#ffffff");
    }
}
