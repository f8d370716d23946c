use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default PDF header version of merged documents
pub const DEFAULT_PDF_VERSION: &str = "1.5";

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind to
    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum request body size in megabytes (covers multi-file uploads)
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_upload_mb() -> usize {
    300
}

impl ServerConfig {
    /// Body limit in bytes
    pub const fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_mb: default_max_upload_mb(),
        }
    }
}

/// Selection session lifetime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Idle time after which a session and its files are discarded
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,

    /// How often the cleanup task runs
    #[serde(default = "default_cleanup_interval_seconds")]
    pub cleanup_interval_seconds: u64,
}

const fn default_ttl_seconds() -> u64 {
    3600
}

const fn default_cleanup_interval_seconds() -> u64 {
    300
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl_seconds(),
            cleanup_interval_seconds: default_cleanup_interval_seconds(),
        }
    }
}

/// Merge output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeConfig {
    /// Compress content streams of the merged document
    #[serde(default = "default_true")]
    pub compress: bool,

    /// PDF header version of the merged document
    #[serde(default = "default_pdf_version")]
    pub pdf_version: String,
}

const fn default_true() -> bool {
    true
}

fn default_pdf_version() -> String {
    DEFAULT_PDF_VERSION.to_string()
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            compress: true,
            pdf_version: default_pdf_version(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub merge: MergeConfig,
}

impl AppConfig {
    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, crate::error::Error> {
        toml::from_str(content)
            .map_err(|e| crate::error::Error::ConfigLoad(format!("Failed to parse config: {e}")))
    }

    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, crate::error::Error> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            crate::error::Error::ConfigLoad(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_toml(&content)
    }

    /// Load from default locations (~/.config/pdf-joiner/config.toml, ./config.toml)
    pub fn load() -> Self {
        // Try user config
        if let Some(config_dir) = crate::util::config_dir() {
            let user_config = config_dir.join("pdf-joiner").join("config.toml");
            if user_config.exists() {
                match Self::from_file(&user_config) {
                    Ok(config) => {
                        tracing::debug!("Loaded config from {}", user_config.display());
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // Try local config
        let local_config = std::path::PathBuf::from("config.toml");
        if local_config.exists() {
            match Self::from_file(&local_config) {
                Ok(config) => {
                    tracing::debug!("Loaded config from ./config.toml");
                    return config;
                }
                Err(e) => {
                    tracing::warn!("Failed to load ./config.toml: {}", e);
                }
            }
        }

        tracing::debug!("No config file found, using defaults");
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.max_upload_bytes(), 300 * 1024 * 1024);
        assert_eq!(config.session.ttl_seconds, 3600);
        assert!(config.merge.compress);
        assert_eq!(config.merge.pdf_version, "1.5");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [server]
            port = 8080

            [merge]
            compress = false
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert!(!config.merge.compress);
        assert_eq!(config.merge.pdf_version, "1.5");
        assert_eq!(config.session.cleanup_interval_seconds, 300);
    }

    #[test]
    fn test_invalid_toml() {
        let result = AppConfig::from_toml("[server]\nport = \"not a number\"");
        assert!(matches!(result, Err(crate::error::Error::ConfigLoad(_))));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[session]\nttl_seconds = 60\n").unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.session.ttl_seconds, 60);
    }

    #[test]
    fn test_from_missing_file() {
        let result = AppConfig::from_file("/nonexistent/pdf-joiner/config.toml");
        assert!(matches!(result, Err(crate::error::Error::ConfigLoad(_))));
    }
}
