//! Control plane configuration
//!
//! Settings come from three places, later ones winning:
//! - built-in defaults
//! - an optional TOML file (`--config` / `CHECKCX_CONFIG`)
//! - environment (`CHECKCX_JWT_SECRET`)

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Secret used when neither the config file nor the environment set one
pub const DEV_JWT_SECRET: &str = "check-cx-development-secret-change-in-production";

/// Environment variable overriding the JWT secret
pub const JWT_SECRET_ENV: &str = "CHECKCX_JWT_SECRET";

pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("token_ttl_hours must be positive, got {0}")]
    InvalidTtl(i64),
}

/// Contents of the optional TOML config file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub port: Option<u16>,
    pub jwt_secret: Option<String>,
    pub token_ttl_hours: Option<i64>,
    pub cors_allow_any: Option<bool>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Token signing settings shared by login and the auth middleware
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
}

impl AuthSettings {
    /// Settings for tests and throwaway instances
    pub fn development() -> Self {
        Self {
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_ttl_hours: DEFAULT_TOKEN_TTL_HOURS,
        }
    }

    pub fn is_development_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

/// Resolved server settings
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub port: u16,
    pub auth: AuthSettings,
    /// Allow any origin (for a UI served from another host during development)
    pub cors_allow_any: bool,
}

impl ServerSettings {
    /// Merge the CLI port, the optional config file and the environment.
    ///
    /// `cli_port` is only `Some` when given explicitly on the command line
    /// or through `CHECKCX_PORT`.
    pub fn resolve(
        cli_port: Option<u16>,
        config_path: Option<&Path>,
        env_secret: Option<String>,
    ) -> Result<Self, ConfigError> {
        let file = match config_path {
            Some(path) => {
                info!("Loading config from {}", path.display());
                FileConfig::load(path)?
            }
            None => FileConfig::default(),
        };

        let token_ttl_hours = file.token_ttl_hours.unwrap_or(DEFAULT_TOKEN_TTL_HOURS);
        if token_ttl_hours <= 0 {
            return Err(ConfigError::InvalidTtl(token_ttl_hours));
        }

        let jwt_secret = env_secret
            .filter(|s| !s.trim().is_empty())
            .or(file.jwt_secret.filter(|s| !s.trim().is_empty()))
            .unwrap_or_else(|| DEV_JWT_SECRET.to_string());

        let settings = Self {
            port: cli_port.or(file.port).unwrap_or(8080),
            auth: AuthSettings {
                jwt_secret,
                token_ttl_hours,
            },
            cors_allow_any: file.cors_allow_any.unwrap_or(false),
        };

        if settings.auth.is_development_secret() {
            warn!(
                "No JWT secret configured; using the development secret. Set {} for production.",
                JWT_SECRET_ENV
            );
        }

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_without_file() {
        let settings = ServerSettings::resolve(None, None, None).unwrap();
        assert_eq!(settings.port, 8080);
        assert!(settings.auth.is_development_secret());
        assert_eq!(settings.auth.token_ttl_hours, 24);
        assert!(!settings.cors_allow_any);
    }

    #[test]
    fn test_file_values_and_env_override() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("checkcx.toml");
        std::fs::write(
            &path,
            "port = 9000\njwt_secret = \"from-file\"\ntoken_ttl_hours = 2\ncors_allow_any = true\n",
        )
        .unwrap();

        let settings = ServerSettings::resolve(None, Some(&path), None).unwrap();
        assert_eq!(settings.port, 9000);
        assert_eq!(settings.auth.jwt_secret, "from-file");
        assert_eq!(settings.auth.token_ttl_hours, 2);
        assert!(settings.cors_allow_any);

        let settings =
            ServerSettings::resolve(Some(7000), Some(&path), Some("from-env".to_string())).unwrap();
        assert_eq!(settings.port, 7000);
        assert_eq!(settings.auth.jwt_secret, "from-env");
    }

    #[test]
    fn test_rejects_bad_files() {
        let dir = tempdir().unwrap();

        let path = dir.path().join("unknown.toml");
        std::fs::write(&path, "listen = 1\n").unwrap();
        assert!(matches!(
            ServerSettings::resolve(None, Some(&path), None),
            Err(ConfigError::Parse { .. })
        ));

        let path = dir.path().join("ttl.toml");
        std::fs::write(&path, "token_ttl_hours = 0\n").unwrap();
        assert!(matches!(
            ServerSettings::resolve(None, Some(&path), None),
            Err(ConfigError::InvalidTtl(0))
        ));

        assert!(matches!(
            ServerSettings::resolve(None, Some(&dir.path().join("missing.toml")), None),
            Err(ConfigError::Read { .. })
        ));
    }
}
