//! Configuration loading and resolution
//!
//! Resolution priority for every setting:
//! 1. Command-line argument / environment variable (supplied as [`ConfigOverrides`])
//! 2. TOML config file
//! 3. Compiled default
//!
//! A missing default config file is not an error; the service starts on
//! compiled defaults. An explicitly requested file that is missing or invalid is.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::{Error, Result};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_API_BASE_URL: &str = "https://api.quran.com/api/v4";
pub const DEFAULT_AUDIO_BASE_URL: &str = "https://verses.quran.com/";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;
/// Mishari Rashid al-Afasy (Murattal) on quran.com
pub const DEFAULT_RECITER: u32 = 7;
pub const DEFAULT_AUDIO_LOOKUP_CONCURRENCY: usize = 4;
pub const DEFAULT_MAX_VERSES: u32 = 40;
pub const DEFAULT_MAX_REPEATS: u32 = 10;
pub const DEFAULT_LOG_LEVEL: &str = "hifz_web=info,tower_http=info";

/// On-disk TOML configuration; every field optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TomlConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub ads_txt_path: Option<PathBuf>,
    pub content: ContentToml,
    pub session: SessionToml,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContentToml {
    pub api_base_url: Option<String>,
    pub audio_base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub default_reciter: Option<u32>,
    pub audio_lookup_concurrency: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionToml {
    pub max_verses: Option<u32>,
    pub max_repeats: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `EnvFilter` directive string
    pub level: Option<String>,
}

/// Values supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub api_base_url: Option<String>,
    pub audio_base_url: Option<String>,
    pub default_reciter: Option<u32>,
    pub ads_txt_path: Option<PathBuf>,
    pub log_level: Option<String>,
}

/// Remote content source settings
#[derive(Debug, Clone, PartialEq)]
pub struct ContentConfig {
    pub api_base_url: String,
    pub audio_base_url: String,
    pub request_timeout: Duration,
    pub default_reciter: u32,
    pub audio_lookup_concurrency: usize,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            audio_base_url: DEFAULT_AUDIO_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            default_reciter: DEFAULT_RECITER,
            audio_lookup_concurrency: DEFAULT_AUDIO_LOOKUP_CONCURRENCY,
        }
    }
}

/// Upper bounds applied to form input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLimits {
    pub max_verses: u32,
    pub max_repeats: u32,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            max_verses: DEFAULT_MAX_VERSES,
            max_repeats: DEFAULT_MAX_REPEATS,
        }
    }
}

/// Fully resolved server configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub ads_txt_path: Option<PathBuf>,
    pub content: ContentConfig,
    pub session: SessionLimits,
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            ads_txt_path: None,
            content: ContentConfig::default(),
            session: SessionLimits::default(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl ServerConfig {
    /// Merge overrides over the TOML file over compiled defaults, then validate
    pub fn resolve(overrides: ConfigOverrides, toml: TomlConfig) -> Result<Self> {
        let defaults = ServerConfig::default();

        let config = ServerConfig {
            host: overrides.host.or(toml.host).unwrap_or(defaults.host),
            port: overrides.port.or(toml.port).unwrap_or(defaults.port),
            ads_txt_path: overrides.ads_txt_path.or(toml.ads_txt_path),
            content: ContentConfig {
                api_base_url: overrides
                    .api_base_url
                    .or(toml.content.api_base_url)
                    .unwrap_or(defaults.content.api_base_url),
                audio_base_url: overrides
                    .audio_base_url
                    .or(toml.content.audio_base_url)
                    .unwrap_or(defaults.content.audio_base_url),
                request_timeout: toml
                    .content
                    .request_timeout_secs
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.content.request_timeout),
                default_reciter: overrides
                    .default_reciter
                    .or(toml.content.default_reciter)
                    .unwrap_or(defaults.content.default_reciter),
                audio_lookup_concurrency: toml
                    .content
                    .audio_lookup_concurrency
                    .unwrap_or(defaults.content.audio_lookup_concurrency),
            },
            session: SessionLimits {
                max_verses: toml
                    .session
                    .max_verses
                    .unwrap_or(defaults.session.max_verses),
                max_repeats: toml
                    .session
                    .max_repeats
                    .unwrap_or(defaults.session.max_repeats),
            },
            log_level: overrides
                .log_level
                .or(toml.logging.level)
                .unwrap_or(defaults.log_level),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.content.api_base_url.trim().is_empty() {
            return Err(Error::Config("content.api_base_url is empty".to_string()));
        }
        if self.content.audio_base_url.trim().is_empty() {
            return Err(Error::Config("content.audio_base_url is empty".to_string()));
        }
        if self.content.request_timeout.is_zero() {
            return Err(Error::Config(
                "content.request_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.content.audio_lookup_concurrency == 0 {
            return Err(Error::Config(
                "content.audio_lookup_concurrency must be at least 1".to_string(),
            ));
        }
        if self.session.max_verses == 0 || self.session.max_repeats == 0 {
            return Err(Error::Config(
                "session.max_verses and session.max_repeats must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// `host:port` for the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Platform config file location: `<config_dir>/hifz/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("hifz").join("config.toml"))
}

/// Load the TOML config
///
/// With `explicit` set the file must exist and parse. Otherwise the platform
/// default is tried and a missing file yields defaults.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        return read_toml_config(path);
    }

    match default_config_path() {
        Some(path) if path.exists() => read_toml_config(&path),
        Some(path) => {
            info!(
                "No config file at {}, using compiled defaults",
                path.display()
            );
            Ok(TomlConfig::default())
        }
        None => {
            warn!("Could not determine config directory, using compiled defaults");
            Ok(TomlConfig::default())
        }
    }
}

/// Parse a TOML config file
pub fn read_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    let config = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;
    info!("Loaded config from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_resolve() {
        let config = ServerConfig::resolve(ConfigOverrides::default(), TomlConfig::default())
            .unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.bind_address(), "127.0.0.1:8000");
    }

    #[test]
    fn test_overrides_beat_toml() {
        let toml = TomlConfig {
            port: Some(9000),
            host: Some("0.0.0.0".to_string()),
            ..Default::default()
        };
        let overrides = ConfigOverrides {
            port: Some(9100),
            ..Default::default()
        };
        let config = ServerConfig::resolve(overrides, toml).unwrap();
        assert_eq!(config.port, 9100);
        assert_eq!(config.host, "0.0.0.0");
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let mut toml = TomlConfig::default();
        toml.content.audio_lookup_concurrency = Some(0);
        let err = ServerConfig::resolve(ConfigOverrides::default(), toml).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut toml = TomlConfig::default();
        toml.content.request_timeout_secs = Some(0);
        assert!(ServerConfig::resolve(ConfigOverrides::default(), toml).is_err());
    }
}
