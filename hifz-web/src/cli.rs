//! Command-line arguments for the hifz-web server
//!
//! Every flag can also come from the environment; clap gives the flag priority
//! over the variable. Both take priority over the TOML file.

use std::path::PathBuf;

use clap::Parser;
use hifz_common::config::{load_toml_config, ConfigOverrides, ServerConfig};

/// Command-line arguments for hifz-web
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "hifz-web")]
#[command(about = "Quran memorization web app with cumulative verse review")]
#[command(version)]
pub struct Args {
    /// Config file (default: <config dir>/hifz/config.toml)
    #[arg(short, long, env = "HIFZ_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "HIFZ_HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "HIFZ_PORT")]
    pub port: Option<u16>,

    /// quran.com API v4 base URL
    #[arg(long, env = "HIFZ_API_BASE_URL")]
    pub api_base_url: Option<String>,

    /// Base URL relative audio paths are joined to
    #[arg(long, env = "HIFZ_AUDIO_BASE_URL")]
    pub audio_base_url: Option<String>,

    /// Reciter preselected in the form and used when none is posted
    #[arg(long, env = "HIFZ_DEFAULT_RECITER")]
    pub default_reciter: Option<u32>,

    /// File served at /ads.txt instead of the built-in one
    #[arg(long, env = "HIFZ_ADS_TXT")]
    pub ads_txt: Option<PathBuf>,

    /// Tracing filter, e.g. "hifz_web=debug,tower_http=info"
    #[arg(long, env = "HIFZ_LOG")]
    pub log_level: Option<String>,
}

impl Args {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            host: self.host.clone(),
            port: self.port,
            api_base_url: self.api_base_url.clone(),
            audio_base_url: self.audio_base_url.clone(),
            default_reciter: self.default_reciter,
            ads_txt_path: self.ads_txt.clone(),
            log_level: self.log_level.clone(),
        }
    }

    /// Load the TOML file and apply these arguments over it
    pub fn resolve_config(&self) -> hifz_common::Result<ServerConfig> {
        let toml = load_toml_config(self.config.as_deref())?;
        ServerConfig::resolve(self.overrides(), toml)
    }
}
