use std::path::PathBuf;
use std::sync::Arc;

use derive_more::From;
use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::{Backend, RestBackend, SupabaseBackend, TokenStore};

pub mod theme;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    /// Minimum seconds between recorded laps; 0 turns the guard off
    pub cooldown_seconds: u64,
    pub theme: theme::Theme,
}

/// Which backend to talk to, and where it lives
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub kind: BackendKind,
    pub base_url: String,
    /// Project API key; only the hosted backend needs one
    pub anon_key: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::Rest,
            base_url: "http://localhost:7080".to_string(),
            anon_key: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Rest,
    Supabase,
}

#[derive(Debug, From, Error)]
pub enum ConfigError {
    #[error(
        "Failed to get configuration directory. Please specify the location using the `--config <path>` flag"
    )]
    NoDirectory,

    #[error("Failed to prepare config directory: {0}")]
    CreateDirectory(std::io::Error),

    #[error("Failed to serialize default config: {0}")]
    WriteDefaults(toml::ser::Error),

    #[error("Failed to parse config: {0}")]
    Parse(Box<figment::Error>),

    #[error("The supabase backend requires `server.anon_key` to be set")]
    MissingAnonKey,
}

impl ServerConfig {
    /// Build the configured backend
    pub fn build(&self, tokens: TokenStore) -> Result<Arc<dyn Backend>, ConfigError> {
        match self.kind {
            BackendKind::Rest => Ok(Arc::new(RestBackend::new(&self.base_url, tokens))),
            BackendKind::Supabase => {
                let anon_key = self.anon_key.as_deref().ok_or(ConfigError::MissingAnonKey)?;
                Ok(Arc::new(SupabaseBackend::new(
                    &self.base_url,
                    anon_key,
                    tokens,
                )))
            }
        }
    }
}

impl Config {
    pub fn get(override_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        // Grab default configuration
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Check for toml file location
        let config_dir = override_path
            .or_else(|| {
                ProjectDirs::from("com", "Stairwell", "Stairwell")
                    .map(|dirs| dirs.config_dir().to_path_buf())
            })
            .ok_or(ConfigError::NoDirectory)?;

        // Ensure path exists
        if !config_dir.exists() {
            std::fs::create_dir_all(&config_dir)?;
        }

        let mut settings_toml = config_dir.clone();
        settings_toml.push("settings.toml");

        if settings_toml.exists() {
            figment = figment.merge(Toml::file(&settings_toml));
        } else {
            // First run: write the defaults out so they are easy to edit
            let defaults = toml::to_string_pretty(&Self::default())?;
            std::fs::write(&settings_toml, defaults)?;
        }

        let config = figment
            .merge(Env::prefixed("STAIRWELL_").split("__"))
            .extract()
            .map_err(Box::new)?;

        Ok(config)
    }
}
