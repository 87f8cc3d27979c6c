// File: ./src/config.rs
use crate::client::DEFAULT_BASE_URL;
use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const TOKEN_ENV: &str = "ASANA_ACCESS_TOKEN";
pub const BASE_URL_ENV: &str = "ASANA_BASE_URL";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Personal access token from the Asana developer console.
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub allow_insecure_certs: bool,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            token: String::new(),
            base_url: default_base_url(),
            allow_insecure_certs: false,
        }
    }
}

impl Config {
    pub fn get_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "asana-export", "asana-export")
            .map(|proj| proj.config_dir().join("config.toml"))
    }

    /// Default location, then environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::get_path();
        let file = match &path {
            Some(path) if path.exists() => Self::load_from(path)?,
            _ => Self::default(),
        };
        file.with_env_overrides(|key| env::var(key).ok())
            .validated(path.as_deref())
    }

    /// Explicit config file; it must exist.
    pub fn load_file(path: &Path) -> Result<Self> {
        Self::load_from(path)?
            .with_env_overrides(|key| env::var(key).ok())
            .validated(Some(path))
    }

    fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Cannot read config file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Applies `ASANA_ACCESS_TOKEN` / `ASANA_BASE_URL` from `lookup`.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup(TOKEN_ENV)
            && !token.trim().is_empty()
        {
            self.token = token;
        }
        if let Some(url) = lookup(BASE_URL_ENV)
            && !url.trim().is_empty()
        {
            self.base_url = url;
        }
        self
    }

    /// `path` is the config file the settings came from, named in the error.
    fn validated(mut self, path: Option<&Path>) -> Result<Self> {
        self.token = self.token.trim().to_string();
        if self.token.is_empty() {
            bail!(
                "No Asana access token: set {} or add `token = \"...\"` to {}",
                TOKEN_ENV,
                path.map(|p| p.display().to_string())
                    .unwrap_or_else(|| "config.toml".to_string())
            );
        }
        Ok(self)
    }
}
