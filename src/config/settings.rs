//! Configuration settings management
//!
//! This module handles loading configuration from multiple sources,
//! validation, and persistence.

use crate::cost::DEFAULT_REGION;
use crate::error::{BlobTierError, Result};
use crate::utils::parse::{parse_read_percentage, parse_size};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tabled::Tabled;
use tracing::warn;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub account_name: Option<String>,
    pub connection_string: Option<String>,
    pub default_container: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub debug: bool,
    pub region: String,
    pub price_data_dir: Option<PathBuf>,
    pub read_percentage: f64,
    pub days: u32,
    pub min_size: u64,
    pub max_concurrent_sources: usize,
    pub show_container_statistics: bool,
    pub output_json: bool,
    pub no_color: bool,
    pub storage: Option<StorageConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: false,
            region: DEFAULT_REGION.to_string(),
            price_data_dir: None,
            read_percentage: 100.0,
            days: 30,
            min_size: 0,
            max_concurrent_sources: 4,
            show_container_statistics: false,
            output_json: false,
            no_color: false,
            storage: None,
        }
    }
}

/// One row of `config show`
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct ConfigEntry {
    #[tabled(rename = "Setting")]
    pub key: &'static str,
    #[tabled(rename = "Value")]
    pub value: String,
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Config {
    pub const KEYS: [&'static str; 13] = [
        "debug",
        "region",
        "price_data_dir",
        "read_percentage",
        "days",
        "min_size",
        "max_concurrent_sources",
        "show_container_statistics",
        "output_json",
        "no_color",
        "storage.account_name",
        "storage.connection_string",
        "storage.default_container",
    ];

    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<()> {
        if !self.read_percentage.is_finite() || self.read_percentage < 0.0 {
            return Err(BlobTierError::config(format!(
                "read_percentage must be zero or more, got {}",
                self.read_percentage
            )));
        }

        if self.max_concurrent_sources == 0 {
            return Err(BlobTierError::config(
                "max_concurrent_sources must be at least 1",
            ));
        }

        if self.region.trim().is_empty() {
            return Err(BlobTierError::config("region cannot be empty"));
        }

        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        // Use XDG Base Directory specification on Linux and macOS
        // On Windows, use the platform-appropriate config directory
        #[cfg(any(target_os = "linux", target_os = "macos"))]
        {
            use std::env;
            let config_dir = if let Ok(xdg_config_home) = env::var("XDG_CONFIG_HOME") {
                PathBuf::from(xdg_config_home)
            } else {
                let home_dir = env::var("HOME")
                    .map_err(|_| BlobTierError::config("HOME environment variable not set"))?;
                PathBuf::from(home_dir).join(".config")
            };
            Ok(config_dir.join("bta").join("bta.conf"))
        }

        #[cfg(not(any(target_os = "linux", target_os = "macos")))]
        {
            let config_dir = dirs::config_dir()
                .ok_or_else(|| BlobTierError::config("Unable to determine config directory"))?;
            Ok(config_dir.join("bta").join("bta.conf"))
        }
    }

    pub async fn load() -> Result<Self> {
        load_config().await
    }

    pub async fn save(&self) -> Result<()> {
        save_config(self).await
    }

    pub fn storage(&self) -> StorageConfig {
        self.storage.clone().unwrap_or_default()
    }

    fn storage_mut(&mut self) -> &mut StorageConfig {
        self.storage.get_or_insert_with(StorageConfig::default)
    }

    /// Update one setting by its dotted key
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        let invalid = |what: &str| {
            BlobTierError::config(format!("Invalid value '{value}' for {key}: expected {what}"))
        };
        let optional = |v: &str| {
            let v = v.trim();
            (!v.is_empty()).then(|| v.to_string())
        };

        match key {
            "debug" => self.debug = parse_bool(value).ok_or_else(|| invalid("true/false"))?,
            "region" => self.region = value.trim().to_string(),
            "price_data_dir" => self.price_data_dir = optional(value).map(PathBuf::from),
            "read_percentage" => self.read_percentage = parse_read_percentage(value)?,
            "days" => self.days = value.trim().parse().map_err(|_| invalid("a whole number of days"))?,
            "min_size" => self.min_size = parse_size(value)?,
            "max_concurrent_sources" => {
                self.max_concurrent_sources =
                    value.trim().parse().map_err(|_| invalid("a positive number"))?
            }
            "show_container_statistics" => {
                self.show_container_statistics =
                    parse_bool(value).ok_or_else(|| invalid("true/false"))?
            }
            "output_json" => self.output_json = parse_bool(value).ok_or_else(|| invalid("true/false"))?,
            "no_color" => self.no_color = parse_bool(value).ok_or_else(|| invalid("true/false"))?,
            "storage.account_name" => self.storage_mut().account_name = optional(value),
            "storage.connection_string" => self.storage_mut().connection_string = optional(value),
            "storage.default_container" => self.storage_mut().default_container = optional(value),
            _ => {
                return Err(BlobTierError::config(format!(
                    "Unknown setting '{}'. Known settings: {}",
                    key,
                    Self::KEYS.join(", ")
                )))
            }
        }

        self.validate()
    }

    /// Settings as displayable rows; secrets are masked
    pub fn entries(&self) -> Vec<ConfigEntry> {
        let storage = self.storage();
        let text = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
        let values = [
            self.debug.to_string(),
            self.region.clone(),
            self.price_data_dir
                .as_ref()
                .map_or_else(|| "(built-in)".to_string(), |p| p.display().to_string()),
            format!("{}%", self.read_percentage),
            self.days.to_string(),
            self.min_size.to_string(),
            self.max_concurrent_sources.to_string(),
            self.show_container_statistics.to_string(),
            self.output_json.to_string(),
            self.no_color.to_string(),
            text(&storage.account_name),
            storage
                .connection_string
                .as_ref()
                .map_or_else(|| "-".to_string(), |_| "********".to_string()),
            text(&storage.default_container),
        ];

        Self::KEYS
            .into_iter()
            .zip(values)
            .map(|(key, value)| ConfigEntry { key, value })
            .collect()
    }
}

/// Load configuration from multiple sources with priority order:
/// 1. Command-line flags (handled by clap)
/// 2. Environment variables
/// 3. Configuration file
/// 4. Default values
pub async fn load_config() -> Result<Config> {
    let config = load_config_no_validation().await?;

    // Validate configuration
    config.validate()?;

    Ok(config)
}

/// Load configuration without validation (for config commands)
pub async fn load_config_no_validation() -> Result<Config> {
    let mut config = Config::default();

    // Load from configuration file if it exists
    let config_path = Config::get_config_path()?;
    if config_path.exists() {
        config = load_from_file(&config_path).await?;
    }

    // Override with environment variables
    load_from_env(&mut config, |name| std::env::var(name).ok());

    Ok(config)
}

pub async fn load_from_file(path: &Path) -> Result<Config> {
    let contents = tokio::fs::read_to_string(path).await?;

    // Try to parse as TOML first, then JSON as fallback
    match toml::from_str::<Config>(&contents) {
        Ok(config) => Ok(config),
        Err(toml_error) => serde_json::from_str::<Config>(&contents).map_err(|_| {
            BlobTierError::config(format!("Cannot parse {}: {}", path.display(), toml_error))
        }),
    }
}

/// Apply environment overrides; `lookup` returns the value of a variable
pub fn load_from_env<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup("DEBUG") {
        config.debug = value.to_lowercase() == "true" || value == "1";
    }

    if let Some(value) = lookup("BTA_REGION") {
        config.region = value;
    }

    if let Some(value) = lookup("BTA_PRICE_DATA_DIR") {
        config.price_data_dir = Some(PathBuf::from(value));
    }

    if let Some(value) = lookup("BTA_READ_PERCENTAGE") {
        match parse_read_percentage(&value) {
            Ok(percentage) => config.read_percentage = percentage,
            Err(e) => warn!("Ignoring BTA_READ_PERCENTAGE: {}", e),
        }
    }

    if let Some(value) = lookup("AZURE_STORAGE_ACCOUNT") {
        config.storage_mut().account_name = Some(value);
    }

    if let Some(value) = lookup("AZURE_STORAGE_CONNECTION_STRING") {
        config.storage_mut().connection_string = Some(value);
    }

    if let Some(value) = lookup("AZURE_STORAGE_CONTAINER") {
        config.storage_mut().default_container = Some(value);
    }
}

pub async fn save_config(config: &Config) -> Result<()> {
    save_config_to(config, &Config::get_config_path()?).await
}

pub async fn save_config_to(config: &Config, path: &Path) -> Result<()> {
    // Create parent directories if they don't exist
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    // Serialize to TOML format
    let contents = toml::to_string_pretty(config)
        .map_err(|e| BlobTierError::serialization(e.to_string()))?;

    tokio::fs::write(path, contents).await?;

    Ok(())
}

/// Write a default configuration file; returns false if one already exists
pub async fn init_default_config() -> Result<bool> {
    let config_path = Config::get_config_path()?;

    // Don't overwrite existing configuration
    if config_path.exists() {
        return Ok(false);
    }

    save_config_to(&Config::default(), &config_path).await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.region, "EastUS2");
        assert_eq!(config.read_percentage, 100.0);
        assert_eq!(config.days, 30);
        assert_eq!(config.min_size, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("BTA_REGION", "WestUS"),
            ("BTA_READ_PERCENTAGE", "25%"),
            ("AZURE_STORAGE_ACCOUNT", "archivedata"),
            ("DEBUG", "1"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        load_from_env(&mut config, |name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.region, "WestUS");
        assert_eq!(config.read_percentage, 25.0);
        assert!(config.debug);
        assert_eq!(config.storage().account_name.as_deref(), Some("archivedata"));
        assert_eq!(config.storage().connection_string, None);
    }

    #[test]
    fn test_bad_env_read_percentage_is_ignored() {
        let mut config = Config::default();
        load_from_env(&mut config, |name| {
            (name == "BTA_READ_PERCENTAGE").then(|| "-5".to_string())
        });
        assert_eq!(config.read_percentage, 100.0);
    }

    #[test]
    fn test_validation() {
        let mut config = Config::default();
        config.read_percentage = -1.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.max_concurrent_sources = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_set_value() {
        let mut config = Config::default();
        config.set_value("days", "90").unwrap();
        config.set_value("min_size", "1GB").unwrap();
        config.set_value("storage.default_container", "backups").unwrap();
        config.set_value("show_container_statistics", "yes").unwrap();

        assert_eq!(config.days, 90);
        assert_eq!(config.min_size, 1 << 30);
        assert_eq!(config.storage().default_container.as_deref(), Some("backups"));
        assert!(config.show_container_statistics);

        assert!(config.set_value("days", "soon").is_err());
        assert!(config.set_value("colour", "blue").is_err());
        assert!(config.set_value("max_concurrent_sources", "0").is_err());
    }

    #[test]
    fn test_entries_mask_connection_string() {
        let mut config = Config::default();
        config
            .set_value("storage.connection_string", "AccountName=a;AccountKey=secret")
            .unwrap();
        let entries = config.entries();
        assert_eq!(entries.len(), Config::KEYS.len());
        assert!(entries.iter().all(|e| !e.value.contains("secret")));
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bta").join("bta.conf");

        let mut config = Config::default();
        config.region = "NorthEurope".to_string();
        config.set_value("storage.account_name", "logs").unwrap();
        save_config_to(&config, &path).await.unwrap();

        let loaded = load_from_file(&path).await.unwrap();
        assert_eq!(loaded, config);
    }

    #[tokio::test]
    async fn test_json_fallback_and_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bta.conf");
        std::fs::write(&path, r#"{"region": "WestEurope", "days": 7}"#).unwrap();

        let loaded = load_from_file(&path).await.unwrap();
        assert_eq!(loaded.region, "WestEurope");
        assert_eq!(loaded.days, 7);
        assert_eq!(loaded.read_percentage, 100.0);
    }
}
