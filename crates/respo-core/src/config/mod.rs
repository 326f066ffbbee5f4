//! Configuration management with file persistence

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::credentials::{CredentialStore, FileCredentialStore, KeyringCredentialStore};
use crate::rate::RangePolicy;
use crate::vendor::SearchParams;

/// Respo configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub vendor: VendorConfig,
    pub search: SearchParams,
    pub filter: FilterConfig,
    pub credentials: CredentialsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorConfig {
    pub base_url: String,
    /// Profile ID used by the project search endpoint
    pub profile_id: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// How "1-2 weeks" style ranges collapse to a single duration
    pub range_policy: RangePolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialBackend {
    #[default]
    File,
    Keyring,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsConfig {
    pub backend: CredentialBackend,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            vendor: VendorConfig {
                base_url: "https://app.respondent.io".to_string(),
                profile_id: String::new(),
                timeout_secs: 30,
            },
            search: SearchParams::default(),
            filter: FilterConfig {
                range_policy: RangePolicy::default(),
            },
            credentials: CredentialsConfig {
                backend: CredentialBackend::File,
            },
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var("RESPO_CONFIG_DIR") {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("respo")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Path of the file-backed credential store
    pub fn credentials_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("credentials.toml"))
    }

    /// Load configuration from file, or create default if it doesn't exist
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path()?;

        if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            Ok(config)
        } else {
            // Return default config without creating file
            Ok(Config::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> anyhow::Result<()> {
        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;

        let path = Self::config_path()?;
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Build the credential store selected by this configuration
    pub fn credential_store(&self) -> anyhow::Result<Box<dyn CredentialStore>> {
        match self.credentials.backend {
            CredentialBackend::File => Ok(Box::new(FileCredentialStore::new(
                Self::credentials_path()?,
            ))),
            CredentialBackend::Keyring => Ok(Box::new(KeyringCredentialStore::new())),
        }
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        match key {
            "vendor.base_url" => Ok(self.vendor.base_url.clone()),
            "vendor.profile_id" => Ok(self.vendor.profile_id.clone()),
            "vendor.timeout_secs" => Ok(self.vendor.timeout_secs.to_string()),

            "search.min_incentive" => Ok(self.search.min_incentive.to_string()),
            "search.max_incentive" => Ok(self.search.max_incentive.to_string()),
            "search.min_time_minutes" => Ok(self.search.min_time_minutes.to_string()),
            "search.max_time_minutes" => Ok(self.search.max_time_minutes.to_string()),
            "search.sort" => Ok(self.search.sort.clone()),
            "search.page_size" => Ok(self.search.page_size.to_string()),
            "search.show_hidden_projects" => Ok(self.search.show_hidden_projects.to_string()),
            "search.only_show_matched" => Ok(self.search.only_show_matched.to_string()),
            "search.show_eligible" => Ok(self.search.show_eligible.to_string()),

            "filter.range_policy" => Ok(match self.filter.range_policy {
                RangePolicy::Midpoint => "midpoint".to_string(),
                RangePolicy::UpperBound => "upper_bound".to_string(),
            }),

            "credentials.backend" => Ok(match self.credentials.backend {
                CredentialBackend::File => "file".to_string(),
                CredentialBackend::Keyring => "keyring".to_string(),
            }),

            _ => Err(anyhow!(
                "Unknown configuration key: {}. Use `respo config list` to see available keys.",
                key
            )),
        }
    }

    /// Set a configuration value by key
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "vendor.base_url" => {
                self.vendor.base_url = value.trim_end_matches('/').to_string();
            }
            "vendor.profile_id" => {
                self.vendor.profile_id = value.to_string();
            }
            "vendor.timeout_secs" => {
                self.vendor.timeout_secs = value
                    .parse()
                    .with_context(|| format!("Invalid timeout_secs value: {}", value))?;
            }

            "search.min_incentive" => {
                self.search.min_incentive = value
                    .parse()
                    .with_context(|| format!("Invalid min_incentive value: {}", value))?;
            }
            "search.max_incentive" => {
                self.search.max_incentive = value
                    .parse()
                    .with_context(|| format!("Invalid max_incentive value: {}", value))?;
            }
            "search.min_time_minutes" => {
                self.search.min_time_minutes = value
                    .parse()
                    .with_context(|| format!("Invalid min_time_minutes value: {}", value))?;
            }
            "search.max_time_minutes" => {
                self.search.max_time_minutes = value
                    .parse()
                    .with_context(|| format!("Invalid max_time_minutes value: {}", value))?;
            }
            "search.sort" => {
                self.search.sort = value.to_string();
            }
            "search.page_size" => {
                let size: u32 = value
                    .parse()
                    .with_context(|| format!("Invalid page_size value: {}", value))?;
                if size == 0 {
                    return Err(anyhow!("page_size must be at least 1"));
                }
                self.search.page_size = size;
            }
            "search.show_hidden_projects" => {
                self.search.show_hidden_projects = value
                    .parse()
                    .with_context(|| format!("Invalid show_hidden_projects value: {}", value))?;
            }
            "search.only_show_matched" => {
                self.search.only_show_matched = value
                    .parse()
                    .with_context(|| format!("Invalid only_show_matched value: {}", value))?;
            }
            "search.show_eligible" => {
                self.search.show_eligible = value
                    .parse()
                    .with_context(|| format!("Invalid show_eligible value: {}", value))?;
            }

            "filter.range_policy" => {
                self.filter.range_policy = value.parse().map_err(|e: String| anyhow!(e))?;
            }

            "credentials.backend" => {
                self.credentials.backend = match value {
                    "file" => CredentialBackend::File,
                    "keyring" => CredentialBackend::Keyring,
                    other => {
                        return Err(anyhow!(
                            "Invalid credentials backend: {}. Valid options: file, keyring",
                            other
                        ));
                    }
                };
            }

            _ => {
                return Err(anyhow!(
                    "Unknown configuration key: {}. Use `respo config list` to see available keys.",
                    key
                ));
            }
        }
        Ok(())
    }

    /// List all configuration keys and their values
    pub fn list(&self) -> anyhow::Result<Vec<(String, String)>> {
        let keys = vec![
            "vendor.base_url",
            "vendor.profile_id",
            "vendor.timeout_secs",
            "search.min_incentive",
            "search.max_incentive",
            "search.min_time_minutes",
            "search.max_time_minutes",
            "search.sort",
            "search.page_size",
            "search.show_hidden_projects",
            "search.only_show_matched",
            "search.show_eligible",
            "filter.range_policy",
            "credentials.backend",
        ];

        keys.into_iter()
            .map(|key| {
                let value = self.get(key)?;
                Ok((key.to_string(), value))
            })
            .collect()
    }

    /// Reset configuration to defaults
    pub fn reset() -> anyhow::Result<()> {
        let path = Self::config_path()?;
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove config file: {}", path.display()))?;
        }
        Ok(())
    }
}
