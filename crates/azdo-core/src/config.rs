//! Configuration management for azdo-bridge.
//!
//! Connection settings come from two places:
//!
//! - a TOML file in the platform config directory
//!   (`~/.config/azdo-bridge/config.toml` on Linux and macOS,
//!   `%APPDATA%\azdo-bridge\config.toml` on Windows);
//! - environment variables, which override the file.
//!
//! The personal access token is only ever read from `AZDO_PAT` and is
//! never written to disk.
//!
//! # Example
//!
//! ```ignore
//! use azdo_core::config::Config;
//!
//! let config = Config::load()?;
//! let settings = config.resolve_from_env()?;
//! println!("{} / {}", settings.organization_url, settings.project);
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Config file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Config directory name.
const CONFIG_DIR_NAME: &str = "azdo-bridge";

/// Hosted Azure DevOps services root.
pub const DEFAULT_HOST: &str = "https://dev.azure.com";

/// Organization name variable.
pub const ENV_ORGANIZATION: &str = "AZURE_DEVOPS_ORG";
/// Personal access token variable.
pub const ENV_TOKEN: &str = "AZDO_PAT";
/// Project name variable.
pub const ENV_PROJECT: &str = "AZURE_DEVOPS_PROJECT";
/// Full organization URL variable (Azure DevOps Server).
pub const ENV_URL: &str = "AZURE_DEVOPS_URL";

// =============================================================================
// Configuration structures
// =============================================================================

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Azure DevOps connection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_devops: Option<AzureDevOpsConfig>,
}

/// Azure DevOps connection configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AzureDevOpsConfig {
    /// Organization name (e.g., "contoso")
    #[serde(default)]
    pub organization: String,
    /// Project name
    #[serde(default)]
    pub project: String,
    /// Full organization URL, overrides `https://dev.azure.com/<organization>`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Validated connection settings, built once at startup.
#[derive(Clone)]
pub struct ConnectionSettings {
    /// Organization URL without trailing slash
    pub organization_url: String,
    /// Project name
    pub project: String,
    /// Personal access token
    pub token: String,
}

impl fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("organization_url", &self.organization_url)
            .field("project", &self.project)
            .field("token", &"<redacted>")
            .finish()
    }
}

// =============================================================================
// Config implementation
// =============================================================================

impl Config {
    /// Get the configuration directory path.
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join(CONFIG_DIR_NAME))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
    }

    /// Get the configuration file path.
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Load configuration from the default location.
    ///
    /// Returns a default (empty) config if the file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    ///
    /// Returns a default (empty) config if the file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = ?path, "Config file does not exist, using defaults");
            return Ok(Self::default());
        }

        debug!(path = ?path, "Loading config");

        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))?;

        info!(path = ?path, "Config loaded successfully");
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        self.save_to(&path)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create config directory: {}", e)))?;
        }

        debug!(path = ?path, "Saving config");

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, contents)
            .map_err(|e| Error::Config(format!("Failed to write config file: {}", e)))?;

        info!(path = ?path, "Config saved successfully");
        Ok(())
    }

    /// Set a configuration value by key path.
    ///
    /// Key format: `azure_devops.field` (e.g., `azure_devops.project`)
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let field = split_key(key)?;
        let config = self.azure_devops.get_or_insert_with(AzureDevOpsConfig::default);

        match field {
            "organization" | "org" => config.organization = value.to_string(),
            "project" => config.project = value.to_string(),
            "url" => config.url = Some(value.to_string()),
            _ => {
                return Err(Error::Config(format!(
                    "Unknown Azure DevOps config field: {}",
                    field
                )))
            }
        }

        Ok(())
    }

    /// Get a configuration value by key path.
    ///
    /// Key format: `azure_devops.field` (e.g., `azure_devops.project`)
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let field = split_key(key)?;
        let Some(config) = &self.azure_devops else {
            return Ok(None);
        };

        match field {
            "organization" | "org" => Ok(Some(config.organization.clone())),
            "project" => Ok(Some(config.project.clone())),
            "url" => Ok(config.url.clone()),
            _ => Err(Error::Config(format!(
                "Unknown Azure DevOps config field: {}",
                field
            ))),
        }
    }

    /// Resolve connection settings using the process environment.
    pub fn resolve_from_env(&self) -> Result<ConnectionSettings> {
        self.resolve(|name| std::env::var(name).ok())
    }

    /// Resolve connection settings, letting `env` override file values.
    ///
    /// Fails with [`Error::Config`] naming every missing variable when the
    /// organization, project or token cannot be determined.
    pub fn resolve<F>(&self, env: F) -> Result<ConnectionSettings>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = self.azure_devops.clone().unwrap_or_default();
        let lookup = |name: &str| env(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let organization = lookup(ENV_ORGANIZATION).unwrap_or(file.organization);
        let organization_url = lookup(ENV_URL)
            .or(file.url.filter(|u| !u.trim().is_empty()))
            .or_else(|| {
                let org = organization.trim();
                (!org.is_empty()).then(|| format!("{}/{}", DEFAULT_HOST, org))
            });
        let project = lookup(ENV_PROJECT).unwrap_or(file.project);
        let token = lookup(ENV_TOKEN).unwrap_or_default();

        let mut missing = Vec::new();
        if organization_url.is_none() {
            missing.push(ENV_ORGANIZATION);
        }
        if project.trim().is_empty() {
            missing.push(ENV_PROJECT);
        }
        if token.is_empty() {
            missing.push(ENV_TOKEN);
        }

        match organization_url {
            Some(url) if missing.is_empty() => {
                let settings = ConnectionSettings {
                    organization_url: url.trim().trim_end_matches('/').to_string(),
                    project: project.trim().to_string(),
                    token,
                };
                debug!(
                    organization_url = %settings.organization_url,
                    project = %settings.project,
                    "Resolved connection settings"
                );
                Ok(settings)
            }
            _ => Err(Error::Config(format!(
                "Missing required settings: {}",
                missing.join(", ")
            ))),
        }
    }
}

fn split_key(key: &str) -> Result<&str> {
    match key.split_once('.') {
        Some(("azure_devops" | "azdo", field)) if !field.contains('.') => Ok(field),
        Some((section, field)) if !field.contains('.') => {
            Err(Error::Config(format!("Unknown config section: {}", section)))
        }
        _ => Err(Error::Config(format!(
            "Invalid config key '{}'. Expected format: azure_devops.field",
            key
        ))),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::NamedTempFile;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.azure_devops.is_none());
    }

    #[test]
    fn test_set_and_get() {
        let mut config = Config::default();

        config.set("azure_devops.organization", "contoso").unwrap();
        config.set("azure_devops.project", "Fabrikam").unwrap();

        assert_eq!(
            config.get("azure_devops.organization").unwrap(),
            Some("contoso".to_string())
        );
        assert_eq!(
            config.get("azure_devops.project").unwrap(),
            Some("Fabrikam".to_string())
        );
        assert_eq!(config.get("azure_devops.url").unwrap(), None);

        config
            .set("azure_devops.url", "https://tfs.example.com/DefaultCollection")
            .unwrap();
        assert_eq!(
            config.get("azdo.url").unwrap(),
            Some("https://tfs.example.com/DefaultCollection".to_string())
        );
    }

    #[test]
    fn test_invalid_key() {
        let mut config = Config::default();

        assert!(config.set("invalid", "value").is_err());
        assert!(config.set("azure_devops.too.deep", "value").is_err());
        assert!(config.set("github.owner", "value").is_err());

        // Missing section reads as unset
        assert_eq!(config.get("azure_devops.project").unwrap(), None);

        config.set("azure_devops.project", "P").unwrap();
        assert!(config.get("azure_devops.unknown_field").is_err());
    }

    #[test]
    fn test_save_and_load() {
        let mut config = Config::default();
        config.azure_devops = Some(AzureDevOpsConfig {
            organization: "contoso".to_string(),
            project: "Fabrikam".to_string(),
            url: None,
        });

        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().to_path_buf();

        config.save_to(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("[azure_devops]"));
        assert!(contents.contains("organization = \"contoso\""));
        assert!(!contents.contains("url"));

        let loaded = Config::load_from(&path).unwrap();
        let azdo = loaded.azure_devops.unwrap();
        assert_eq!(azdo.organization, "contoso");
        assert_eq!(azdo.project, "Fabrikam");
    }

    #[test]
    fn test_load_nonexistent() {
        let path = PathBuf::from("/nonexistent/path/config.toml");
        let config = Config::load_from(&path).unwrap();
        assert!(config.azure_devops.is_none());
    }

    #[test]
    fn test_resolve_from_env_only() {
        let env = env_of(&[
            (ENV_ORGANIZATION, "contoso"),
            (ENV_PROJECT, "Fabrikam"),
            (ENV_TOKEN, "secret"),
        ]);

        let settings = Config::default().resolve(env).unwrap();
        assert_eq!(settings.organization_url, "https://dev.azure.com/contoso");
        assert_eq!(settings.project, "Fabrikam");
        assert_eq!(settings.token, "secret");
    }

    #[test]
    fn test_resolve_env_overrides_file() {
        let mut config = Config::default();
        config.set("azure_devops.organization", "from-file").unwrap();
        config.set("azure_devops.project", "FileProject").unwrap();

        let env = env_of(&[(ENV_PROJECT, "EnvProject"), (ENV_TOKEN, "secret")]);
        let settings = config.resolve(env).unwrap();

        assert_eq!(settings.organization_url, "https://dev.azure.com/from-file");
        assert_eq!(settings.project, "EnvProject");
    }

    #[test]
    fn test_resolve_url_override_trims_slash() {
        let env = env_of(&[
            (ENV_URL, "https://tfs.example.com/Collection/"),
            (ENV_PROJECT, "P"),
            (ENV_TOKEN, "t"),
        ]);
        let settings = Config::default().resolve(env).unwrap();
        assert_eq!(settings.organization_url, "https://tfs.example.com/Collection");
    }

    #[test]
    fn test_resolve_reports_all_missing() {
        let err = Config::default().resolve(env_of(&[])).unwrap_err();
        let message = err.to_string();
        assert!(message.contains(ENV_ORGANIZATION));
        assert!(message.contains(ENV_PROJECT));
        assert!(message.contains(ENV_TOKEN));
    }

    #[test]
    fn test_resolve_rejects_blank_token() {
        let env = env_of(&[
            (ENV_ORGANIZATION, "contoso"),
            (ENV_PROJECT, "Fabrikam"),
            (ENV_TOKEN, "   "),
        ]);
        let err = Config::default().resolve(env).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains(ENV_TOKEN));
        assert!(!err.to_string().contains(ENV_PROJECT));
    }

    #[test]
    fn test_settings_debug_redacts_token() {
        let settings = ConnectionSettings {
            organization_url: "https://dev.azure.com/contoso".to_string(),
            project: "P".to_string(),
            token: "super-secret".to_string(),
        };
        let debug = format!("{:?}", settings);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }
}
