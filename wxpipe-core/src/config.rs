use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use crate::provider::nws::DEFAULT_USER_AGENT;

/// External services that take a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    OpenWeather,
    OpenAi,
}

impl Service {
    pub fn as_str(&self) -> &'static str {
        match self {
            Service::OpenWeather => "openweather",
            Service::OpenAi => "openai",
        }
    }

    pub const fn all() -> &'static [Service] {
        &[Service::OpenWeather, Service::OpenAi]
    }
}

impl std::fmt::Display for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Service {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "openweather" | "owm" => Ok(Service::OpenWeather),
            "openai" => Ok(Service::OpenAi),
            _ => Err(anyhow!(
                "Unknown service '{value}'. Supported services: openweather, openai."
            )),
        }
    }
}

/// Credential for a single service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub api_key: String,
}

/// Settings stored on disk between runs.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Example TOML:
    /// [credentials.openweather]
    /// api_key = "..."
    #[serde(default)]
    pub credentials: HashMap<String, Credential>,

    /// Overrides the client identifier sent to api.weather.gov.
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "wxpipe", "wxpipe")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn upsert_api_key(&mut self, service: Service, api_key: String) {
        self.credentials
            .insert(service.as_str().to_string(), Credential { api_key });
    }

    /// Stored key for `service`; blank keys count as absent.
    pub fn api_key(&self, service: Service) -> Option<&str> {
        self.credentials
            .get(service.as_str())
            .map(|c| c.api_key.trim())
            .filter(|k| !k.is_empty())
    }

    pub fn is_configured(&self, service: Service) -> bool {
        self.api_key(service).is_some()
    }

    /// Key from the command line or environment if given, else the stored one.
    pub fn resolve_api_key(&self, service: Service, explicit: Option<&str>) -> Option<String> {
        explicit
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .or_else(|| self.api_key(service))
            .map(str::to_owned)
    }

    pub fn user_agent(&self) -> &str {
        self.user_agent
            .as_deref()
            .filter(|ua| !ua.trim().is_empty())
            .unwrap_or(DEFAULT_USER_AGENT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_as_str_roundtrip() {
        for service in Service::all() {
            let parsed = Service::try_from(service.as_str()).expect("roundtrip should succeed");
            assert_eq!(*service, parsed);
        }
        assert_eq!(Service::try_from("OWM").unwrap(), Service::OpenWeather);
    }

    #[test]
    fn unknown_service_error() {
        let err = Service::try_from("doesnotexist").unwrap_err();
        assert!(err.to_string().contains("Unknown service"));
    }

    #[test]
    fn set_and_read_api_key() {
        let mut cfg = Config::default();
        assert!(!cfg.is_configured(Service::OpenWeather));

        cfg.upsert_api_key(Service::OpenWeather, "OPEN_KEY".into());

        assert_eq!(cfg.api_key(Service::OpenWeather), Some("OPEN_KEY"));
        assert!(cfg.is_configured(Service::OpenWeather));
        assert!(!cfg.is_configured(Service::OpenAi));
    }

    #[test]
    fn blank_stored_key_is_absent() {
        let mut cfg = Config::default();
        cfg.upsert_api_key(Service::OpenAi, "   ".into());
        assert_eq!(cfg.api_key(Service::OpenAi), None);
    }

    #[test]
    fn explicit_key_wins_over_stored() {
        let mut cfg = Config::default();
        cfg.upsert_api_key(Service::OpenWeather, "STORED".into());

        assert_eq!(
            cfg.resolve_api_key(Service::OpenWeather, Some("FLAG")).as_deref(),
            Some("FLAG")
        );
        assert_eq!(
            cfg.resolve_api_key(Service::OpenWeather, Some("")).as_deref(),
            Some("STORED")
        );
        assert_eq!(cfg.resolve_api_key(Service::OpenAi, None), None);
    }

    #[test]
    fn user_agent_defaults_and_overrides() {
        let mut cfg = Config::default();
        assert_eq!(cfg.user_agent(), DEFAULT_USER_AGENT);

        cfg.user_agent = Some("acme-weather/2.0 (ops@acme.test)".into());
        assert_eq!(cfg.user_agent(), "acme-weather/2.0 (ops@acme.test)");
    }

    #[test]
    fn missing_file_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert!(cfg.credentials.is_empty());
        assert!(cfg.user_agent.is_none());
    }

    #[test]
    fn save_then_load_preserves_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.upsert_api_key(Service::OpenWeather, "OPEN_KEY".into());
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.api_key(Service::OpenWeather), Some("OPEN_KEY"));
    }

    #[test]
    fn malformed_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "credentials = 5").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
