use crate::{
    error::Result,
    model::{Coordinates, WeatherSnapshot},
    policy::UrlPolicy,
    provider::{nws::NwsProvider, openweather::OpenWeatherProvider},
    resolver::ZipTable,
    units::UnitSystem,
    zip::ZipCode,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod nws;
pub mod openweather;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenWeather,
    Nws,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "openweather",
            ProviderId::Nws => "nws",
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One acquisition strategy: turn a ZIP code into coordinates, then
/// coordinates into a normalized snapshot.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    fn id(&self) -> ProviderId;

    async fn resolve_coordinates(&self, zip: &ZipCode) -> Result<Coordinates>;

    async fn fetch_weather(&self, coords: &Coordinates) -> Result<WeatherSnapshot>;
}

/// Everything a provider needs besides its credential.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub units: UnitSystem,
    /// Client identifier sent to api.weather.gov, which rejects anonymous requests.
    pub user_agent: String,
    pub policy: UrlPolicy,
    pub zip_table: ZipTable,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            units: UnitSystem::default(),
            user_agent: nws::DEFAULT_USER_AGENT.to_string(),
            policy: UrlPolicy::default(),
            zip_table: ZipTable::default(),
        }
    }
}

/// Pick the acquisition strategy: the OpenWeatherMap provider when a
/// credential is present, the keyless NWS chain otherwise.
pub fn select_provider(
    api_key: Option<&str>,
    settings: &ProviderSettings,
) -> Result<Box<dyn WeatherProvider>> {
    Ok(match api_key.map(str::trim).filter(|k| !k.is_empty()) {
        Some(key) => Box::new(OpenWeatherProvider::new(key.to_owned(), settings)?),
        None => Box::new(NwsProvider::new(settings)?),
    })
}
