use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate};
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::{
    error::{Result, WeatherError},
    http::{self, get_json},
    model::{Coordinates, CurrentConditions, DailyForecast, MAX_FORECAST_DAYS, WeatherSnapshot},
    policy::UrlPolicy,
    units::UnitSystem,
    zip::ZipCode,
};

use super::{ProviderId, ProviderSettings, WeatherProvider};

pub const GEO_ENDPOINT: &str = "https://api.openweathermap.org/geo/1.0/zip";
pub const ONECALL_ENDPOINT: &str = "https://api.openweathermap.org/data/3.0/onecall";

/// Credentialed strategy: ZIP geocoding plus the combined One Call endpoint.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    http: Client,
    units: UnitSystem,
    policy: UrlPolicy,
    geo_endpoint: String,
    onecall_endpoint: String,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String, settings: &ProviderSettings) -> Result<Self> {
        Ok(Self {
            api_key,
            http: http::client(&settings.policy)?,
            units: settings.units,
            policy: settings.policy.clone(),
            geo_endpoint: GEO_ENDPOINT.to_string(),
            onecall_endpoint: ONECALL_ENDPOINT.to_string(),
        })
    }

    /// Point the provider somewhere other than api.openweathermap.org.
    pub fn with_endpoints(mut self, geo: impl Into<String>, onecall: impl Into<String>) -> Self {
        self.geo_endpoint = geo.into();
        self.onecall_endpoint = onecall.into();
        self
    }

    fn endpoint(&self, base: &str, params: &[(&str, &str)]) -> Result<Url> {
        Url::parse_with_params(base, params)
            .map_err(|e| WeatherError::invalid(format!("invalid URL: {e}")))
    }
}

#[derive(Debug, Deserialize)]
struct OwGeoResponse {
    lat: f64,
    lon: f64,
    name: String,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwCurrent {
    temp: f64,
    feels_like: f64,
    humidity: u8,
    wind_speed: f64,
    #[serde(default)]
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwDailyTemp {
    min: f64,
    max: f64,
}

#[derive(Debug, Deserialize)]
struct OwDaily {
    dt: i64,
    temp: OwDailyTemp,
    #[serde(default)]
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwOneCallResponse {
    current: OwCurrent,
    #[serde(default)]
    daily: Vec<OwDaily>,
}

fn describe(weather: &[OwWeather]) -> String {
    weather
        .first()
        .map(|w| w.description.clone())
        .unwrap_or_else(|| "Unknown".to_string())
}

fn local_date(ts: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(ts, 0).map(|dt| dt.with_timezone(&Local).date_naive())
}

impl From<OwOneCallResponse> for WeatherSnapshot {
    fn from(parsed: OwOneCallResponse) -> Self {
        let current = CurrentConditions {
            temperature: parsed.current.temp,
            feels_like: parsed.current.feels_like,
            humidity: parsed.current.humidity.min(100),
            wind_speed: parsed.current.wind_speed,
            condition: describe(&parsed.current.weather),
        };

        // daily[0] is today, which the current block already covers.
        let daily = parsed
            .daily
            .iter()
            .skip(1)
            .filter_map(|day| {
                let date = local_date(day.dt)?;
                Some(DailyForecast {
                    date,
                    temp_min: day.temp.min,
                    temp_max: day.temp.max,
                    condition: describe(&day.weather),
                })
            })
            .take(MAX_FORECAST_DAYS)
            .collect();

        WeatherSnapshot { current, daily }
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenWeather
    }

    async fn resolve_coordinates(&self, zip: &ZipCode) -> Result<Coordinates> {
        let query = format!("{zip},US");
        let url = self.endpoint(
            &self.geo_endpoint,
            &[("zip", query.as_str()), ("appid", self.api_key.as_str())],
        )?;

        let geo: OwGeoResponse =
            get_json(&self.http, &self.policy, url, None, "OpenWeather geocoding").await?;

        Ok(Coordinates {
            latitude: geo.lat,
            longitude: geo.lon,
            resolved_name: geo.name,
        })
    }

    async fn fetch_weather(&self, coords: &Coordinates) -> Result<WeatherSnapshot> {
        let lat = format!("{:.6}", coords.latitude);
        let lon = format!("{:.6}", coords.longitude);
        let url = self.endpoint(
            &self.onecall_endpoint,
            &[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("exclude", "minutely,hourly,alerts"),
                ("units", self.units.as_query()),
                ("appid", self.api_key.as_str()),
            ],
        )?;

        let parsed: OwOneCallResponse =
            get_json(&self.http, &self.policy, url, None, "OpenWeather one call").await?;

        Ok(parsed.into())
    }
}
