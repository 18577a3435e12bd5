//! Keyless strategy backed by api.weather.gov.
//!
//! Acquisition is a chain of four calls, each needing the previous one's
//! output: grid point, forecast periods, observation station, latest
//! observation. Periods are then folded into daily buckets by
//! [`aggregate_daily`](crate::aggregate::aggregate_daily).

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::{
    aggregate::{ForecastPeriod, aggregate_daily},
    error::{Result, WeatherError},
    http::{self, get_json},
    model::{Coordinates, CurrentConditions, MAX_FORECAST_DAYS, WeatherSnapshot},
    policy::UrlPolicy,
    resolver::ZipTable,
    units::UnitSystem,
    zip::ZipCode,
};

use super::{ProviderId, ProviderSettings, WeatherProvider};

pub const NWS_BASE_URL: &str = "https://api.weather.gov";
pub const DEFAULT_USER_AGENT: &str =
    "WeatherPipeline/1.0 (https://github.com/user/weather-pipeline)";

#[derive(Debug, Clone)]
pub struct NwsProvider {
    http: Client,
    base_url: String,
    user_agent: String,
    units: UnitSystem,
    policy: UrlPolicy,
    zip_table: ZipTable,
}

/// Follow-up resources for one grid point.
#[derive(Debug, Clone, PartialEq)]
pub struct GridPoint {
    pub forecast_url: String,
    pub forecast_hourly_url: Option<String>,
    pub stations_url: String,
    pub locality: Option<String>,
}

/// Latest station observation, SI units.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub temperature_c: f64,
    pub wind_speed_mps: f64,
    pub relative_humidity: f64,
    pub heat_index_c: Option<f64>,
    pub description: String,
}

impl NwsProvider {
    pub fn new(settings: &ProviderSettings) -> Result<Self> {
        Ok(Self {
            http: http::client(&settings.policy)?,
            base_url: NWS_BASE_URL.to_string(),
            user_agent: settings.user_agent.clone(),
            units: settings.units,
            policy: settings.policy.clone(),
            zip_table: settings.zip_table.clone(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn get<T: DeserializeOwned>(&self, raw_url: &str, what: &str) -> Result<T> {
        let url = self.policy.parse(raw_url)?;
        get_json(&self.http, &self.policy, url, Some(&self.user_agent), what).await
    }

    /// Step 1: grid point metadata for a coordinate pair.
    pub async fn resolve_grid(&self, coords: &Coordinates) -> Result<GridPoint> {
        let url = format!(
            "{}/points/{:.4},{:.4}",
            self.base_url, coords.latitude, coords.longitude
        );
        let points: PointsResponse = self.get(&url, "NWS points").await?;
        let props = points.properties;

        Ok(GridPoint {
            forecast_url: props.forecast,
            forecast_hourly_url: props.forecast_hourly,
            stations_url: props.observation_stations,
            locality: props
                .relative_location
                .and_then(|r| r.properties.city),
        })
    }

    /// Step 2: twelve-hour forecast periods, temperatures in `self.units`.
    pub async fn fetch_periods(&self, grid: &GridPoint) -> Result<Vec<ForecastPeriod>> {
        let forecast: ForecastResponse = self.get(&grid.forecast_url, "NWS forecast").await?;

        Ok(forecast
            .properties
            .periods
            .into_iter()
            .map(|p| {
                let temperature = match p.temperature_unit.as_deref() {
                    Some("C") => self.units.from_celsius(p.temperature),
                    _ => self.units.from_fahrenheit(p.temperature),
                };
                ForecastPeriod {
                    start_time: p.start_time,
                    temperature,
                    is_daytime: p.is_daytime,
                    short_forecast: p.short_forecast,
                }
            })
            .collect())
    }

    /// Step 3: identifier of the nearest observation station.
    pub async fn resolve_station(&self, grid: &GridPoint) -> Result<String> {
        let stations: StationsResponse =
            self.get(&grid.stations_url, "NWS observation stations").await?;

        stations
            .features
            .into_iter()
            .next()
            .map(|f| f.properties.station_identifier)
            .ok_or(WeatherError::NoStationsFound)
    }

    /// Step 4: latest observation for `station_id`.
    pub async fn fetch_observation(&self, station_id: &str) -> Result<Observation> {
        let mut url = self.policy.parse(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|()| WeatherError::invalid("NWS base URL cannot carry a path"))?
            .pop_if_empty()
            .extend(["stations", station_id, "observations", "latest"]);
        let obs: ObservationResponse = get_json(
            &self.http,
            &self.policy,
            url,
            Some(&self.user_agent),
            "NWS latest observation",
        )
        .await?;
        let props = obs.properties;

        let temperature_c = props.temperature.value.ok_or_else(|| {
            WeatherError::upstream(format!("station {station_id} reported no temperature"))
        })?;

        Ok(Observation {
            temperature_c,
            wind_speed_mps: props.wind_speed.meters_per_second().unwrap_or(0.0),
            relative_humidity: props.relative_humidity.value.unwrap_or(0.0),
            heat_index_c: props.heat_index.and_then(|h| h.value),
            description: props.text_description.unwrap_or_default(),
        })
    }

    fn current_conditions(&self, obs: &Observation) -> CurrentConditions {
        let feels_like_c = match obs.heat_index_c {
            Some(hi) if hi != 0.0 => hi,
            _ => obs.temperature_c,
        };

        CurrentConditions {
            temperature: self.units.from_celsius(obs.temperature_c),
            feels_like: self.units.from_celsius(feels_like_c),
            humidity: obs.relative_humidity.clamp(0.0, 100.0) as u8,
            wind_speed: self.units.from_meters_per_second(obs.wind_speed_mps),
            condition: obs.description.clone(),
        }
    }

    /// Run the whole chain, treating `today` as the current local date.
    pub async fn fetch_weather_on(
        &self,
        coords: &Coordinates,
        today: NaiveDate,
    ) -> Result<WeatherSnapshot> {
        let grid = self.resolve_grid(coords).await?;
        if let Some(locality) = &grid.locality {
            tracing::debug!(%locality, "resolved NWS grid point");
        }

        let periods = self.fetch_periods(&grid).await?;
        let station = self.resolve_station(&grid).await?;
        tracing::debug!(%station, periods = periods.len(), "using observation station");
        let observation = self.fetch_observation(&station).await?;

        let mut daily = aggregate_daily(&periods, today);
        daily.truncate(MAX_FORECAST_DAYS);

        Ok(WeatherSnapshot {
            current: self.current_conditions(&observation),
            daily,
        })
    }
}

#[async_trait]
impl WeatherProvider for NwsProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Nws
    }

    async fn resolve_coordinates(&self, zip: &ZipCode) -> Result<Coordinates> {
        Ok(self.zip_table.resolve(zip))
    }

    async fn fetch_weather(&self, coords: &Coordinates) -> Result<WeatherSnapshot> {
        self.fetch_weather_on(coords, Local::now().date_naive()).await
    }
}

#[derive(Debug, Deserialize)]
struct PointsResponse {
    properties: PointsProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PointsProperties {
    forecast: String,
    forecast_hourly: Option<String>,
    observation_stations: String,
    relative_location: Option<RelativeLocation>,
}

#[derive(Debug, Deserialize)]
struct RelativeLocation {
    properties: RelativeLocationProperties,
}

#[derive(Debug, Deserialize)]
struct RelativeLocationProperties {
    city: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    properties: ForecastProperties,
}

#[derive(Debug, Deserialize)]
struct ForecastProperties {
    periods: Vec<ApiPeriod>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiPeriod {
    start_time: String,
    temperature: f64,
    temperature_unit: Option<String>,
    is_daytime: bool,
    #[serde(default)]
    short_forecast: String,
}

#[derive(Debug, Deserialize)]
struct StationsResponse {
    features: Vec<StationFeature>,
}

#[derive(Debug, Deserialize)]
struct StationFeature {
    properties: StationProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StationProperties {
    station_identifier: String,
}

#[derive(Debug, Deserialize)]
struct ObservationResponse {
    properties: ObservationProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObservationProperties {
    temperature: QuantitativeValue,
    #[serde(default)]
    wind_speed: QuantitativeValue,
    #[serde(default)]
    relative_humidity: QuantitativeValue,
    heat_index: Option<QuantitativeValue>,
    text_description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuantitativeValue {
    value: Option<f64>,
    unit_code: Option<String>,
}

impl QuantitativeValue {
    /// Wind speed in m/s; some stations report km/h instead.
    fn meters_per_second(&self) -> Option<f64> {
        let value = self.value?;
        match self.unit_code.as_deref() {
            Some(code) if code.ends_with("km_h-1") => Some(value / 3.6),
            _ => Some(value),
        }
    }
}
