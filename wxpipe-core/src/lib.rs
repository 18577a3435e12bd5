//! Core library for the `wxpipe` weather pipeline.
//!
//! This crate defines:
//! - The provider abstraction and its two strategies (OpenWeatherMap, api.weather.gov)
//! - Normalization of both wire formats into one [`WeatherSnapshot`]
//! - Daily min/max reconstruction from 12-hour forecast periods
//! - The per-ZIP batch pipeline, optional summaries, and on-disk configuration
//!
//! It is used by `wxpipe-cli`, but can also be reused by other binaries or services.

pub mod aggregate;
pub mod config;
pub mod error;
mod http;
pub mod model;
pub mod pipeline;
pub mod policy;
pub mod provider;
pub mod resolver;
pub mod summary;
pub mod units;
pub mod zip;

pub use aggregate::{ForecastPeriod, aggregate_daily};
pub use config::{Config, Credential, Service};
pub use error::{Result, WeatherError};
pub use model::{
    Coordinates, CurrentConditions, DailyForecast, MAX_FORECAST_DAYS, WeatherReport,
    WeatherSnapshot,
};
pub use pipeline::Pipeline;
pub use policy::UrlPolicy;
pub use provider::{ProviderId, ProviderSettings, WeatherProvider, select_provider};
pub use resolver::ZipTable;
pub use summary::Summarizer;
pub use units::UnitSystem;
pub use zip::ZipCode;
