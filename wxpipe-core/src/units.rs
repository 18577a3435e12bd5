use serde::{Deserialize, Serialize};

/// Unit system the caller wants every temperature and wind speed expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    /// °F and mph.
    #[default]
    Imperial,
    /// °C and m/s.
    Metric,
}

impl UnitSystem {
    /// Value of the `units` query parameter understood by OpenWeatherMap.
    pub fn as_query(&self) -> &'static str {
        match self {
            UnitSystem::Imperial => "imperial",
            UnitSystem::Metric => "metric",
        }
    }

    pub fn temperature_symbol(&self) -> &'static str {
        match self {
            UnitSystem::Imperial => "°F",
            UnitSystem::Metric => "°C",
        }
    }

    pub fn wind_symbol(&self) -> &'static str {
        match self {
            UnitSystem::Imperial => "mph",
            UnitSystem::Metric => "m/s",
        }
    }

    pub fn is_metric(&self) -> bool {
        matches!(self, UnitSystem::Metric)
    }

    /// Express a Celsius reading in this unit system.
    pub fn from_celsius(&self, celsius: f64) -> f64 {
        match self {
            UnitSystem::Imperial => celsius_to_fahrenheit(celsius),
            UnitSystem::Metric => celsius,
        }
    }

    /// Express a Fahrenheit reading in this unit system.
    pub fn from_fahrenheit(&self, fahrenheit: f64) -> f64 {
        match self {
            UnitSystem::Imperial => fahrenheit,
            UnitSystem::Metric => fahrenheit_to_celsius(fahrenheit),
        }
    }

    /// Express a meters-per-second wind speed in this unit system.
    pub fn from_meters_per_second(&self, mps: f64) -> f64 {
        match self {
            UnitSystem::Imperial => mps_to_mph(mps),
            UnitSystem::Metric => mps,
        }
    }
}

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

pub fn fahrenheit_to_celsius(fahrenheit: f64) -> f64 {
    (fahrenheit - 32.0) * 5.0 / 9.0
}

/// Approximate factor used upstream; kept as is so figures line up with the NWS site.
const MPS_TO_MPH: f64 = 2.237;

pub fn mps_to_mph(mps: f64) -> f64 {
    mps * MPS_TO_MPH
}
