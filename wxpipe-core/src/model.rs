use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{units::UnitSystem, zip::ZipCode};

/// Upper bound on daily entries carried by a snapshot.
pub const MAX_FORECAST_DAYS: usize = 7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
    pub resolved_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temperature: f64,
    pub feels_like: f64,
    /// Relative humidity, 0-100.
    pub humidity: u8,
    pub wind_speed: f64,
    pub condition: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub temp_min: f64,
    pub temp_max: f64,
    pub condition: String,
}

/// Provider-agnostic weather for one location at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub current: CurrentConditions,
    pub daily: Vec<DailyForecast>,
}

/// A snapshot bound to the ZIP code it was fetched for, ready for output.
#[derive(Debug, Clone, Serialize)]
pub struct WeatherReport {
    pub location_id: ZipCode,
    pub location_name: String,
    pub timestamp: DateTime<Utc>,
    pub provider: String,
    pub units: UnitSystem,
    #[serde(flatten)]
    pub snapshot: WeatherSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl WeatherReport {
    /// Plain-text digest of the report, used as summarizer input.
    pub fn forecast_text(&self) -> String {
        let unit = self.units.temperature_symbol();
        let wind_unit = self.units.wind_symbol();
        let current = &self.snapshot.current;

        let mut out = format!(
            "Location: {} (ZIP: {})\n",
            self.location_name, self.location_id
        );
        out.push_str(&format!(
            "Now: {:.1}{unit}, feels like {:.1}{unit}, {}\n",
            current.temperature, current.feels_like, current.condition
        ));
        out.push_str(&format!(
            "Humidity: {}%, Wind: {:.1} {wind_unit}\n",
            current.humidity, current.wind_speed
        ));
        out.push_str("7-Day Forecast:\n");
        for day in &self.snapshot.daily {
            out.push_str(&format!(
                "{}: Min {:.1}{unit}, Max {:.1}{unit}, {}\n",
                day.date.format("%a %b %-d"),
                day.temp_min,
                day.temp_max,
                day.condition
            ));
        }
        out
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn snapshot() -> WeatherSnapshot {
        WeatherSnapshot {
            current: CurrentConditions {
                temperature: 72.0,
                feels_like: 70.5,
                humidity: 40,
                wind_speed: 5.0,
                condition: "clear sky".to_string(),
            },
            daily: vec![
                DailyForecast {
                    date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                    temp_min: 55.0,
                    temp_max: 70.0,
                    condition: "Sunny".to_string(),
                },
                DailyForecast {
                    date: NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
                    temp_min: 50.0,
                    temp_max: 61.0,
                    condition: "Rain Showers".to_string(),
                },
            ],
        }
    }

    pub fn report() -> WeatherReport {
        WeatherReport {
            location_id: ZipCode::parse("90210").unwrap(),
            location_name: "Beverly Hills".to_string(),
            timestamp: DateTime::parse_from_rfc3339("2024-01-02T15:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            provider: "nws".to_string(),
            units: UnitSystem::Imperial,
            snapshot: snapshot(),
            summary: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forecast_text_lists_current_and_days() {
        let text = fixtures::report().forecast_text();
        let expected = "Location: Beverly Hills (ZIP: 90210)\n\
                        Now: 72.0°F, feels like 70.5°F, clear sky\n\
                        Humidity: 40%, Wind: 5.0 mph\n\
                        7-Day Forecast:\n\
                        Tue Jan 2: Min 55.0°F, Max 70.0°F, Sunny\n\
                        Wed Jan 3: Min 50.0°F, Max 61.0°F, Rain Showers\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn forecast_text_uses_metric_symbols() {
        let mut report = fixtures::report();
        report.units = UnitSystem::Metric;
        let text = report.forecast_text();
        assert!(text.contains("°C"));
        assert!(text.contains("m/s"));
        assert!(!text.contains("mph"));
    }

    #[test]
    fn report_serializes_flat_and_omits_missing_summary() {
        let json = serde_json::to_value(fixtures::report()).unwrap();
        assert_eq!(json["location_id"], "90210");
        assert_eq!(json["units"], "imperial");
        assert_eq!(json["current"]["humidity"], 40);
        assert_eq!(json["daily"][0]["date"], "2024-01-02");
        assert!(json.get("summary").is_none());
    }
}
