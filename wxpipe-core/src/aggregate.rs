//! Rebuilds daily min/max buckets from 12-hour forecast periods.
//!
//! Daytime periods carry the day's high and its representative condition,
//! nighttime periods carry the low. The first period seen for a date seeds
//! both bounds, later periods can only widen them, so `temp_min <= temp_max`
//! holds for every bucket.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate};

use crate::model::DailyForecast;

/// One forecast interval as the aggregator sees it. Temperatures are already
/// in the caller's unit system.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastPeriod {
    pub start_time: String,
    pub temperature: f64,
    pub is_daytime: bool,
    pub short_forecast: String,
}

struct DayBucket {
    min: f64,
    max: f64,
    condition: String,
}

impl DayBucket {
    fn seed(period: &ForecastPeriod) -> Self {
        Self {
            min: period.temperature,
            max: period.temperature,
            condition: period.short_forecast.clone(),
        }
    }

    fn absorb(&mut self, period: &ForecastPeriod) {
        if period.is_daytime {
            if period.temperature > self.max {
                self.max = period.temperature;
                self.condition = period.short_forecast.clone();
            }
        } else if period.temperature < self.min {
            self.min = period.temperature;
        }
    }

    fn into_forecast(self, date: NaiveDate) -> DailyForecast {
        DailyForecast {
            date,
            temp_min: self.min,
            temp_max: self.max,
            condition: self.condition,
        }
    }
}

/// Calendar date of an RFC 3339 timestamp, in the offset the timestamp carries.
fn period_date(start_time: &str) -> Option<NaiveDate> {
    DateTime::parse_from_rfc3339(start_time)
        .ok()
        .map(|dt| dt.date_naive())
}

/// Group `periods` into one entry per calendar date.
///
/// `today` is placed first when present; the remaining dates follow in
/// ascending order. Periods whose start time does not parse are dropped.
pub fn aggregate_daily(periods: &[ForecastPeriod], today: NaiveDate) -> Vec<DailyForecast> {
    let mut days: BTreeMap<NaiveDate, DayBucket> = BTreeMap::new();

    for period in periods {
        let Some(date) = period_date(&period.start_time) else {
            tracing::trace!(start_time = %period.start_time, "skipping period with unparsable start time");
            continue;
        };

        days.entry(date)
            .and_modify(|bucket| bucket.absorb(period))
            .or_insert_with(|| DayBucket::seed(period));
    }

    let mut out = Vec::with_capacity(days.len());
    if let Some(bucket) = days.remove(&today) {
        out.push(bucket.into_forecast(today));
    }
    out.extend(
        days.into_iter()
            .map(|(date, bucket)| bucket.into_forecast(date)),
    );
    out
}
