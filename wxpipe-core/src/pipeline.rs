//! Per-ZIP acquisition loop shared by every front end.

use chrono::Utc;

use crate::{
    error::Result,
    model::WeatherReport,
    provider::{ProviderId, WeatherProvider},
    summary::Summarizer,
    units::UnitSystem,
    zip::ZipCode,
};

#[derive(Debug)]
pub struct Pipeline {
    provider: Box<dyn WeatherProvider>,
    summarizer: Option<Summarizer>,
    units: UnitSystem,
}

impl Pipeline {
    pub fn new(provider: Box<dyn WeatherProvider>, units: UnitSystem) -> Self {
        Self {
            provider,
            summarizer: None,
            units,
        }
    }

    /// Attach a prose summary to every report.
    pub fn with_summarizer(mut self, summarizer: Summarizer) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    pub fn provider_id(&self) -> ProviderId {
        self.provider.id()
    }

    /// Resolve, fetch and (optionally) summarize one ZIP code.
    pub async fn report_for(&self, zip: &ZipCode) -> Result<WeatherReport> {
        let coords = self.provider.resolve_coordinates(zip).await?;
        tracing::debug!(%zip, name = %coords.resolved_name, lat = coords.latitude, lon = coords.longitude, "resolved coordinates");

        let snapshot = self.provider.fetch_weather(&coords).await?;

        let mut report = WeatherReport {
            location_id: zip.clone(),
            location_name: coords.resolved_name,
            timestamp: Utc::now(),
            provider: self.provider.id().to_string(),
            units: self.units,
            snapshot,
            summary: None,
        };

        if let Some(summarizer) = &self.summarizer {
            tracing::debug!(%zip, "generating summary");
            report.summary = Some(summarizer.summarize(&report.forecast_text()).await);
        }

        Ok(report)
    }

    /// Process `zips` in order. A failing ZIP is logged and skipped; every
    /// successful report is passed to `on_report` as soon as it exists and
    /// also returned.
    pub async fn run_batch<F>(&self, zips: &[ZipCode], mut on_report: F) -> Vec<WeatherReport>
    where
        F: FnMut(&WeatherReport),
    {
        let mut reports = Vec::with_capacity(zips.len());

        for zip in zips {
            tracing::debug!(%zip, provider = %self.provider.id(), "processing ZIP code");
            match self.report_for(zip).await {
                Ok(report) => {
                    tracing::info!(%zip, name = %report.location_name, "fetched weather");
                    on_report(&report);
                    reports.push(report);
                }
                Err(e) => tracing::warn!(%zip, "Error processing {zip}: {e}"),
            }
        }

        reports
    }
}
