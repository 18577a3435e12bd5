use std::{
    borrow::Cow,
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

use anyhow::{Context, Result};
use chrono::SecondsFormat;
use clap::ValueEnum;
use wxpipe_core::WeatherReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable, one block per ZIP code, with an AI summary.
    Text,
    /// Pretty JSON once the batch completes.
    Json,
    /// CSV of current conditions once the batch completes.
    Csv,
    /// Hand each report to the message-queue publisher.
    Kafka,
}

impl OutputFormat {
    /// Formats written once per batch instead of once per report.
    pub fn is_batch(&self) -> bool {
        matches!(self, OutputFormat::Json | OutputFormat::Csv)
    }
}

/// File at `path` (created or truncated), or stdout when absent.
pub fn open_destination(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(io::stdout().lock())),
    }
}

pub fn write_text<W: Write>(out: &mut W, report: &WeatherReport) -> io::Result<()> {
    let unit = report.units.temperature_symbol();
    let wind_unit = report.units.wind_symbol();
    let current = &report.snapshot.current;

    writeln!(
        out,
        "\n📍 Weather for {} (ZIP: {})",
        report.location_name, report.location_id
    )?;
    writeln!(out, "-----------------------------------")?;
    writeln!(
        out,
        "Now: {:.1}{unit}, feels like {:.1}{unit}, {}",
        current.temperature, current.feels_like, current.condition
    )?;
    writeln!(
        out,
        "Humidity: {}%, Wind: {:.1} {wind_unit}",
        current.humidity, current.wind_speed
    )?;

    writeln!(out, "\n📆 Forecast:")?;
    for day in &report.snapshot.daily {
        writeln!(
            out,
            "{}: Min {:.1}{unit}, Max {:.1}{unit}, {}",
            day.date.format("%a %b %-d"),
            day.temp_min,
            day.temp_max,
            day.condition
        )?;
    }

    if let Some(summary) = report.summary.as_deref().filter(|s| !s.is_empty()) {
        writeln!(out, "\n📝 AI-Generated Forecast:")?;
        writeln!(out, "{summary}")?;
    }

    Ok(())
}

/// A lone report is written as an object, several as an array.
pub fn write_json<W: Write>(out: &mut W, reports: &[WeatherReport]) -> Result<()> {
    let encoded = match reports {
        [single] => serde_json::to_writer_pretty(&mut *out, single),
        many => serde_json::to_writer_pretty(&mut *out, many),
    };
    encoded.context("Failed to encode JSON")?;
    writeln!(out)?;
    Ok(())
}

const CSV_HEADER: [&str; 9] = [
    "location_id",
    "location_name",
    "timestamp",
    "temperature",
    "feels_like",
    "humidity",
    "wind_speed",
    "condition",
    "is_metric",
];

pub fn write_csv<W: Write>(out: &mut W, reports: &[WeatherReport]) -> io::Result<()> {
    writeln!(out, "{}", CSV_HEADER.join(","))?;

    for report in reports {
        let current = &report.snapshot.current;
        let row = [
            report.location_id.to_string(),
            report.location_name.clone(),
            report.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            format!("{:.1}", current.temperature),
            format!("{:.1}", current.feels_like),
            current.humidity.to_string(),
            format!("{:.1}", current.wind_speed),
            current.condition.clone(),
            report.units.is_metric().to_string(),
        ];
        let fields: Vec<_> = row.iter().map(|f| csv_field(f)).collect();
        writeln!(out, "{}", fields.join(","))?;
    }

    out.flush()
}

fn csv_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}
