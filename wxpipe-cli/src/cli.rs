use std::{io::Write, path::PathBuf, time::Duration};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode};
use tokio::time::MissedTickBehavior;
use wxpipe_core::{
    Config, Pipeline, ProviderSettings, Service, Summarizer, UnitSystem, ZipCode, select_provider,
};

use crate::{
    output::{self, OutputFormat},
    publish::KafkaPublisher,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "wxpipe", version, about = "Weather data pipeline for US ZIP codes")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store an API key for a service ("openweather" or "openai").
    Configure {
        /// Service short name.
        service: String,
    },

    /// Fetch current conditions and forecast for one or more ZIP codes.
    Fetch(FetchArgs),
}

#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Single ZIP code; ignored when --zip-codes is given.
    pub zip: Option<String>,

    /// Comma-separated list of ZIP codes.
    #[arg(long = "zip-codes", value_delimiter = ',')]
    pub zip_codes: Vec<String>,

    /// OpenWeatherMap API key. Without one, api.weather.gov is used.
    #[arg(long, env = "OWM_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Key for the forecast summary (text output only).
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Output file for json/csv (stdout if absent).
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Use metric units (°C, m/s).
    #[arg(long)]
    pub metric: bool,

    #[arg(long, default_value = "localhost:9092")]
    pub kafka_broker: String,

    #[arg(long, default_value = "weather-data")]
    pub kafka_topic: String,

    /// Polling interval in seconds (0 for a one-time run).
    #[arg(long, default_value_t = 0)]
    pub interval: u64,

    /// Enable debug logging.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Validated inputs for a fetch run. Built before any network activity.
#[derive(Debug)]
pub struct RunSettings {
    pub zips: Vec<ZipCode>,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
    pub units: UnitSystem,
    pub interval: Option<Duration>,
    pub publisher: Option<KafkaPublisher>,
    pub weather_key: Option<String>,
    pub summary_key: Option<String>,
    pub user_agent: String,
}

impl FetchArgs {
    pub fn into_settings(self, config: &Config) -> Result<RunSettings> {
        let listed: Vec<String> = self
            .zip_codes
            .into_iter()
            .filter(|z| !z.trim().is_empty())
            .collect();
        let raw_zips = if listed.is_empty() {
            self.zip.into_iter().collect()
        } else {
            listed
        };

        if raw_zips.is_empty() {
            bail!("at least one ZIP code is required (pass ZIP or --zip-codes)");
        }

        let zips = raw_zips
            .iter()
            .map(|raw| ZipCode::parse(raw))
            .collect::<Result<Vec<_>, _>>()
            .context("Configuration error")?;

        let publisher = match self.format {
            OutputFormat::Kafka => {
                if self.kafka_broker.trim().is_empty() {
                    bail!("kafka broker is required when using kafka output format");
                }
                Some(KafkaPublisher::new(self.kafka_broker, self.kafka_topic))
            }
            _ => None,
        };

        Ok(RunSettings {
            zips,
            format: self.format,
            output: self.output,
            units: if self.metric {
                UnitSystem::Metric
            } else {
                UnitSystem::Imperial
            },
            interval: (self.interval > 0).then(|| Duration::from_secs(self.interval)),
            publisher,
            weather_key: config
                .resolve_api_key(Service::OpenWeather, self.api_key.as_deref()),
            summary_key: config.resolve_api_key(Service::OpenAi, self.openai_api_key.as_deref()),
            user_agent: config.user_agent().to_string(),
        })
    }
}

impl Cli {
    pub fn verbose(&self) -> bool {
        matches!(&self.command, Command::Fetch(args) if args.verbose)
    }

    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure { service } => configure(&service),
            Command::Fetch(args) => {
                let config = Config::load()?;
                let settings = args.into_settings(&config)?;
                fetch(settings).await
            }
        }
    }
}

fn configure(service: &str) -> Result<()> {
    let service = Service::try_from(service)?;
    let mut config = Config::load()?;

    let api_key = Password::new(&format!("API key for {service}:"))
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    if api_key.trim().is_empty() {
        bail!("API key must not be empty");
    }

    config.upsert_api_key(service, api_key.trim().to_string());
    let path = config.save()?;
    println!("Saved {service} API key to {}", path.display());
    Ok(())
}

fn build_pipeline(settings: &RunSettings) -> Result<Pipeline> {
    let provider_settings = ProviderSettings {
        units: settings.units,
        user_agent: settings.user_agent.clone(),
        ..ProviderSettings::default()
    };
    let provider = select_provider(settings.weather_key.as_deref(), &provider_settings)?;
    let pipeline = Pipeline::new(provider, settings.units);
    tracing::info!(provider = %pipeline.provider_id(), "selected weather provider");

    if settings.format != OutputFormat::Text {
        return Ok(pipeline);
    }
    let summarizer = Summarizer::new(settings.summary_key.clone());
    if !summarizer.has_credential() {
        tracing::warn!("No OpenAI API key configured, forecast summaries will be placeholders");
    }
    Ok(pipeline.with_summarizer(summarizer))
}

async fn fetch(settings: RunSettings) -> Result<()> {
    let pipeline = build_pipeline(&settings)?;

    let Some(every) = settings.interval else {
        return run_once(&pipeline, &settings).await;
    };

    tracing::info!("Starting weather data pipeline. Fetching data every {every:?}");
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if let Err(e) = run_once(&pipeline, &settings).await {
            tracing::error!("Run failed: {e:#}");
        }
    }
}

/// One pass over every ZIP code: per-report sinks fire as reports arrive,
/// batch formats are written at the end.
async fn run_once(pipeline: &Pipeline, settings: &RunSettings) -> Result<()> {
    let reports = pipeline
        .run_batch(&settings.zips, |report| match settings.format {
            OutputFormat::Text => {
                if let Err(e) = output::write_text(&mut std::io::stdout().lock(), report) {
                    tracing::warn!("Failed to write report for {}: {e}", report.location_id);
                }
            }
            OutputFormat::Kafka => {
                if let Some(publisher) = &settings.publisher {
                    if let Err(e) = publisher.publish(report) {
                        tracing::warn!("{e:#}");
                    }
                }
            }
            OutputFormat::Json | OutputFormat::Csv => {}
        })
        .await;

    if reports.is_empty() || !settings.format.is_batch() {
        return Ok(());
    }

    let mut out = output::open_destination(settings.output.as_deref())?;
    match settings.format {
        OutputFormat::Json => output::write_json(&mut out, &reports)?,
        OutputFormat::Csv => output::write_csv(&mut out, &reports).context("Failed to write CSV")?,
        OutputFormat::Text | OutputFormat::Kafka => {}
    }
    out.flush().context("Failed to flush output")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use wxpipe_core::ProviderId;

    fn fetch_args(argv: &[&str]) -> FetchArgs {
        let mut full = vec!["wxpipe", "fetch"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).unwrap().command {
            Command::Fetch(args) => args,
            other => panic!("expected fetch, got {other:?}"),
        }
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn zip_code_list_wins_over_positional() {
        let settings = fetch_args(&["77001", "--zip-codes", "90210,02108"])
            .into_settings(&Config::default())
            .unwrap();
        let zips: Vec<_> = settings.zips.iter().map(ZipCode::as_str).collect();
        assert_eq!(zips, vec!["90210", "02108"]);
    }

    #[test]
    fn positional_zip_is_used_alone() {
        let settings = fetch_args(&["60601"]).into_settings(&Config::default()).unwrap();
        assert_eq!(settings.zips.len(), 1);
        assert_eq!(settings.format, OutputFormat::Text);
        assert_eq!(settings.units, UnitSystem::Imperial);
        assert!(settings.interval.is_none());
        assert!(settings.publisher.is_none());
    }

    #[test]
    fn empty_zip_code_list_falls_back_to_positional() {
        let settings = fetch_args(&["60601", "--zip-codes", ""])
            .into_settings(&Config::default())
            .unwrap();
        let zips: Vec<_> = settings.zips.iter().map(ZipCode::as_str).collect();
        assert_eq!(zips, vec!["60601"]);

        let settings = fetch_args(&["--zip-codes", "90210,,02108,"])
            .into_settings(&Config::default())
            .unwrap();
        assert_eq!(settings.zips.len(), 2);

        let err = fetch_args(&["--zip-codes", ""])
            .into_settings(&Config::default())
            .unwrap_err();
        assert!(err.to_string().contains("at least one ZIP code"));
    }

    #[test]
    fn pipeline_follows_credential() {
        let mut settings = fetch_args(&["10001", "--format", "json"])
            .into_settings(&Config::default())
            .unwrap();
        settings.weather_key = None;
        assert_eq!(build_pipeline(&settings).unwrap().provider_id(), ProviderId::Nws);

        settings.weather_key = Some("KEY".to_string());
        assert_eq!(
            build_pipeline(&settings).unwrap().provider_id(),
            ProviderId::OpenWeather
        );
    }

    #[test]
    fn missing_zip_is_rejected() {
        let err = fetch_args(&[]).into_settings(&Config::default()).unwrap_err();
        assert!(err.to_string().contains("at least one ZIP code"));
    }

    #[test]
    fn malformed_zip_is_rejected() {
        let err = fetch_args(&["--zip-codes", "90210,9021"])
            .into_settings(&Config::default())
            .unwrap_err();
        assert!(format!("{err:#}").contains("invalid ZIP code format: 9021"));
    }

    #[test]
    fn kafka_needs_a_broker() {
        let err = fetch_args(&["10001", "--format", "kafka", "--kafka-broker", ""])
            .into_settings(&Config::default())
            .unwrap_err();
        assert!(err.to_string().contains("kafka broker is required"));

        let ok = fetch_args(&["10001", "--format", "kafka"])
            .into_settings(&Config::default())
            .unwrap();
        assert_eq!(ok.publisher.map(|p| p.topic().to_string()).as_deref(), Some("weather-data"));
    }

    #[test]
    fn flags_map_to_settings() {
        let settings = fetch_args(&[
            "10001",
            "--metric",
            "--format",
            "csv",
            "--output",
            "out.csv",
            "--interval",
            "300",
            "--api-key",
            "FLAG_KEY",
        ])
        .into_settings(&Config::default())
        .unwrap();

        assert_eq!(settings.units, UnitSystem::Metric);
        assert_eq!(settings.format, OutputFormat::Csv);
        assert_eq!(settings.output, Some(PathBuf::from("out.csv")));
        assert_eq!(settings.interval, Some(Duration::from_secs(300)));
        assert_eq!(settings.weather_key.as_deref(), Some("FLAG_KEY"));
    }

    #[test]
    fn stored_user_agent_is_carried() {
        let config = Config {
            user_agent: Some("acme/1.0 (ops@acme.test)".to_string()),
            ..Config::default()
        };
        let settings = fetch_args(&["10001"]).into_settings(&config).unwrap();
        assert_eq!(settings.user_agent, "acme/1.0 (ops@acme.test)");
    }

    #[test]
    fn verbose_only_applies_to_fetch() {
        let cli = Cli::try_parse_from(["wxpipe", "fetch", "10001", "-v"]).unwrap();
        assert!(cli.verbose());
        let cli = Cli::try_parse_from(["wxpipe", "configure", "openai"]).unwrap();
        assert!(!cli.verbose());
    }
}
