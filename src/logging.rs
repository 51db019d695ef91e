//! Structured logging initialization.
//!
//! Every component logs through `tracing` with structured fields
//! (`request_id`, `path`, `client_ip`, `handler_name`, `status`). This module
//! installs the subscriber that turns those events into output:
//! - Profiles (`GATEHOUSE_LOG_PROFILE=cli|dev|prod`) with per-variable overrides
//! - JSON for production, pretty-print for development
//! - `EnvFilter` level and per-target directives
//! - Sampling of info/debug events (warnings and errors are always kept)
//! - Output on stderr, optionally through a non-blocking `tracing-appender` writer
//!
//! Session tokens, cookies and nonces are never passed to the logger.

use anyhow::{Context, Result};
use std::env;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::Level;
use tracing::{Metadata, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::{Context as LayerContext, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Log format: JSON for production, pretty-print for development
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }
}

/// Sampling mode: how to decide which events to emit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingMode {
    /// Emit everything
    All,
    /// Emit only WARN and ERROR
    ErrorOnly,
    /// Sample info/debug events, keep all warnings and errors
    Sampled,
}

impl SamplingMode {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "error-only" | "error_only" => SamplingMode::ErrorOnly,
            "sampled" => SamplingMode::Sampled,
            _ => SamplingMode::All,
        }
    }
}

/// Baseline settings selected by `GATEHOUSE_LOG_PROFILE`.
///
/// Individual `GATEHOUSE_LOG_*` variables override whatever the profile picks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogProfile {
    /// One-shot command output on stdout stays readable: warnings only, pretty
    #[default]
    Cli,
    /// Pretty, debug, everything, with source locations
    Dev,
    /// JSON, info, 10% of non-error events, non-blocking writer
    Prod,
}

impl LogProfile {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "dev" | "development" => LogProfile::Dev,
            "prod" | "production" => LogProfile::Prod,
            _ => LogProfile::Cli,
        }
    }

    #[must_use]
    pub fn defaults(self) -> LogConfig {
        match self {
            LogProfile::Cli => LogConfig {
                log_level: "warn".to_string(),
                format: LogFormat::Pretty,
                sampling_mode: SamplingMode::All,
                sampling_rate: 1.0,
                async_logging: false,
                target_filter: None,
                include_location: false,
            },
            LogProfile::Dev => LogConfig {
                log_level: "debug".to_string(),
                format: LogFormat::Pretty,
                sampling_mode: SamplingMode::All,
                sampling_rate: 1.0,
                async_logging: false,
                target_filter: None,
                include_location: true,
            },
            LogProfile::Prod => LogConfig {
                log_level: "info".to_string(),
                format: LogFormat::Json,
                sampling_mode: SamplingMode::Sampled,
                sampling_rate: 0.1,
                async_logging: true,
                target_filter: None,
                include_location: false,
            },
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq)]
pub struct LogConfig {
    /// Log level: trace/debug/info/warn/error
    pub log_level: String,
    /// Log format: json/pretty
    pub format: LogFormat,
    /// Sampling mode: all/error-only/sampled
    pub sampling_mode: SamplingMode,
    /// Fraction (0.0-1.0) of info/debug events kept in Sampled mode
    pub sampling_rate: f64,
    /// Write through a non-blocking background writer
    pub async_logging: bool,
    /// Extra `EnvFilter` directives (comma-separated)
    pub target_filter: Option<String>,
    /// Include file:line location
    pub include_location: bool,
}

impl LogConfig {
    /// Read `GATEHOUSE_LOG_PROFILE` and the `GATEHOUSE_LOG_*` overrides from the environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let profile = lookup("GATEHOUSE_LOG_PROFILE")
            .map(|p| LogProfile::parse(&p))
            .unwrap_or_default();
        let mut config = profile.defaults();
        let flag = |key: &str| lookup(key).and_then(|s| s.parse::<bool>().ok());

        if let Some(level) = lookup("GATEHOUSE_LOG_LEVEL") {
            config.log_level = level;
        }
        if let Some(format) = lookup("GATEHOUSE_LOG_FORMAT") {
            config.format = LogFormat::parse(&format);
        }
        if let Some(mode) = lookup("GATEHOUSE_LOG_SAMPLING_MODE") {
            config.sampling_mode = SamplingMode::parse(&mode);
        }
        if let Some(rate) = lookup("GATEHOUSE_LOG_SAMPLING_RATE").and_then(|s| s.parse().ok()) {
            config.sampling_rate = rate;
        }
        if let Some(async_logging) = flag("GATEHOUSE_LOG_ASYNC") {
            config.async_logging = async_logging;
        }
        if let Some(filter) = lookup("GATEHOUSE_LOG_TARGET_FILTER") {
            config.target_filter = Some(filter);
        }
        if let Some(include_location) = flag("GATEHOUSE_LOG_INCLUDE_LOCATION") {
            config.include_location = include_location;
        }
        config
    }
}

/// Sampling layer: decides whether to emit an event based on sampling rules
pub struct SamplingLayer {
    mode: SamplingMode,
    sampling_rate: f64,
    counter: AtomicU64,
}

impl SamplingLayer {
    pub fn new(mode: SamplingMode, sampling_rate: f64) -> Self {
        Self {
            mode,
            sampling_rate: sampling_rate.clamp(0.0, 1.0),
            counter: AtomicU64::new(0),
        }
    }

    fn should_sample(&self, metadata: &Metadata<'_>) -> bool {
        // Spans must stay enabled or events inside them lose their context.
        if metadata.is_span() {
            return true;
        }
        let severe = matches!(metadata.level(), &Level::WARN | &Level::ERROR);
        match self.mode {
            SamplingMode::All => true,
            SamplingMode::ErrorOnly => severe,
            SamplingMode::Sampled => {
                if severe {
                    return true;
                }
                if self.sampling_rate <= 0.0 {
                    return false;
                }
                let count = self.counter.fetch_add(1, Ordering::Relaxed);
                let interval = (1.0 / self.sampling_rate) as u64;
                interval > 0 && count % interval == 0
            }
        }
    }
}

impl<S> Layer<S> for SamplingLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn enabled(&self, metadata: &Metadata<'_>, _ctx: LayerContext<'_, S>) -> bool {
        self.should_sample(metadata)
    }
}

fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Install the global subscriber described by `config`.
///
/// With `async_logging` the returned guard owns the background writer; keep it
/// alive until exit or buffered events are lost. Fails if a global subscriber
/// is already installed.
///
/// # Example
///
/// ```no_run
/// use gatehouse::logging::{init_logging_with_config, LogConfig};
///
/// let _guard = init_logging_with_config(&LogConfig::from_env())?;
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn init_logging_with_config(config: &LogConfig) -> Result<Option<WorkerGuard>> {
    let level = parse_level(&config.log_level);

    let mut env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    if let Some(target_filter) = &config.target_filter {
        for filter in target_filter.split(',').map(str::trim).filter(|f| !f.is_empty()) {
            match filter.parse() {
                Ok(directive) => env_filter = env_filter.add_directive(directive),
                Err(_) => eprintln!("Warning: Invalid log filter directive: {filter}"),
            }
        }
    }

    let (writer, guard) = if config.async_logging {
        let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());
        (BoxMakeWriter::new(writer), Some(guard))
    } else {
        (BoxMakeWriter::new(std::io::stderr), None)
    };

    let fmt_layer = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_thread_ids(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(writer)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .pretty()
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(writer)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(SamplingLayer::new(config.sampling_mode, config.sampling_rate))
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse("PRETTY"), LogFormat::Pretty);
        assert_eq!(LogFormat::parse("invalid"), LogFormat::Json);
    }

    #[test]
    fn test_sampling_mode_parse() {
        assert_eq!(SamplingMode::parse("all"), SamplingMode::All);
        assert_eq!(SamplingMode::parse("error-only"), SamplingMode::ErrorOnly);
        assert_eq!(SamplingMode::parse("error_only"), SamplingMode::ErrorOnly);
        assert_eq!(SamplingMode::parse("sampled"), SamplingMode::Sampled);
        assert_eq!(SamplingMode::parse("bogus"), SamplingMode::All);
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("TRACE"), Level::TRACE);
        assert_eq!(parse_level("warn"), Level::WARN);
        assert_eq!(parse_level("verbose"), Level::INFO);
    }

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key: &str| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_cli_profile_is_default() {
        let config = LogConfig::from_lookup(lookup(&[]));
        assert_eq!(config, LogProfile::Cli.defaults());
        assert_eq!(config.log_level, "warn");
        assert!(!config.async_logging);
    }

    #[test]
    fn test_prod_profile() {
        let config = LogConfig::from_lookup(lookup(&[("GATEHOUSE_LOG_PROFILE", "prod")]));
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.sampling_mode, SamplingMode::Sampled);
        assert!(config.async_logging);
        assert!(!config.include_location);
    }

    #[test]
    fn test_variables_override_profile() {
        let config = LogConfig::from_lookup(lookup(&[
            ("GATEHOUSE_LOG_PROFILE", "dev"),
            ("GATEHOUSE_LOG_LEVEL", "trace"),
            ("GATEHOUSE_LOG_FORMAT", "json"),
            ("GATEHOUSE_LOG_INCLUDE_LOCATION", "false"),
            ("GATEHOUSE_LOG_SAMPLING_RATE", "not-a-number"),
            ("GATEHOUSE_LOG_TARGET_FILTER", "gatehouse::router=debug"),
        ]));
        assert_eq!(config.log_level, "trace");
        assert_eq!(config.format, LogFormat::Json);
        assert!(!config.include_location);
        assert_eq!(config.sampling_rate, 1.0);
        assert_eq!(config.target_filter.as_deref(), Some("gatehouse::router=debug"));
    }

    #[test]
    fn test_profile_parse() {
        assert_eq!(LogProfile::parse("PROD"), LogProfile::Prod);
        assert_eq!(LogProfile::parse("development"), LogProfile::Dev);
        assert_eq!(LogProfile::parse("anything"), LogProfile::Cli);
    }
}
