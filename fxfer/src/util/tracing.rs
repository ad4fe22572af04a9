//! Diagnostic logging to stderr and an optional log file
// (c) 2025 fxfer developers

use std::{
    fs::File,
    sync::Arc,
    sync::atomic::{AtomicBool, Ordering},
};

use anyhow::Context as _;
use serde::{Deserialize, Serialize, de};
use strum::VariantNames as _;
use tracing_subscriber::{
    EnvFilter,
    fmt::{
        MakeWriter,
        time::{ChronoLocal, ChronoUtc},
    },
    prelude::*,
};

static TRACING_INITIALIZED: AtomicBool = AtomicBool::new(false);

const FRIENDLY_FORMAT_LOCAL: &str = "%Y-%m-%d %H:%M:%SL";
const FRIENDLY_FORMAT_UTC: &str = "%Y-%m-%d %H:%M:%SZ";

/// Overrides the console filter
const STANDARD_ENV_VAR: &str = "RUST_LOG";
/// Overrides the log file filter
const LOG_FILE_DETAIL_ENV_VAR: &str = "RUST_LOG_FILE_DETAIL";

/// `--debug` wins over `--quiet`
pub(crate) fn trace_level(args: &crate::client::Parameters) -> &'static str {
    if args.debug {
        "debug"
    } else if args.quiet {
        "error"
    } else {
        "info"
    }
}

/// Time stamp style for log lines
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    Eq,
    PartialEq,
    strum::Display,
    strum::EnumString,
    strum::VariantNames,
    clap::ValueEnum,
    Serialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "kebab-case")]
pub enum TimeFormat {
    /// `2025-01-31 17:05:09L`
    #[default]
    Local,
    /// `2025-01-31 17:05:09Z`
    Utc,
    /// RFC 3339 with offset
    Rfc3339,
}

impl<'de> Deserialize<'de> for TimeFormat {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let lower = s.to_ascii_lowercase();
        std::str::FromStr::from_str(&lower)
            .map_err(|_| de::Error::unknown_variant(&s, TimeFormat::VARIANTS))
    }
}

/// Whether log lines go to the console
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConsoleTraceType {
    Standard,
    #[allow(dead_code)] // file-only logging is exercised in tests
    None,
}

struct Filter {
    filter: EnvFilter,
    /// Came from the environment, so may admit other crates' events
    from_env: bool,
}

/// `key` from the environment if set, otherwise fxfer's own events at `trace_level`.
/// A set but unparseable `key` is an error.
fn filter_for(trace_level: &str, key: &str) -> anyhow::Result<Filter> {
    EnvFilter::try_from_env(key)
        .map(|filter| Filter {
            filter,
            from_env: true,
        })
        .or_else(|e| {
            if std::env::var(key).is_ok() {
                anyhow::bail!("{key} (set in environment) was not understood: {e}");
            }
            Ok(Filter {
                filter: EnvFilter::try_new(format!("fxfer={trace_level}"))?,
                from_env: false,
            })
        })
}

fn make_tracing_layer<S, W, F>(
    writer: W,
    filter: F,
    time_format: TimeFormat,
    show_target: bool,
    ansi: bool,
) -> Box<dyn tracing_subscriber::Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    W: for<'writer> MakeWriter<'writer> + 'static + Sync + Send,
    F: tracing_subscriber::layer::Filter<S> + 'static + Sync + Send,
{
    let layer = tracing_subscriber::fmt::layer::<S>()
        .compact()
        .with_target(show_target)
        .with_ansi(ansi);

    // with_timer changes the layer type, so each arm finishes the chain itself
    match time_format {
        TimeFormat::Local => layer
            .with_timer(ChronoLocal::new(FRIENDLY_FORMAT_LOCAL.into()))
            .with_writer(writer)
            .with_filter(filter)
            .boxed(),
        TimeFormat::Utc => layer
            .with_timer(ChronoUtc::new(FRIENDLY_FORMAT_UTC.into()))
            .with_writer(writer)
            .with_filter(filter)
            .boxed(),
        TimeFormat::Rfc3339 => layer
            .with_timer(ChronoLocal::rfc_3339())
            .with_writer(writer)
            .with_filter(filter)
            .boxed(),
    }
}

/// Installs the global subscriber. Later calls are ignored with a warning.
///
/// On error nothing is installed, so the caller must report it without `tracing`.
pub(crate) fn setup(
    trace_level: &str,
    display: ConsoleTraceType,
    log_file: Option<&String>,
    time_format: TimeFormat,
    ansi_colours: bool,
) -> anyhow::Result<()> {
    if is_initialized() {
        tracing::warn!("logging is already set up; ignoring");
        return Ok(());
    }
    TRACING_INITIALIZED.store(true, Ordering::Relaxed);

    let layers = build_layers(trace_level, display, log_file, time_format, ansi_colours)?;
    tracing_subscriber::registry().with(layers).init();

    Ok(())
}

fn build_layers(
    trace_level: &str,
    display: ConsoleTraceType,
    log_file: Option<&String>,
    time_format: TimeFormat,
    ansi_colours: bool,
) -> anyhow::Result<
    Vec<Box<dyn tracing_subscriber::Layer<tracing_subscriber::Registry> + Send + Sync>>,
> {
    let mut layers = Vec::new();

    // Targets are only shown when other crates may be logging too
    let console = filter_for(trace_level, STANDARD_ENV_VAR)?;
    if display == ConsoleTraceType::Standard {
        layers.push(make_tracing_layer(
            std::io::stderr,
            console.filter,
            time_format,
            console.from_env,
            ansi_colours,
        ));
    }

    if let Some(filename) = log_file {
        let file = Arc::new(
            File::create(filename).with_context(|| format!("could not create log file {filename}"))?,
        );
        let key = if std::env::var(LOG_FILE_DETAIL_ENV_VAR).is_ok() {
            LOG_FILE_DETAIL_ENV_VAR
        } else {
            STANDARD_ENV_VAR
        };
        let detail = filter_for(trace_level, key)?;
        layers.push(make_tracing_layer(
            file,
            detail.filter,
            time_format,
            detail.from_env,
            false,
        ));
    }

    Ok(layers)
}

pub(crate) fn is_initialized() -> bool {
    TRACING_INITIALIZED.load(Ordering::Relaxed)
}
