use clap::ValueEnum;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::settings::{LogFormat, LoggingConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match *self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Initialize tracing with the desired config.
pub fn init_logging(cfg: &LoggingConfig) {
    let env_filter = EnvFilter::try_new(&cfg.level).unwrap_or_else(|_| EnvFilter::new("info"));

    // Base layer: filter + writer
    let registry = tracing_subscriber::registry().with(env_filter);

    // Choose format layer
    match cfg.format {
        LogFormat::Json => {
            let layer = fmt::layer()
                .json()
                .with_timer(UtcTime::rfc_3339())
                .flatten_event(true) // flattens fields, good for CRI log parsers
                .with_ansi(false); // CRI parsers dislike ANSI color codes

            let _ = registry.with(layer).try_init();
        }
        LogFormat::Compact => {
            let layer = fmt::layer()
                .compact()
                .with_timer(UtcTime::rfc_3339())
                .with_ansi(true);

            let _ = registry.with(layer).try_init();
        }
    };
}
