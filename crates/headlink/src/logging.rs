use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

/// Overrides `--log-level` with a full filter directive when set.
pub const LOG_ENV: &str = "HEADLINK_LOG";

/// Crates whose events are worth showing at the chosen level. Everything
/// else (serialport internals and the like) stays at `warn`.
const OWN_TARGETS: [&str; 4] = [
    "headlink",
    "headlink_device",
    "headlink_transport",
    "headlink_itmp",
];

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// Filter directives for this level: our crates at `self`, the rest
    /// capped at `warn` unless `self` is quieter.
    fn directives(self) -> String {
        let rest = match self {
            LogLevel::Error => "error",
            _ => "warn",
        };
        let mut out = rest.to_string();
        for target in OWN_TARGETS {
            out.push_str(&format!(",{target}={}", self.as_str()));
        }
        out
    }
}

/// Choose the filter directives. A non-empty, parseable `env` value wins;
/// anything else falls back to `level`.
fn directives(env: Option<&str>, level: LogLevel) -> String {
    match env.map(str::trim) {
        Some(value) if !value.is_empty() && EnvFilter::try_new(value).is_ok() => value.to_string(),
        _ => level.directives(),
    }
}

/// Install the stderr subscriber. Stdout is reserved for command output,
/// which keeps `--format raw` frames clean.
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let env = std::env::var(LOG_ENV).ok();
    let filter = EnvFilter::new(directives(env.as_deref(), level));
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false);

    match format {
        LogFormat::Text => {
            let _ = builder.try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().try_init();
        }
    }
}
