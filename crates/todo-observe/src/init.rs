use time::{UtcOffset, format_description::well_known::Rfc3339};
use tracing_subscriber::{
    EnvFilter, fmt, fmt::time::OffsetTime, layer::SubscriberExt, util::SubscriberInitExt,
    util::TryInitError,
};

use crate::{
    config::{LoggerConfig, LoggerFormat},
    error::LoggerError,
};

/// Install the global `tracing` subscriber described by `cfg`.
///
/// Succeeds at most once per process; later calls return [`LoggerError::AlreadyInitialized`].
pub fn logger_init(cfg: &LoggerConfig) -> Result<(), LoggerError> {
    let registry = tracing_subscriber::registry().with(filter(&cfg.level)?);

    let installed = match cfg.format {
        LoggerFormat::Text => registry
            .with(
                fmt::layer()
                    .with_ansi(cfg.use_color)
                    .with_target(cfg.with_targets)
                    .with_timer(local_rfc3339()),
            )
            .try_init(),
        LoggerFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_target(cfg.with_targets)
                    .with_timer(local_rfc3339()),
            )
            .try_init(),
        #[cfg(all(target_os = "linux", feature = "journald"))]
        LoggerFormat::Journald => {
            let journal = tracing_journald::layer()
                .map_err(|e| LoggerError::InitializationFailed(format!("journald: {e}")))?;
            registry.with(journal).try_init()
        }
        #[cfg(not(all(target_os = "linux", feature = "journald")))]
        LoggerFormat::Journald => return Err(LoggerError::JournaldNotSupported),
    };

    installed.map_err(classify)
}

fn filter(directive: &str) -> Result<EnvFilter, LoggerError> {
    EnvFilter::try_new(directive).map_err(|_| LoggerError::InvalidLogLevel(directive.to_string()))
}

/// Timestamps in the host's local offset, UTC when it cannot be determined.
fn local_rfc3339() -> OffsetTime<Rfc3339> {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    OffsetTime::new(offset, Rfc3339)
}

fn classify(err: TryInitError) -> LoggerError {
    let msg = err.to_string();
    if msg.contains("global default") {
        LoggerError::AlreadyInitialized
    } else {
        LoggerError::InitializationFailed(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_filter_is_reported() {
        let err = filter("todo=loud").unwrap_err();
        assert!(matches!(err, LoggerError::InvalidLogLevel(d) if d == "todo=loud"));
    }

    #[test]
    fn installs_once() {
        let cfg = LoggerConfig::default();
        // Only the second call is asserted; the first may race other tests in this binary.
        let _ = logger_init(&cfg);
        let again = LoggerConfig {
            format: LoggerFormat::Json,
            ..cfg
        };
        assert!(logger_init(&again).is_err());
    }
}
