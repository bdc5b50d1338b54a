mod config;
mod error;
mod logger;
mod object;

pub use config::LoggerConfig;
pub use error::{LoggerError, LoggerResult};
pub use object::{LoggerFormat, LoggerLevel};
pub use object::{LoggerTimeZone, init_local_offset};

/// Installs the global tracing subscriber described by `cfg`.
///
/// After this call every `tracing` macro (`info!`, `debug!`, ...) goes through the
/// configured filter and formatter. Calling it twice returns
/// [`LoggerError::AlreadyInitialized`].
///
/// For [`LoggerTimeZone::Local`] call [`init_local_offset`] first, while the
/// process is still single-threaded.
///
/// # Examples
/// ```rust
/// use ahs_observe::{LoggerConfig, init_logger};
///
/// let config = LoggerConfig::default();
/// init_logger(&config).expect("logger");
///
/// tracing::info!("logger initialized");
/// ```
pub fn init_logger(cfg: &LoggerConfig) -> LoggerResult<()> {
    match cfg.format {
        LoggerFormat::Text => logger::logger_text(cfg),
        LoggerFormat::Json => logger::logger_json(cfg),
    }
}
