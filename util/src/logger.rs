//! Logger initialisation
//!
//! Two outputs are set up: the main log, written to stdout and the session log file, and the
//! telemetry log, which only receives records on the `TELEMETRY_TARGET` target.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use log::{self, info};
use colored::{ColoredString, Colorize};
use thiserror::Error;

// Internal imports
use crate::session;

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Log target used for per-cycle telemetry records.
///
/// Telemetry is emitted at trace level and routed to the session's telemetry file only.
pub const TELEMETRY_TARGET: &str = "telemetry";

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("Expected a log level of at least `INFO`, found `{0}`")]
    InvalidMinLogLevel(log::LevelFilter),

    #[error("Error opening a log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("An error occured while setting up the logger: {0}")]
    FernInitError(log::SetLoggerError)
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise the logger for this execution.
///
/// - `min_level` must be at least `LevelFilter::Info`.
/// - `telemetry_level` sets the level of the telemetry target, `LevelFilter::Off` disables
///   telemetry.
///
/// May only be called once per process, subsequent calls fail with `FernInitError`.
pub fn logger_init(
    min_level: LevelFilter,
    telemetry_level: LevelFilter,
    session: &session::Session
) -> Result<(), LoggerInitError> {

    if min_level < log::Level::Info {
        return Err(LoggerInitError::InvalidMinLogLevel(min_level))
    }

    let log_file = fern::log_file(&session.log_file_path)
        .map_err(LoggerInitError::LogFileInitError)?;
    let telemetry_file = fern::log_file(&session.telemetry_file_path)
        .map_err(LoggerInitError::LogFileInitError)?;

    let main = fern::Dispatch::new()
        .format(|out, message, record| {
            // Only debug and trace records carry their target
            if record.level() > log::Level::Info {
                out.finish(format_args!(
                    "[{:10.6} {}] {}: {}",
                    session::get_elapsed_seconds(),
                    level_to_str(record.level()),
                    record.target(),
                    message
                ))
            }
            else {
                out.finish(format_args!(
                    "[{:10.6} {}] {}",
                    session::get_elapsed_seconds(),
                    level_to_str(record.level()),
                    message
                ))
            }
        })
        .level(min_level)
        .filter(|meta| meta.target() != TELEMETRY_TARGET)
        .chain(std::io::stdout())
        .chain(log_file);

    let telemetry = fern::Dispatch::new()
        .format(|out, message, _| {
            out.finish(format_args!("{:.6} {}", session::get_elapsed_seconds(), message))
        })
        .level(LevelFilter::Off)
        .level_for(TELEMETRY_TARGET, telemetry_level)
        .chain(telemetry_file);

    fern::Dispatch::new()
        .chain(main)
        .chain(telemetry)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    info!("Logging initialised");
    if let Some(epoch) = session::get_epoch() {
        info!("    Session epoch: {}", epoch);
    }
    info!("    Log level: {:?}", min_level);
    info!("    Telemetry level: {:?}", telemetry_level);
    info!("    Log file path: {:?}", session.log_file_path);
    info!("    Telemetry file path: {:?}", session.telemetry_file_path);

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn level_to_str(level: log::Level) -> ColoredString {
    match level {
        log::Level::Trace => "TRC".dimmed().italic(),
        log::Level::Debug => "DBG".dimmed(),
        log::Level::Info  => "INF".normal(),
        log::Level::Warn  => "WRN".yellow(),
        log::Level::Error => "ERR".red().bold()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_rejects_low_min_level() {
        let session = session::Session {
            session_root: "sessions/test".into(),
            arch_root: "sessions/test/arch".into(),
            log_file_path: "sessions/test/test.log".into(),
            telemetry_file_path: "sessions/test/telemetry.log".into()
        };

        match logger_init(LevelFilter::Warn, LevelFilter::Off, &session) {
            Err(LoggerInitError::InvalidMinLogLevel(l)) => assert_eq!(l, LevelFilter::Warn),
            r => panic!("Expected InvalidMinLogLevel, got {:?}", r)
        }
    }
}
