//! Session management
//!
//! A session is one run of an executable. Each gets its own timestamped directory under the
//! software root holding the log, telemetry and archive files of that run.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use chrono::{DateTime, Utc};
use conquer_once::OnceCell;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

// Internal imports
use crate::time;

// ---------------------------------------------------------------------------
// STATICS
// ---------------------------------------------------------------------------

static SESSION_EPOCH: OnceCell<DateTime<Utc>> = OnceCell::uninit();

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Format of the timestamp suffix of session directory names, see `chrono::format::strftime`.
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Name of the archive directory within a session.
const ARCH_DIR_NAME: &str = "arch";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Paths belonging to the current session
#[derive(Clone, Debug)]
pub struct Session {
    /// The root directory for this session
    pub session_root: PathBuf,

    /// CSV archives are written below this directory
    pub arch_root: PathBuf,

    /// Human readable log
    pub log_file_path: PathBuf,

    /// Per-cycle telemetry records, kept out of the main log
    pub telemetry_file_path: PathBuf
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors associated with the session module.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("The software root environment variable ({}) is not set", crate::host::SW_ROOT_ENV_VAR)]
    SwRootNotSet,

    #[error("Cannot create the session directory: {0}")]
    CannotCreateDir(std::io::Error),

    #[error("A session has already been started by this process")]
    AlreadyStarted
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Session {
    /// Start a new session, creating `{sw_root}/{sessions_dir}/{exec_name}_{timestamp}`.
    ///
    /// Only one session may be started per process since the epoch is global.
    pub fn new(exec_name: &str, sessions_dir: &str) -> Result<Self, SessionError> {
        let root = crate::host::get_sw_root()
            .map_err(|_| SessionError::SwRootNotSet)?;

        SESSION_EPOCH.try_init_once(Utc::now)
            .map_err(|_| SessionError::AlreadyStarted)?;

        let timestamp = get_epoch()
            .map(|e| e.format(TIMESTAMP_FORMAT).to_string())
            .unwrap_or_default();

        let mut session_root = root;
        session_root.push(sessions_dir);
        session_root.push(format!("{}_{}", exec_name, timestamp));

        let arch_root = session_root.join(ARCH_DIR_NAME);
        fs::create_dir_all(&arch_root).map_err(SessionError::CannotCreateDir)?;

        Ok(Session {
            log_file_path: session_root.join(format!("{}.log", exec_name)),
            telemetry_file_path: session_root.join("telemetry.log"),
            arch_root,
            session_root
        })
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Seconds elapsed since the start of the session.
///
/// Before a session has been started this is always zero.
pub fn get_elapsed_seconds() -> f64 {
    match get_epoch() {
        Some(e) => time::duration_to_seconds(Utc::now() - *e).unwrap_or(std::f64::NAN),
        None => 0.0
    }
}

/// The session's epoch, if a session has been started.
pub fn get_epoch() -> Option<&'static DateTime<Utc>> {
    SESSION_EPOCH.get()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_no_session() {
        assert!(get_epoch().is_none());
        assert_eq!(get_elapsed_seconds(), 0.0);
    }
}
