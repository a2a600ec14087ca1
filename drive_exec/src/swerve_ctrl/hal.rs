//! # Module hardware abstraction
//!
//! The actuator and sensor transport of a single wheel module. Implementations exist for the
//! simulated module in this crate, real transports implement the same trait.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::warn;
use std::fmt::Display;
use std::time::Duration;

use comms_if::eqpt::swerve::{ModuleDems, ModuleSensData, NeutralMode};
use super::SwerveCtrlError;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The two actuators of a module.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Actuator {
    Steer,
    Drive
}

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Interface to the hardware of a single wheel module.
pub trait ModuleHw {
    type Error: Display;

    /// Apply the stored configuration of an actuator, waiting at most `timeout` for it to be
    /// acknowledged.
    fn apply_config(&mut self, actuator: Actuator, timeout: Duration) -> Result<(), Self::Error>;

    /// Set the behaviour of an actuator when given a neutral output.
    fn set_neutral_mode(
        &mut self,
        actuator: Actuator,
        mode: NeutralMode
    ) -> Result<(), Self::Error>;

    /// Seed the steer rotor position.
    fn set_str_position(&mut self, pos_rot: f64, timeout: Duration) -> Result<(), Self::Error>;

    /// Seed the drive rotor position.
    fn set_drv_position(&mut self, pos_rot: f64) -> Result<(), Self::Error>;

    /// Block until a fresh reading from the absolute steer sensor arrives, or until `timeout`.
    ///
    /// Returns the reading in degrees, or `None` if the timeout expired.
    fn wait_for_abs_angle(&mut self, timeout: Duration) -> Option<f64>;

    /// Read the latest actuator sensor data.
    fn read_sens(&mut self) -> Result<ModuleSensData, Self::Error>;

    /// Send a steer and drive demand pair to the actuators.
    fn write_dems(&mut self, dems: &ModuleDems) -> Result<(), Self::Error>;
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Run `f` until it succeeds, at most `attempts` times.
///
/// Only used for configuration during bring up, cyclic demands are never retried as they are
/// reissued every cycle anyway.
pub fn with_retries<T, E, F>(
    op: &'static str,
    attempts: usize,
    mut f: F
) -> Result<T, SwerveCtrlError>
where
    E: Display,
    F: FnMut() -> Result<T, E>
{
    // At least one attempt is always made
    let attempts = attempts.max(1);
    let mut last = String::new();

    for attempt in 1..=attempts {
        match f() {
            Ok(t) => return Ok(t),
            Err(e) => {
                warn!("{} failed (attempt {}/{}): {}", op, attempt, attempts, e);
                last = e.to_string();
            }
        }
    }

    Err(SwerveCtrlError::RetriesExhausted {
        op,
        attempts,
        last
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_retries() {
        let mut calls = 0;
        let r = with_retries("test op", 5, || {
            calls += 1;
            if calls < 3 { Err("busy") } else { Ok(calls) }
        });
        assert_eq!(r.ok(), Some(3));

        let mut calls = 0;
        let r: Result<(), _> = with_retries("test op", 4, || {
            calls += 1;
            Err("timeout")
        });
        assert_eq!(calls, 4);
        match r {
            Err(SwerveCtrlError::RetriesExhausted { attempts: 4, last, .. }) => {
                assert_eq!(last, "timeout")
            },
            r => panic!("Expected RetriesExhausted, got {:?}", r)
        }
    }

    #[test]
    fn test_zero_attempts_tries_once() {
        let mut calls = 0;
        let r = with_retries("test op", 0, || {
            calls += 1;
            Ok::<_, &str>(calls)
        });
        assert_eq!(r.ok(), Some(1));

        let mut calls = 0;
        let r: Result<(), _> = with_retries("test op", 0, || {
            calls += 1;
            Err("rejected")
        });
        assert_eq!(calls, 1);
        match r {
            Err(SwerveCtrlError::RetriesExhausted { attempts: 1, last, .. }) => {
                assert_eq!(last, "rejected")
            },
            r => panic!("Expected RetriesExhausted, got {:?}", r)
        }
    }
}
