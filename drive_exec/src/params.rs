//! # Drive Executable Parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Serialize, Deserialize};
use std::time::Duration;
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq)]
pub enum ExecParamsError {
    #[error("Cycle period must be finite and positive, found {0} s")]
    InvalidCyclePeriod(f64),

    #[error("Maximum run time must be finite and non-negative, found {0} s")]
    InvalidRunTime(f64),

    #[error("Vision delay must be finite and non-negative, found {0} s")]
    InvalidVisionDelay(f64)
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveExecParams {
    /// Target period of one cycle.
    ///
    /// Units: seconds
    pub cycle_period_s: f64,

    /// The executable stops after this long if the alignment has not completed.
    ///
    /// Units: seconds
    pub max_run_time_s: f64,

    /// Emit module telemetry into the log
    pub log_telemetry: bool,

    /// Pose of the simulated robot at start, `[x_m, y_m, heading_rad]`.
    pub initial_pose: [f64; 3],

    /// Target published by the simulated vision pipeline, `[x_m, y_m, heading_rad]`.
    pub target_pose: [f64; 3],

    /// Reading of each simulated module's absolute steer sensor at start.
    ///
    /// Units: degrees
    pub sim_abs_angles_deg: [f64; 4],

    /// Delay before the simulated vision pipeline publishes its target.
    ///
    /// Units: seconds
    pub vision_delay_s: f64
}

impl Default for DriveExecParams {
    fn default() -> Self {
        Self {
            cycle_period_s: 0.02,
            max_run_time_s: 10.0,
            log_telemetry: false,
            initial_pose: [0.0, 0.0, 0.0],
            target_pose: [2.0, 1.0, 0.5],
            sim_abs_angles_deg: [0.0, 90.0, 180.0, 270.0],
            vision_delay_s: 0.1
        }
    }
}

impl DriveExecParams {
    /// Reject timing values the main loop cannot run with.
    pub fn validate(&self) -> Result<(), ExecParamsError> {
        if !self.cycle_period_s.is_finite() || self.cycle_period_s <= 0.0 {
            return Err(ExecParamsError::InvalidCyclePeriod(self.cycle_period_s))
        }
        if !self.max_run_time_s.is_finite() || self.max_run_time_s < 0.0 {
            return Err(ExecParamsError::InvalidRunTime(self.max_run_time_s))
        }
        if !self.vision_delay_s.is_finite() || self.vision_delay_s < 0.0 {
            return Err(ExecParamsError::InvalidVisionDelay(self.vision_delay_s))
        }

        Ok(())
    }

    /// Only valid after `validate` has passed.
    pub fn cycle_period(&self) -> Duration {
        Duration::from_secs_f64(self.cycle_period_s)
    }

    pub fn vision_delay(&self) -> Duration {
        Duration::from_secs_f64(self.vision_delay_s)
    }

    /// Number of cycles run before giving up on the alignment.
    pub fn num_cycles(&self) -> u64 {
        (self.max_run_time_s / self.cycle_period_s).ceil() as u64
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_validate() {
        let p = DriveExecParams::default();
        assert_eq!(p.validate(), Ok(()));
        assert_eq!(p.num_cycles(), 500);
        assert_eq!(p.cycle_period(), Duration::from_millis(20));

        for bad in [0.0, -0.02, std::f64::NAN, std::f64::INFINITY].iter() {
            let p = DriveExecParams { cycle_period_s: *bad, ..Default::default() };
            assert!(matches!(p.validate(), Err(ExecParamsError::InvalidCyclePeriod(_))));
        }

        let p = DriveExecParams { max_run_time_s: -1.0, ..Default::default() };
        assert_eq!(p.validate(), Err(ExecParamsError::InvalidRunTime(-1.0)));

        let p = DriveExecParams { vision_delay_s: std::f64::NAN, ..Default::default() };
        assert!(matches!(p.validate(), Err(ExecParamsError::InvalidVisionDelay(_))));
    }

    #[test]
    fn test_params_file() -> Result<(), util::params::LoadError> {
        let p: DriveExecParams = util::params::parse(include_str!("../../params/drive_exec.toml"))?;
        assert_eq!(p.validate(), Ok(()));

        Ok(())
    }
}
