//! Simulated module hardware
//!
//! A simple kinematic model: the steer rotor reaches its demanded position immediately and the
//! drive rotor turns at the demanded rate. Used by the executable when no real transport is
//! available and by tests.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::time::Duration;

use comms_if::eqpt::swerve::{DrvDem, ModuleDems, ModuleSensData, NeutralMode};
use super::{Actuator, ModuleHw};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SimModuleHw {
    /// Absolute steer sensor reading, `None` if the sensor never reports.
    pub abs_angle_deg: Option<f64>,

    /// Number of configuration attempts which will be rejected before one is accepted.
    pub config_failures: usize,

    /// Drive feedforward gain, used to convert open loop volts to a rotor rate.
    pub drv_kv: f64,

    pub str_neutral: NeutralMode,
    pub drv_neutral: NeutralMode,

    sens: ModuleSensData,
    last_dems: Option<ModuleDems>
}

/// Errors raised by the simulated hardware.
#[derive(Debug, thiserror::Error)]
pub enum SimHwError {
    #[error("Configuration of the {0:?} actuator was rejected")]
    ConfigRejected(Actuator)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimModuleHw {
    pub fn new(abs_angle_deg: f64, drv_kv: f64) -> Self {
        Self {
            abs_angle_deg: Some(abs_angle_deg),
            config_failures: 0,
            drv_kv,
            str_neutral: NeutralMode::Coast,
            drv_neutral: NeutralMode::Coast,
            sens: ModuleSensData::default(),
            last_dems: None
        }
    }

    /// Advance the model by `dt_s` seconds.
    pub fn step(&mut self, dt_s: f64) {
        let dems = match self.last_dems {
            Some(d) => d,
            None => return
        };

        let prev_str_pos = self.sens.str_pos_rot;
        self.sens.str_pos_rot = dems.str_pos_rot;
        if dt_s > 0.0 {
            self.sens.str_rate_rots = (dems.str_pos_rot - prev_str_pos) / dt_s;
        }

        self.sens.drv_rate_rots = match dems.drv {
            DrvDem::OpenLoop { volts } if self.drv_kv != 0.0 => volts / self.drv_kv,
            DrvDem::Velocity { rotor_rps } => rotor_rps,
            _ => 0.0
        };
        self.sens.drv_pos_rot += self.sens.drv_rate_rots * dt_s;
        self.sens.drv_duty_cycle = (self.sens.drv_rate_rots / 100.0).max(-1.0).min(1.0);
        self.sens.drv_current_a = self.sens.drv_duty_cycle.abs() * 40.0;
        self.sens.str_current_a = (self.sens.str_rate_rots.abs() * 0.5).min(40.0);
    }

    /// The last demands written to the module.
    pub fn last_dems(&self) -> Option<ModuleDems> {
        self.last_dems
    }

    fn check_config(&mut self, actuator: Actuator) -> Result<(), SimHwError> {
        if self.config_failures > 0 {
            self.config_failures -= 1;
            return Err(SimHwError::ConfigRejected(actuator))
        }
        Ok(())
    }
}

impl ModuleHw for SimModuleHw {
    type Error = SimHwError;

    fn apply_config(&mut self, actuator: Actuator, _timeout: Duration) -> Result<(), Self::Error> {
        self.check_config(actuator)
    }

    fn set_neutral_mode(
        &mut self,
        actuator: Actuator,
        mode: NeutralMode
    ) -> Result<(), Self::Error> {
        self.check_config(actuator)?;

        match actuator {
            Actuator::Steer => self.str_neutral = mode,
            Actuator::Drive => self.drv_neutral = mode
        }

        Ok(())
    }

    fn set_str_position(&mut self, pos_rot: f64, _timeout: Duration) -> Result<(), Self::Error> {
        self.check_config(Actuator::Steer)?;
        self.sens.str_pos_rot = pos_rot;
        Ok(())
    }

    fn set_drv_position(&mut self, pos_rot: f64) -> Result<(), Self::Error> {
        self.sens.drv_pos_rot = pos_rot;
        Ok(())
    }

    fn wait_for_abs_angle(&mut self, _timeout: Duration) -> Option<f64> {
        self.abs_angle_deg
    }

    fn read_sens(&mut self) -> Result<ModuleSensData, Self::Error> {
        Ok(self.sens)
    }

    fn write_dems(&mut self, dems: &ModuleDems) -> Result<(), Self::Error> {
        self.last_dems = Some(*dems);
        Ok(())
    }
}
