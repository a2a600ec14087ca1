//! # Swerve Module Equipment Interface
//!
//! Demands sent to, and sensor data read from, a single independently steerable wheel module
//! (one steer actuator and one drive actuator).

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Serialize, Deserialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Demands for a single module.
///
/// The steer and drive demands are always produced, stored, and written together so the
/// equipment never sees a steer-only or drive-only update.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct ModuleDems {
    /// Unbounded (multi-revolution) target angle of the steer axis.
    ///
    /// Units: degrees
    pub str_angle_deg: f64,

    /// Steer actuator rotor position demand. Steering is always position closed loop.
    ///
    /// Units: rotor rotations
    pub str_pos_rot: f64,

    /// Signed linear speed demanded of the wheel, after any steering flip has been applied.
    ///
    /// Units: meters/second
    pub drv_speed_ms: f64,

    /// The drive actuator demand
    pub drv: DrvDem
}

/// Sensor data read from a single module's actuators.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct ModuleSensData {
    /// Time at which the data was read.
    ///
    /// Units: seconds
    pub timestamp_s: f64,

    /// Latency compensated steer rotor position, never wrapped.
    ///
    /// Units: rotor rotations
    pub str_pos_rot: f64,

    /// Steer rotor rate.
    ///
    /// Units: rotor rotations/second
    pub str_rate_rots: f64,

    /// Drive rotor position.
    ///
    /// Units: rotor rotations
    pub drv_pos_rot: f64,

    /// Drive rotor rate.
    ///
    /// Units: rotor rotations/second
    pub drv_rate_rots: f64,

    /// Drive actuator duty cycle, between -1 and +1.
    pub drv_duty_cycle: f64,

    /// Steer actuator supply current.
    ///
    /// Units: amps
    pub str_current_a: f64,

    /// Drive actuator supply current.
    ///
    /// Units: amps
    pub drv_current_a: f64
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Demand for the drive actuator of a module.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub enum DrvDem {
    /// Feed-forward voltage proportional to the demanded speed.
    OpenLoop {
        /// Units: volts
        volts: f64
    },

    /// Closed loop velocity target.
    Velocity {
        /// Units: rotor rotations/second
        rotor_rps: f64
    },

    /// No drive output, the actuator applies its neutral behaviour.
    Neutral
}

/// Behaviour of an actuator when given a neutral output.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Eq, PartialEq)]
pub enum NeutralMode {
    Brake,
    Coast
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for ModuleDems {
    fn default() -> Self {
        Self {
            str_angle_deg: 0.0,
            str_pos_rot: 0.0,
            drv_speed_ms: 0.0,
            drv: DrvDem::Neutral
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_drv_dem_wire_format() {
        let json = serde_json::to_string(&DrvDem::Velocity { rotor_rps: 2.0 }).unwrap();
        assert_eq!(json, r#"{"Velocity":{"rotor_rps":2.0}}"#);

        let json = serde_json::to_string(&DrvDem::Neutral).unwrap();
        assert_eq!(json, r#""Neutral""#);

        let dems: ModuleDems = serde_json::from_str(
            r#"{"str_angle_deg":-10.0,"str_pos_rot":-0.5,"drv_speed_ms":-1.0,
                "drv":{"OpenLoop":{"volts":3.0}}}"#
        ).unwrap();
        assert_eq!(dems.drv, DrvDem::OpenLoop { volts: 3.0 });
        assert_eq!(dems.str_angle_deg, -10.0);
    }
}
