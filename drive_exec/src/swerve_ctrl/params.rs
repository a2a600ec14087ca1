//! Parameters structure for SwerveCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;
use std::time::Duration;

use super::NUM_MODULES;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for swerve module control.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Params {

    // ---- GEOMETRY ----

    /// Circumference of the wheels.
    ///
    /// Units: meters
    pub wheel_circumference_m: f64,

    /// Drive rotor rotations per wheel rotation.
    pub drv_gear_ratio: f64,

    /// Steer rotor rotations per module rotation.
    pub str_gear_ratio: f64,

    /// Position of each module in the robot body frame, X forward, Y left.
    ///
    /// Units: meters
    pub module_pos_m_rb: [[f64; 2]; NUM_MODULES],

    /// Reading of each module's absolute steer sensor when the wheel points forward.
    ///
    /// Units: degrees
    pub str_angle_offset_deg: [f64; NUM_MODULES],

    // ---- DRIVE ----

    /// Feedforward gain of the drive actuator.
    ///
    /// Units: volts/(rotor rotation/second)
    pub drv_kv: f64,

    /// Velocity demands smaller than this are replaced by a neutral output.
    ///
    /// Units: rotor rotations/second
    pub drv_dead_zone_rps: f64,

    /// Maximum linear speed of a module, used to desaturate kinematics outputs.
    ///
    /// Units: meters/second
    pub max_module_speed_ms: f64,

    // ---- BRING UP ----

    /// Number of attempts made to apply a configuration before giving up.
    pub config_attempts: usize,

    /// Timeout of a single configuration attempt.
    ///
    /// Units: seconds
    pub config_timeout_s: f64,

    /// How long to wait for an absolute steer angle during bring up.
    ///
    /// Units: seconds
    pub abs_sensor_timeout_s: f64
}

impl Default for Params {
    fn default() -> Self {
        Self {
            wheel_circumference_m: 0.1 * std::f64::consts::PI,
            drv_gear_ratio: 6.75,
            str_gear_ratio: 150.0 / 7.0,
            module_pos_m_rb: [
                [0.3, 0.3],
                [0.3, -0.3],
                [-0.3, 0.3],
                [-0.3, -0.3]
            ],
            str_angle_offset_deg: [0.0; NUM_MODULES],
            drv_kv: 0.12,
            drv_dead_zone_rps: 0.002,
            max_module_speed_ms: 4.5,
            config_attempts: 5,
            config_timeout_s: 0.1,
            abs_sensor_timeout_s: 0.1
        }
    }
}

impl Params {
    pub fn config_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.config_timeout_s.max(0.0))
    }

    pub fn abs_sensor_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.abs_sensor_timeout_s.max(0.0))
    }

    /// Wheel linear speed to drive rotor rate.
    pub fn ms_to_rotor_rps(&self, speed_ms: f64) -> f64 {
        speed_ms / self.wheel_circumference_m * self.drv_gear_ratio
    }

    /// Drive rotor rate to wheel linear speed.
    pub fn rotor_rps_to_ms(&self, rotor_rps: f64) -> f64 {
        rotor_rps * self.wheel_circumference_m / self.drv_gear_ratio
    }

    /// Drive rotor rotations to distance travelled by the wheel.
    pub fn rotor_rot_to_m(&self, rotor_rot: f64) -> f64 {
        self.rotor_rps_to_ms(rotor_rot)
    }

    /// Module angle to steer rotor position.
    pub fn deg_to_str_rot(&self, angle_deg: f64) -> f64 {
        angle_deg / 360.0 * self.str_gear_ratio
    }

    /// Steer rotor position to module angle.
    pub fn str_rot_to_deg(&self, rotor_rot: f64) -> f64 {
        rotor_rot / self.str_gear_ratio * 360.0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_conversions() {
        let p = Params::default();

        // One wheel rotation per second
        let rps = p.ms_to_rotor_rps(p.wheel_circumference_m);
        assert!((rps - p.drv_gear_ratio).abs() < 1e-12);
        assert!((p.rotor_rps_to_ms(rps) - p.wheel_circumference_m).abs() < 1e-12);

        assert!((p.deg_to_str_rot(360.0) - p.str_gear_ratio).abs() < 1e-12);
        assert!((p.str_rot_to_deg(p.deg_to_str_rot(-725.0)) + 725.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_partial() -> Result<(), util::params::LoadError> {
        let p: Params = util::params::parse(
            "drv_dead_zone_rps = 0.01\nstr_angle_offset_deg = [10.0, 20.0, 30.0, 40.0]"
        )?;

        assert_eq!(p.drv_dead_zone_rps, 0.01);
        assert_eq!(p.str_angle_offset_deg[2], 30.0);
        assert_eq!(p.config_attempts, 5);

        let p: Params = util::params::parse(include_str!("../../../params/swerve_ctrl.toml"))?;
        assert_eq!(p.drv_dead_zone_rps, 0.002);
        assert_eq!(p.str_angle_offset_deg[3], 270.0);

        Ok(())
    }
}
