//! Implementations for the swerve module state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, log_enabled, trace, Level};
use serde::Serialize;
use std::sync::{Mutex, MutexGuard};

// Internal
use super::*;
use comms_if::eqpt::swerve::{DrvDem, ModuleDems, ModuleSensData, NeutralMode};
use util::{
    archive::{Archived, Archiver, ArchiveError},
    logger::TELEMETRY_TARGET,
    maths::place_in_0_to_360_scope,
    session::Session
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A single independently steerable wheel module.
///
/// Sensor reading, demand calculation and demand writing may happen from different call sites
/// within a cycle, so the inputs and the demand pair are each held behind their own lock. The
/// demand pair is only ever replaced as a whole.
pub struct SwerveModule<H: ModuleHw> {
    module_num: usize,
    params: Params,

    hw: Mutex<H>,
    sens: Mutex<ModuleSensData>,
    dems: Mutex<ModuleDems>,

    arch: Archiver
}

/// Archived record of a module's cycle.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ModuleReport {
    pub timestamp_s: f64,
    pub str_target_deg: f64,
    pub str_angle_deg: f64,
    pub drv_target_ms: f64,
    pub drv_speed_ms: f64,
    pub drv_dist_m: f64,
    pub drv_neutral: bool
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    // Every value behind these locks is replaced whole, so a poisoned lock still holds valid data
    m.lock().unwrap_or_else(|e| e.into_inner())
}

impl<H: ModuleHw> SwerveModule<H> {
    /// Bring up a module.
    ///
    /// Applies the actuator configurations (retrying a bounded number of times), zeros the drive
    /// position and seeds the steer position from the absolute sensor.
    pub fn new(module_num: usize, params: Params, hw: H) -> Result<Self, SwerveCtrlError> {
        if module_num >= NUM_MODULES {
            return Err(SwerveCtrlError::InvalidModule(module_num))
        }

        let module = Self {
            module_num,
            params,
            hw: Mutex::new(hw),
            sens: Mutex::new(ModuleSensData::default()),
            dems: Mutex::new(ModuleDems::default()),
            arch: Archiver::default()
        };

        {
            let mut hw = lock(&module.hw);
            let attempts = module.params.config_attempts;
            let timeout = module.params.config_timeout();

            with_retries("Steer configuration", attempts, || {
                hw.apply_config(Actuator::Steer, timeout)
            })?;
            with_retries("Drive configuration", attempts, || {
                hw.apply_config(Actuator::Drive, timeout)
            })?;
            hw.set_drv_position(0.0)
                .map_err(|e| SwerveCtrlError::HardwareError(e.to_string()))?;
        }

        module.read_periodic_inputs(0.0)?;
        module.reset_to_absolute()?;

        info!("Swerve module {} initialised", module_num);

        Ok(module)
    }

    /// Open the module's archive in the given session.
    pub fn init_archive(&mut self, session: &Session) -> Result<(), SwerveCtrlError> {
        self.arch = Archiver::from_path(
            session,
            format!("swerve_ctrl/module_{}.csv", self.module_num)
        ).map_err(SwerveCtrlError::ArchiveError)?;

        Ok(())
    }

    /// Reseed the steer rotor position from the absolute steer sensor.
    ///
    /// The absolute reading, corrected by the module's offset, is placed in the revolution
    /// closest to the current unbounded angle so the steer axis never unwinds.
    pub fn reset_to_absolute(&self) -> Result<(), SwerveCtrlError> {
        let mut hw = lock(&self.hw);

        let abs_deg = hw.wait_for_abs_angle(self.params.abs_sensor_timeout())
            .ok_or(SwerveCtrlError::AbsSensorTimeout {
                module: self.module_num,
                timeout_s: self.params.abs_sensor_timeout_s
            })?;

        let angle_deg = place_in_0_to_360_scope(
            self.current_unbounded_deg(),
            abs_deg - self.params.str_angle_offset_deg[self.module_num]
        );
        let pos_rot = self.params.deg_to_str_rot(angle_deg);
        let timeout = self.params.config_timeout();

        with_retries("Steer position reset", self.params.config_attempts, || {
            hw.set_str_position(pos_rot, timeout)
        })?;

        lock(&self.sens).str_pos_rot = pos_rot;

        debug!("Module {} steer reset to {:.2} deg", self.module_num, angle_deg);

        Ok(())
    }

    /// Set brake or coast behaviour, the drive actuator gets the requested mode and the steer
    /// actuator the opposite.
    pub fn set_drive_neutral_brake(&self, want_brake: bool) -> Result<(), SwerveCtrlError> {
        let (drv_mode, str_mode) = if want_brake {
            (NeutralMode::Brake, NeutralMode::Coast)
        }
        else {
            (NeutralMode::Coast, NeutralMode::Brake)
        };

        let mut hw = lock(&self.hw);
        let attempts = self.params.config_attempts;

        with_retries("Drive neutral mode", attempts, || {
            hw.set_neutral_mode(Actuator::Drive, drv_mode)
        })?;
        with_retries("Steer neutral mode", attempts, || {
            hw.set_neutral_mode(Actuator::Steer, str_mode)
        })?;

        Ok(())
    }

    /// Read the actuator sensors.
    pub fn read_periodic_inputs(&self, timestamp_s: f64) -> Result<(), SwerveCtrlError> {
        let mut sens = lock(&self.hw).read_sens()
            .map_err(|e| SwerveCtrlError::HardwareError(e.to_string()))?;
        sens.timestamp_s = timestamp_s;

        *lock(&self.sens) = sens;

        Ok(())
    }

    /// Demand a speed and direction, the drive runs open loop with a feedforward voltage.
    pub fn set_open_loop(&self, desired: &ModuleState) {
        let (str_angle_deg, drv_speed_ms) = self.resolve(desired);
        let rotor_rps = self.params.ms_to_rotor_rps(drv_speed_ms);

        self.set_dems(str_angle_deg, drv_speed_ms, DrvDem::OpenLoop {
            volts: rotor_rps * self.params.drv_kv
        });
    }

    /// Demand a speed and direction, the drive runs closed loop on velocity.
    ///
    /// Rotor rates inside the dead zone give a neutral drive output instead.
    pub fn set_velocity(&self, desired: &ModuleState) {
        let (str_angle_deg, drv_speed_ms) = self.resolve(desired);
        let rotor_rps = self.params.ms_to_rotor_rps(drv_speed_ms);

        let drv = if rotor_rps.abs() < self.params.drv_dead_zone_rps {
            DrvDem::Neutral
        }
        else {
            DrvDem::Velocity { rotor_rps }
        };

        self.set_dems(str_angle_deg, drv_speed_ms, drv);
    }

    /// Send the current demand pair to the hardware.
    pub fn write_periodic_outputs(&self) -> Result<(), SwerveCtrlError> {
        let dems = *lock(&self.dems);

        lock(&self.hw).write_dems(&dems)
            .map_err(|e| SwerveCtrlError::HardwareError(e.to_string()))
    }

    /// Log the module telemetry.
    pub fn output_telemetry(&self) {
        if !log_enabled!(target: TELEMETRY_TARGET, Level::Trace) {
            return
        }

        for (key, value) in self.telemetry() {
            trace!(target: TELEMETRY_TARGET, "{} = {:.4}", key, value);
        }
    }

    /// Telemetry values keyed by their dashboard path.
    pub fn telemetry(&self) -> Vec<(String, f64)> {
        let sens = *lock(&self.sens);
        let dems = *lock(&self.dems);
        let angle_deg = self.current_unbounded_deg();
        let speed_ms = self.current_velocity_ms();

        let values = [
            ("Azi Target", dems.str_angle_deg),
            ("Azi Angle", angle_deg),
            ("Azi Error", angle_deg - dems.str_angle_deg),
            ("Wheel Velocity", speed_ms.abs()),
            ("Wheel Target Velocity", dems.drv_speed_ms.abs()),
            ("Drive Position", self.drive_distance_m().abs()),
            ("Duty Cycle", sens.drv_duty_cycle),
            ("Azi Current", sens.str_current_a),
            ("Drive Current", sens.drv_current_a),
            ("Wheel Velocity Error", speed_ms.abs() - dems.drv_speed_ms.abs())
        ];

        values.iter()
            .map(|(k, v)| (format!("Drive/Module{}/{}", self.module_num, k), *v))
            .collect()
    }

    pub fn module_num(&self) -> usize {
        self.module_num
    }

    pub fn angle_offset_deg(&self) -> f64 {
        self.params.str_angle_offset_deg[self.module_num]
    }

    /// The latest demand pair.
    pub fn dems(&self) -> ModuleDems {
        *lock(&self.dems)
    }

    /// Unbounded steer angle.
    ///
    /// Units: degrees
    pub fn current_unbounded_deg(&self) -> f64 {
        self.params.str_rot_to_deg(lock(&self.sens).str_pos_rot)
    }

    /// Units: meters/second
    pub fn current_velocity_ms(&self) -> f64 {
        self.params.rotor_rps_to_ms(lock(&self.sens).drv_rate_rots)
    }

    /// Units: meters/second
    pub fn target_velocity_ms(&self) -> f64 {
        lock(&self.dems).drv_speed_ms
    }

    /// Units: meters
    pub fn drive_distance_m(&self) -> f64 {
        self.params.rotor_rot_to_m(lock(&self.sens).drv_pos_rot)
    }

    pub fn timestamp_s(&self) -> f64 {
        lock(&self.sens).timestamp_s
    }

    /// Measured speed and direction.
    pub fn state(&self) -> ModuleState {
        ModuleState::new(self.current_velocity_ms(), self.current_unbounded_deg())
    }

    /// Demanded speed and direction.
    pub fn target_state(&self) -> ModuleState {
        let dems = self.dems();
        ModuleState::new(dems.drv_speed_ms, dems.str_angle_deg)
    }

    /// Measured distance and direction.
    pub fn position(&self) -> ModulePosition {
        ModulePosition {
            distance_m: self.drive_distance_m(),
            angle_deg: self.current_unbounded_deg()
        }
    }

    /// Run the hardware through a closure, for transports which need servicing by the caller.
    pub fn with_hw<T, F: FnOnce(&mut H) -> T>(&self, f: F) -> T {
        f(&mut lock(&self.hw))
    }

    /// Resolve the steer angle and signed wheel speed for a desired state.
    fn resolve(&self, desired: &ModuleState) -> (f64, f64) {
        let (str_angle_deg, flip) = resolve_steering(
            desired.angle_deg,
            self.current_unbounded_deg()
        );

        let drv_speed_ms = if flip { -desired.speed_ms } else { desired.speed_ms };

        (str_angle_deg, drv_speed_ms)
    }

    fn set_dems(&self, str_angle_deg: f64, drv_speed_ms: f64, drv: DrvDem) {
        *lock(&self.dems) = ModuleDems {
            str_angle_deg,
            str_pos_rot: self.params.deg_to_str_rot(str_angle_deg),
            drv_speed_ms,
            drv
        };
    }
}

impl<H: ModuleHw> Archived for SwerveModule<H> {
    fn write(&mut self) -> Result<(), ArchiveError> {
        let dems = self.dems();
        let report = ModuleReport {
            timestamp_s: self.timestamp_s(),
            str_target_deg: dems.str_angle_deg,
            str_angle_deg: self.current_unbounded_deg(),
            drv_target_ms: dems.drv_speed_ms,
            drv_speed_ms: self.current_velocity_ms(),
            drv_dist_m: self.drive_distance_m(),
            drv_neutral: dems.drv == DrvDem::Neutral
        };

        self.arch.serialise(report)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn module(abs_deg: f64) -> Result<SwerveModule<SimModuleHw>, SwerveCtrlError> {
        let params = Params::default();
        let hw = SimModuleHw::new(abs_deg, params.drv_kv);
        SwerveModule::new(0, params, hw)
    }

    #[test]
    fn test_bring_up() -> Result<(), SwerveCtrlError> {
        let m = module(30.0)?;
        assert!((m.current_unbounded_deg() - 30.0).abs() < 1e-9);
        assert_eq!(m.drive_distance_m(), 0.0);

        let mut params = Params::default();
        params.str_angle_offset_deg[1] = 40.0;
        let hw = SimModuleHw::new(30.0, params.drv_kv);
        let m = SwerveModule::new(1, params, hw)?;
        assert!((m.current_unbounded_deg() + 10.0).abs() < 1e-9);

        Ok(())
    }

    #[test]
    fn test_bring_up_failures() {
        let params = Params::default();

        // Fewer failures than attempts recovers
        let mut hw = SimModuleHw::new(0.0, params.drv_kv);
        hw.config_failures = 2;
        assert!(SwerveModule::new(0, params.clone(), hw).is_ok());

        let mut hw = SimModuleHw::new(0.0, params.drv_kv);
        hw.config_failures = 100;
        match SwerveModule::new(0, params.clone(), hw) {
            Err(SwerveCtrlError::RetriesExhausted { attempts: 5, .. }) => (),
            Err(e) => panic!("Unexpected error {}", e),
            Ok(_) => panic!("Bring up should have failed")
        }

        let mut hw = SimModuleHw::new(0.0, params.drv_kv);
        hw.abs_angle_deg = None;
        match SwerveModule::new(0, params.clone(), hw) {
            Err(SwerveCtrlError::AbsSensorTimeout { module: 0, .. }) => (),
            Err(e) => panic!("Unexpected error {}", e),
            Ok(_) => panic!("Bring up should have failed")
        }

        let hw = SimModuleHw::new(0.0, params.drv_kv);
        assert!(SwerveModule::new(NUM_MODULES, params, hw).is_err());
    }

    #[test]
    fn test_flip_and_write() -> Result<(), SwerveCtrlError> {
        let m = module(0.0)?;

        m.set_velocity(&ModuleState::new(1.0, 170.0));
        let dems = m.dems();
        assert!((dems.str_angle_deg + 10.0).abs() < 1e-9);
        assert!((dems.drv_speed_ms + 1.0).abs() < 1e-12);
        match dems.drv {
            DrvDem::Velocity { rotor_rps } => assert!(rotor_rps < 0.0),
            d => panic!("Expected velocity demand, got {:?}", d)
        }

        // Hardware sees the same pair
        m.write_periodic_outputs()?;
        assert_eq!(m.with_hw(|hw| hw.last_dems()), Some(dems));

        Ok(())
    }

    #[test]
    fn test_open_loop() -> Result<(), SwerveCtrlError> {
        let m = module(0.0)?;
        let p = Params::default();

        m.set_open_loop(&ModuleState::new(2.0, 0.0));
        match m.dems().drv {
            DrvDem::OpenLoop { volts } => {
                assert!((volts - p.ms_to_rotor_rps(2.0) * p.drv_kv).abs() < 1e-12)
            },
            d => panic!("Expected open loop demand, got {:?}", d)
        }

        // Open loop never goes neutral
        m.set_open_loop(&ModuleState::new(0.0, 0.0));
        assert_eq!(m.dems().drv, DrvDem::OpenLoop { volts: 0.0 });

        Ok(())
    }

    #[test]
    fn test_dead_zone_boundary() -> Result<(), SwerveCtrlError> {
        let m = module(0.0)?;
        let p = Params::default();
        let eps = 1e-6;

        let below_ms = p.rotor_rps_to_ms(p.drv_dead_zone_rps - eps);
        m.set_velocity(&ModuleState::new(below_ms, 0.0));
        assert_eq!(m.dems().drv, DrvDem::Neutral);

        let above_ms = p.rotor_rps_to_ms(p.drv_dead_zone_rps + eps);
        m.set_velocity(&ModuleState::new(above_ms, 0.0));
        match m.dems().drv {
            DrvDem::Velocity { rotor_rps } => assert!(rotor_rps > p.drv_dead_zone_rps),
            d => panic!("Expected velocity demand, got {:?}", d)
        }

        // Same boundary when driving backwards
        m.set_velocity(&ModuleState::new(-below_ms, 0.0));
        assert_eq!(m.dems().drv, DrvDem::Neutral);

        Ok(())
    }

    #[test]
    fn test_sweep_continuous() -> Result<(), SwerveCtrlError> {
        let m = module(0.0)?;

        let mut prev_deg = m.current_unbounded_deg();
        for i in 0..=360 {
            m.set_velocity(&ModuleState::new(1.0, i as f64));
            m.write_periodic_outputs()?;
            m.with_hw(|hw| hw.step(0.02));
            m.read_periodic_inputs(0.02 * i as f64)?;

            let deg = m.current_unbounded_deg();
            assert!((deg - prev_deg).abs() <= 90.0 + 1e-9);
            prev_deg = deg;
        }

        Ok(())
    }

    #[test]
    fn test_reset_to_absolute_keeps_revolution() -> Result<(), SwerveCtrlError> {
        let m = module(0.0)?;

        // Wind the module up two turns
        m.with_hw(|hw| -> Result<(), SimHwError> {
            hw.set_str_position(Params::default().deg_to_str_rot(725.0), Default::default())
        }).map_err(|e| SwerveCtrlError::HardwareError(e.to_string()))?;
        m.read_periodic_inputs(0.0)?;

        m.with_hw(|hw| hw.abs_angle_deg = Some(350.0));
        m.reset_to_absolute()?;
        assert!((m.current_unbounded_deg() - 710.0).abs() < 1e-9);

        Ok(())
    }

    #[test]
    fn test_neutral_brake() -> Result<(), SwerveCtrlError> {
        let m = module(0.0)?;

        m.set_drive_neutral_brake(true)?;
        assert_eq!(m.with_hw(|hw| hw.drv_neutral), NeutralMode::Brake);
        assert_eq!(m.with_hw(|hw| hw.str_neutral), NeutralMode::Coast);

        m.set_drive_neutral_brake(false)?;
        assert_eq!(m.with_hw(|hw| hw.drv_neutral), NeutralMode::Coast);
        assert_eq!(m.with_hw(|hw| hw.str_neutral), NeutralMode::Brake);

        Ok(())
    }

    #[test]
    fn test_telemetry_keys() -> Result<(), SwerveCtrlError> {
        let m = module(0.0)?;
        m.set_velocity(&ModuleState::new(1.0, 45.0));

        let keys: Vec<String> = m.telemetry().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys[0], "Drive/Module0/Azi Target");
        assert_eq!(keys[9], "Drive/Module0/Wheel Velocity Error");
        assert_eq!(keys.len(), 10);

        let target = m.telemetry()[0].1;
        assert!((target - 45.0).abs() < 1e-9);

        Ok(())
    }

    #[test]
    fn test_telemetry_disabled() -> Result<(), SwerveCtrlError> {
        // No logger is installed, so the telemetry target is off
        assert!(!log_enabled!(target: TELEMETRY_TARGET, Level::Trace));

        let m = module(0.0)?;
        m.set_velocity(&ModuleState::new(1.0, 45.0));
        let dems = m.dems();
        m.output_telemetry();
        assert_eq!(m.dems(), dems);

        Ok(())
    }
}
