//! Main drive executable entry point.
//!
//! # Architecture
//!
//! The executable runs the motion control core against simulated hardware:
//!
//!     - Initialise all modules
//!     - Start the vision pipeline, which checks its camera observations and publishes the
//!       alignment target
//!     - Main loop:
//!         - Module sensing
//!         - Alignment control processing
//!         - Chassis kinematics
//!         - Module demand calculation and output
//!         - Telemetry and archiving
//!
//! The loop ends once the alignment completes or the maximum run time is reached.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{Report, eyre::WrapErr};
use log::{debug, info, warn};
use nalgebra::{Isometry3, Translation3, UnitQuaternion};
use std::thread;
use std::time::{Duration, Instant};

// Internal
use comms_if::eqpt::cam::{CamId, VisionUpdate};
use drive_lib::{
    align_ctrl::{self, AlignCtrl, AlignCtrlError, TargetHandle},
    loc::{ChassisSpeeds, Pose2, Twist2},
    params::DriveExecParams,
    swerve_ctrl::{self, SimModuleHw, SwerveCtrlError, SwerveKinematics, SwerveModule},
    vision_check::{best_device, VisionCheck}
};
use util::{
    archive::Archived,
    logger::{logger_init, LevelFilter},
    module::State,
    session::Session
};

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {

    // ---- EARLY INITIALISATION ----

    color_eyre::install()?;

    let session = Session::new(
        "drive_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    let exec_params: DriveExecParams = util::params::load("drive_exec.toml")
        .wrap_err("Could not load exec params")?;
    exec_params.validate()
        .wrap_err("Invalid exec params")?;

    logger_init(
        LevelFilter::Debug,
        if exec_params.log_telemetry { LevelFilter::Trace } else { LevelFilter::Off },
        &session
    ).wrap_err("Failed to initialise logging")?;

    info!("Drive Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let mut align_ctrl = AlignCtrl::default();
    align_ctrl.init("align_ctrl.toml", &session)
        .wrap_err("Failed to initialise AlignCtrl")?;
    info!("AlignCtrl init complete");

    let swerve_params: swerve_ctrl::Params = util::params::load("swerve_ctrl.toml")
        .map_err(SwerveCtrlError::ParamLoadError)
        .wrap_err("Failed to load SwerveCtrl parameters")?;

    let mut kinematics = SwerveKinematics::new(&swerve_params);

    let mut modules = Vec::with_capacity(swerve_ctrl::NUM_MODULES);
    for (i, abs_deg) in exec_params.sim_abs_angles_deg.iter().enumerate() {
        let hw = SimModuleHw::new(*abs_deg, swerve_params.drv_kv);
        let mut module = SwerveModule::new(i, swerve_params.clone(), hw)
            .wrap_err_with(|| format!("Failed to bring up swerve module {}", i))?;

        module.init_archive(&session)
            .wrap_err_with(|| format!("Failed to open archive of swerve module {}", i))?;
        module.set_drive_neutral_brake(true)
            .wrap_err_with(|| format!("Failed to set neutral mode of swerve module {}", i))?;

        modules.push(module);
    }
    info!("SwerveCtrl init complete");

    let vision_check = VisionCheck::from_params_file("vision_check.toml")
        .wrap_err("Failed to initialise VisionCheck")?;
    info!("VisionCheck init complete");

    info!("Module initialisation complete\n");

    // ---- START VISION PIPELINE ----

    let vision_thread = {
        let handle = align_ctrl.target_handle();
        let target = pose_from_array(&exec_params.target_pose);
        let delay = exec_params.vision_delay();

        thread::spawn(move || run_vision(vision_check, handle, target, delay))
    };

    // ---- MAIN LOOP ----

    let cycle_period = exec_params.cycle_period();
    let num_cycles = exec_params.num_cycles();

    let mut pose = pose_from_array(&exec_params.initial_pose);
    let mut vel = Twist2::default();

    align_ctrl.reset(0.0);

    info!("Begining main loop\n");

    for cycle in 0..num_cycles {
        let cycle_start_instant = Instant::now();
        let time_s = cycle as f64 * exec_params.cycle_period_s;

        // ---- SENSING ----

        for m in modules.iter() {
            m.read_periodic_inputs(time_s)
                .wrap_err_with(|| format!("Failed to read swerve module {}", m.module_num()))?;
        }

        // ---- ALIGNMENT CONTROL ----

        let input = align_ctrl::InputData {
            timestamp_s: time_s,
            pose,
            vel
        };

        let speeds = match align_ctrl.proc(&input) {
            Ok((s, report)) => {
                debug!(
                    "AlignCtrl errors: x {:.3} m, y {:.3} m, head {:.3} rad",
                    report.x_error_m, report.y_error_m, report.head_error_rad
                );
                s
            },
            Err(AlignCtrlError::NoTarget) => {
                debug!("Waiting for an alignment target");
                ChassisSpeeds::default()
            },
            Err(e) => return Err(e).wrap_err("AlignCtrl processing failed")
        };

        // ---- MODULE DEMANDS ----

        let states = kinematics.to_module_states(&speeds.to_robot_relative(pose.heading_rad));

        for (m, s) in modules.iter().zip(states.iter()) {
            m.set_velocity(s);
            m.write_periodic_outputs()
                .wrap_err_with(|| format!("Failed to write swerve module {}", m.module_num()))?;
            m.with_hw(|hw| hw.step(exec_params.cycle_period_s));
            m.output_telemetry();
        }

        // ---- SIMULATED CHASSIS ----

        pose.position_m[0] += speeds.vx_ms * exec_params.cycle_period_s;
        pose.position_m[1] += speeds.vy_ms * exec_params.cycle_period_s;
        pose.heading_rad += speeds.omega_rads * exec_params.cycle_period_s;
        vel = Twist2::new(speeds.vx_ms, speeds.vy_ms, speeds.omega_rads);

        // ---- WRITE ARCHIVES ----

        if let Err(e) = align_ctrl.write() {
            warn!("AlignCtrl archive error: {}", e);
        }
        for m in modules.iter_mut() {
            if let Err(e) = m.write() {
                warn!("Swerve module {} archive error: {}", m.module_num(), e);
            }
        }

        if align_ctrl.auto_align_complete() {
            info!(
                "Aligned at ({:.3}, {:.3}, {:.3})",
                pose.x_m(), pose.y_m(), pose.heading_rad
            );
            break
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        match cycle_period.checked_sub(cycle_dur) {
            Some(d) => thread::sleep(d),
            None => warn!(
                "Cycle overran by {:.06} s",
                cycle_dur.as_secs_f64() - cycle_period.as_secs_f64()
            )
        }
    }

    if !align_ctrl.auto_align_complete() {
        warn!("Alignment did not complete within {} s", exec_params.max_run_time_s);
    }

    // Stop the wheels before exiting
    for m in modules.iter() {
        m.set_velocity(&Default::default());
        m.write_periodic_outputs()
            .wrap_err_with(|| format!("Failed to stop swerve module {}", m.module_num()))?;
    }

    if vision_thread.join().is_err() {
        warn!("Vision pipeline panicked");
    }

    info!("End of execution");

    Ok(())
}

/// Simulated vision pipeline.
///
/// Two cameras observe the target, the observations are checked against each other and if
/// consistent the target is published to the alignment controller.
fn run_vision(check: VisionCheck, handle: TargetHandle, target: Pose2, delay: Duration) {
    thread::sleep(delay);

    // Matched target corners, the cameras form a rectified pair
    let corners_px = [[320.0, 180.0], [400.0, 180.0], [400.0, 260.0], [320.0, 260.0]];
    let disparity_px = 24.0;

    let update = |cam_id, area, shift_px: f64| VisionUpdate {
        cam_id,
        timestamp_s: util::session::get_elapsed_seconds(),
        target_area_pct: area,
        field_to_robot_m: [target.x_m(), target.y_m()],
        features_px: corners_px.iter().map(|c| [c[0] - shift_px, c[1]]).collect()
    };

    let updates = vec![
        update(CamId::Right, 2.5, 0.0),
        update(CamId::Left, 1.8, disparity_px),
        update(CamId::Up, 0.0, 0.0)
    ];

    let dom = match best_device(&updates) {
        Some(u) => u,
        None => {
            warn!("No camera can see the target");
            return
        }
    };
    let sub = match updates.iter().find(|u| u.cam_id != dom.cam_id && u.target_area_pct > 0.0) {
        Some(u) => u,
        None => {
            warn!("Only one camera can see the target, not publishing");
            return
        }
    };

    // Each camera's estimate of its own pose, consistent with the mounting calibration
    let dom_pose = Isometry3::from_parts(
        Translation3::new(target.x_m(), target.y_m(), 0.5),
        UnitQuaternion::from_euler_angles(0.0, 0.0, target.heading_rad)
    );
    let sub_pose = dom_pose * check.expected_delta().0;

    match check.accept(dom, sub, &dom_pose, &sub_pose) {
        Ok(true) => {
            info!("Vision target from {:?} accepted", dom.cam_id);
            handle.set(target);
        },
        Ok(false) => warn!("Vision target rejected"),
        Err(e) => warn!("Vision check failed: {}", e)
    }
}

fn pose_from_array(p: &[f64; 3]) -> Pose2 {
    Pose2::new(p[0], p[1], p[2])
}
