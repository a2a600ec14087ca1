//! Implementations for the AlignCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};

// Internal
use super::*;
use crate::loc::{ChassisSpeeds, Pose2, Twist2};
use util::{
    archive::{Archived, Archiver, ArchiveError},
    maths::wrap_pi,
    module::State,
    params,
    session::Session
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The pose the controller converges to. Heading is continuous.
pub type TargetPose = Pose2;

/// Shared slot holding the current target.
///
/// Targets are immutable snapshots, publishing a new one replaces the whole pose so a reader
/// never sees a mix of two targets.
#[derive(Debug, Clone, Default)]
pub struct TargetHandle {
    slot: Arc<Mutex<Option<Arc<TargetPose>>>>
}

/// Alignment control module state
pub struct AlignCtrl {
    params: Params,

    target: TargetHandle,

    x_ctrl: ProfileFollower,
    y_ctrl: ProfileFollower,
    head_ctrl: HeadingCtrl,

    /// True while all three axes are deadbanded.
    complete: bool,

    /// Time of the last reset, cleared once the convergence latency has been reported.
    start_time_s: Option<f64>,

    last_align_duration_s: Option<f64>,

    report: StatusReport,
    arch_report: Archiver
}

/// Input data to AlignCtrl.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputData {
    /// Units: seconds
    pub timestamp_s: f64,

    /// Current pose estimate
    pub pose: Pose2,

    /// Current velocity estimate, field frame
    pub vel: Twist2
}

/// Status report for AlignCtrl processing.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StatusReport {
    pub timestamp_s: f64,

    pub x_error_m: f64,
    pub y_error_m: f64,
    pub head_error_rad: f64,

    pub x_output_ms: f64,
    pub y_output_ms: f64,
    pub head_output_rads: f64,

    pub x_deadband: bool,
    pub y_deadband: bool,
    pub head_deadband: bool,

    pub complete: bool
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TargetHandle {
    /// Publish a new target.
    pub fn set(&self, target: TargetPose) {
        *self.lock() = Some(Arc::new(target));
    }

    /// Get the latest target, if one has been published.
    pub fn get(&self) -> Option<Arc<TargetPose>> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Arc<TargetPose>>> {
        // The slot only ever holds a complete value, so a poisoned lock is still usable.
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for AlignCtrl {
    fn default() -> Self {
        Self::new(Params::default())
    }
}

impl AlignCtrl {
    pub fn new(params: Params) -> Self {
        Self {
            x_ctrl: ProfileFollower::new(params.follower),
            y_ctrl: ProfileFollower::new(params.follower),
            head_ctrl: HeadingCtrl::new(&params.heading),
            params,
            target: TargetHandle::default(),
            complete: false,
            start_time_s: None,
            last_align_duration_s: None,
            report: StatusReport::default(),
            arch_report: Archiver::default()
        }
    }

    /// Start a new alignment attempt at `timestamp_s`.
    ///
    /// Clears the profile history of both translational axes and the completion flag.
    pub fn reset(&mut self, timestamp_s: f64) {
        self.start_time_s = Some(timestamp_s);
        self.x_ctrl.reset_profile();
        self.x_ctrl.reset_setpoint();
        self.y_ctrl.reset_profile();
        self.y_ctrl.reset_setpoint();
        self.head_ctrl.reset();
        self.complete = false;
    }

    /// Replace the target pose.
    pub fn set_target_point(&self, target: TargetPose) {
        self.target.set(target);
    }

    /// Get a handle through which other threads can publish targets.
    pub fn target_handle(&self) -> TargetHandle {
        self.target.clone()
    }

    /// Calculate the field relative chassis speeds which move the robot towards the target.
    ///
    /// Fails with `NoTarget` if no target has ever been set.
    pub fn update(
        &mut self,
        timestamp_s: f64,
        pose: &Pose2,
        vel: &Twist2
    ) -> Result<ChassisSpeeds, AlignCtrlError> {
        let target = self.target.get().ok_or(AlignCtrlError::NoTarget)?;
        let p = &self.params;

        self.x_ctrl.set_goal_and_constraints(
            MotionProfileGoal::new(target.x_m(), p.x_pos_tol_m, p.x_vel_tol_ms),
            p.profile
        );
        self.y_ctrl.set_goal_and_constraints(
            MotionProfileGoal::new(target.y_m(), p.y_pos_tol_m, p.y_vel_tol_ms),
            p.profile
        );
        self.head_ctrl.set_snap_target(target.heading_rad);

        // Setpoints are taken one control period ahead
        let setpoint_time_s = timestamp_s + p.control_period_s;

        let x_output = self.x_ctrl.update(
            MotionState::new(timestamp_s, pose.x_m(), vel.dx_ms * p.measured_vel_scale, 0.0),
            setpoint_time_s
        );
        let y_output = self.y_ctrl.update(
            MotionState::new(timestamp_s, pose.y_m(), vel.dy_ms * p.measured_vel_scale, 0.0),
            setpoint_time_s
        );
        let head_output = self.head_ctrl.update(pose.heading_rad, timestamp_s);

        let head_dist_rad = wrap_pi(target.heading_rad - pose.heading_rad).abs();
        let head_deadband = head_dist_rad < p.head_tol_rad
            && head_output.abs() < p.head_output_tol_rads;
        let x_deadband = self.x_ctrl.on_target();
        let y_deadband = self.y_ctrl.on_target();

        let speeds = ChassisSpeeds::new(
            if x_deadband { 0.0 } else { x_output },
            if y_deadband { 0.0 } else { y_output },
            if head_deadband { 0.0 } else { head_output }
        );

        self.complete = x_deadband && y_deadband && head_deadband;

        if self.complete {
            if let Some(start_s) = self.start_time_s.take() {
                let duration_s = timestamp_s - start_s;
                info!("Auto align took: {:.3} s", duration_s);
                self.last_align_duration_s = Some(duration_s);
            }
        }

        self.report = StatusReport {
            timestamp_s,
            x_error_m: target.x_m() - pose.x_m(),
            y_error_m: target.y_m() - pose.y_m(),
            head_error_rad: self.head_ctrl.error_rad(),
            x_output_ms: speeds.vx_ms,
            y_output_ms: speeds.vy_ms,
            head_output_rads: speeds.omega_rads,
            x_deadband,
            y_deadband,
            head_deadband,
            complete: self.complete
        };

        debug!("AlignCtrl output: {:?}", speeds);

        Ok(speeds)
    }

    /// True if every axis was deadbanded on the last update.
    pub fn auto_align_complete(&self) -> bool {
        self.complete
    }

    /// Time taken by the last attempt to converge, measured from its reset.
    ///
    /// Units: seconds
    pub fn last_align_duration_s(&self) -> Option<f64> {
        self.last_align_duration_s
    }

    pub fn params(&self) -> &Params {
        &self.params
    }
}

impl State for AlignCtrl {
    type InitData = &'static str;
    type InitError = AlignCtrlError;

    type InputData = InputData;
    type OutputData = ChassisSpeeds;
    type StatusReport = StatusReport;
    type ProcError = AlignCtrlError;

    /// Initialise the AlignCtrl module.
    ///
    /// Expected init data is the path to the parameter file. Any target already published through
    /// a handle is kept.
    fn init(&mut self, init_data: Self::InitData, session: &Session)
        -> Result<(), Self::InitError>
    {
        let params: Params = params::load(init_data)
            .map_err(AlignCtrlError::ParamLoadError)?;

        let target = self.target.clone();
        *self = Self::new(params);
        self.target = target;

        self.arch_report = Archiver::from_path(session, "align_ctrl/status_report.csv")
            .map_err(AlignCtrlError::ArchiveError)?;

        Ok(())
    }

    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        let speeds = self.update(input_data.timestamp_s, &input_data.pose, &input_data.vel)?;

        Ok((speeds, self.report))
    }
}

impl Archived for AlignCtrl {
    fn write(&mut self) -> Result<(), ArchiveError> {
        self.arch_report.serialise(self.report)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
