//! # Swerve Control Benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use drive_lib::{
    align_ctrl::AlignCtrl,
    loc::{ChassisSpeeds, Pose2, Twist2},
    swerve_ctrl::{resolve_steering, ModuleState, Params, SimModuleHw, SwerveKinematics, SwerveModule},
};

fn swerve_ctrl_benchmark(c: &mut Criterion) {
    // ---- Steering resolution ----

    c.bench_function("resolve_steering", |b| {
        b.iter(|| resolve_steering(black_box(170.0), black_box(-1085.0)))
    });

    // ---- Full module cycle ----

    let params = Params::default();
    let module = SwerveModule::new(
        0,
        params.clone(),
        SimModuleHw::new(45.0, params.drv_kv),
    )
    .unwrap();
    let mut kinematics = SwerveKinematics::new(&params);

    c.bench_function("SwerveModule::cycle", |b| {
        b.iter(|| {
            let states = kinematics.to_module_states(&ChassisSpeeds::new(1.2, -0.4, 0.8));
            module.read_periodic_inputs(0.0).unwrap();
            module.set_velocity(&states[0]);
            module.write_periodic_outputs().unwrap();
        })
    });

    c.bench_function("SwerveModule::set_velocity::dead_zone", |b| {
        b.iter(|| module.set_velocity(&ModuleState::new(black_box(1e-5), 30.0)))
    });

    // ---- Alignment control ----

    let mut align_ctrl = AlignCtrl::default();
    align_ctrl.reset(0.0);
    align_ctrl.set_target_point(Pose2::new(2.0, 1.0, 0.5));

    let mut t = 0.0;
    c.bench_function("AlignCtrl::update", |b| {
        b.iter(|| {
            t += 0.02;
            align_ctrl
                .update(t, &Pose2::new(0.5, 0.2, -0.1), &Twist2::new(0.4, 0.1, 0.0))
                .unwrap()
        })
    });
}

criterion_group!(benches, swerve_ctrl_benchmark);
criterion_main!(benches);
