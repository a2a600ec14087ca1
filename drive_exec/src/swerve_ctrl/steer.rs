//! Steering resolution

use util::maths::wrap_180_deg;

/// Quarter turn limit on the steering correction.
///
/// Units: degrees
const MAX_STEER_DELTA_DEG: f64 = 90.0;

/// Resolve a desired module direction into a steer demand with minimal rotation.
///
/// # Inputs
/// - `desired_deg`: desired direction of travel of the wheel, any range
/// - `current_unbounded_deg`: the present unbounded steer angle
///
/// # Outputs
/// - The commanded unbounded steer angle, never more than 90 degrees from the current angle
/// - True if the drive direction must be reversed
pub fn resolve_steering(desired_deg: f64, current_unbounded_deg: f64) -> (f64, bool) {
    let mut delta_deg = wrap_180_deg(desired_deg - current_unbounded_deg);
    let mut flip = false;

    if delta_deg > MAX_STEER_DELTA_DEG {
        delta_deg -= 180.0;
        flip = true;
    }
    else if delta_deg < -MAX_STEER_DELTA_DEG {
        delta_deg += 180.0;
        flip = true;
    }

    (current_unbounded_deg + delta_deg, flip)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_quarter_turn_flip() {
        let (cmd, flip) = resolve_steering(170.0, 0.0);
        assert!((cmd + 10.0).abs() < 1e-9);
        assert!(flip);

        let (cmd, flip) = resolve_steering(80.0, 0.0);
        assert!((cmd - 80.0).abs() < 1e-9);
        assert!(!flip);

        // Multi revolution current angle, result stays in the same revolution
        let (cmd, flip) = resolve_steering(10.0, 720.0 + 350.0);
        assert!((cmd - (720.0 + 370.0)).abs() < 1e-9);
        assert!(!flip);

        // Directly behind
        let (cmd, flip) = resolve_steering(180.0, 0.0);
        assert!(cmd.abs() < 1e-9);
        assert!(flip);
    }

    #[test]
    fn test_all_angles_minimal() {
        let mut desired = -720.0;
        while desired <= 720.0 {
            let mut current = -1080.0;
            while current <= 1080.0 {
                let (cmd, flip) = resolve_steering(desired, current);
                let delta = cmd - current;
                assert!(delta.abs() <= 90.0 + 1e-9, "{} -> {}: {}", current, desired, delta);

                let raw = wrap_180_deg(desired - current);
                assert_eq!(flip, raw.abs() > 90.0, "{} -> {}", current, desired);

                // The commanded direction, reversed if flipped, points where we asked
                let pointing = if flip { cmd + 180.0 } else { cmd };
                let err = wrap_180_deg(pointing - desired);
                assert!(err.abs() < 1e-6 || (err.abs() - 360.0).abs() < 1e-6);

                current += 37.0;
            }
            desired += 7.5;
        }
    }

    #[test]
    fn test_incremental_sweep() {
        let mut current = 0.0;
        let mut desired = 0.0;

        for _ in 0..720 {
            desired += 1.0;
            let (cmd, _) = resolve_steering(desired, current);
            assert!((cmd - current).abs() <= 90.0);
            current = cmd;
        }

        // Two full turns of the desired direction and the module followed continuously
        assert!((current - 720.0).abs() < 1e-6);
    }
}
