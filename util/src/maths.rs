//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Clamp a value between a minimum and maximum.
pub fn clamp<T>(value: &T, min: &T, max: &T) -> T
where
    T: Float
{
    let mut ret = *value;

    if ret > *max {
        ret = *max
    }
    if ret < *min {
        ret = *min
    }

    ret
}

/// Returns true if `a` and `b` are within `epsilon` of each other.
pub fn epsilon_eq<T>(a: T, b: T, epsilon: T) -> bool
where
    T: Float
{
    (a - b).abs() <= epsilon
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it.
///
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. However, due to a floating point round-off error it can
/// result in `r == rhs.abs()`, violating the mathematical definition, if
/// `self` is much smaller than `rhs.abs()` in magnitude and `self < 0.0`.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float
{
    let r = lhs % rhs;
    if r < T::zero() { r + rhs.abs() } else { r }
}

/// Wrap an angle in radians into the range [-pi, pi).
pub fn wrap_pi<T>(value: T) -> T
where
    T: Float
{
    let pi_t: T = T::from(std::f64::consts::PI).unwrap();
    let tau_t: T = T::from(std::f64::consts::TAU).unwrap();

    rem_euclid(value + pi_t, tau_t) - pi_t
}

/// Wrap an angle in degrees into the range [-180, 180).
pub fn wrap_180_deg<T>(value: T) -> T
where
    T: Float
{
    let half_t: T = T::from(180.0).unwrap();
    let full_t: T = T::from(360.0).unwrap();

    rem_euclid(value + half_t, full_t) - half_t
}

/// Place `new_angle_deg` in the 0-360 degree scope that lies closest to
/// `scope_ref_deg`.
///
/// The returned angle is equivalent to `new_angle_deg` modulo 360 and is never
/// more than 180 degrees away from `scope_ref_deg`. Used to seed an unbounded
/// (multi-revolution) angle from an absolute sensor reading.
pub fn place_in_0_to_360_scope<T>(scope_ref_deg: T, new_angle_deg: T) -> T
where
    T: Float
{
    let full_t: T = T::from(360.0).unwrap();
    let half_t: T = T::from(180.0).unwrap();

    let lower_offset = scope_ref_deg % full_t;
    let (lower_bound, upper_bound) = if lower_offset >= T::zero() {
        (scope_ref_deg - lower_offset, scope_ref_deg + (full_t - lower_offset))
    }
    else {
        (scope_ref_deg - (full_t + lower_offset), scope_ref_deg - lower_offset)
    };

    let mut angle = new_angle_deg;
    while angle < lower_bound {
        angle = angle + full_t;
    }
    while angle > upper_bound {
        angle = angle - full_t;
    }

    if angle - scope_ref_deg > half_t {
        angle = angle - full_t;
    }
    else if angle - scope_ref_deg < -half_t {
        angle = angle + full_t;
    }

    angle
}
