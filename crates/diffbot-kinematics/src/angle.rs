//! Heading arithmetic.
//!
//! Headings are carried unbounded through odometry. Comparisons between two
//! headings always go through [`angle_diff`] so that wrap-around never shows
//! up as a large error.

use core::f64::consts::PI;
use libm::{acos, cos, fmod, sin};

/// Signed rotation from heading `from` to heading `to`, in `(-PI, PI]`.
///
/// The magnitude is the arc-cosine of the dot product of the two heading unit
/// vectors and the sign is the sign of their cross product, so positive means
/// a counter-clockwise turn takes `from` onto `to`.
pub fn angle_diff(from: f64, to: f64) -> f64 {
    let (sin_a, cos_a) = (sin(from), cos(from));
    let (sin_b, cos_b) = (sin(to), cos(to));

    let dot = (cos_a * cos_b + sin_a * sin_b).clamp(-1.0, 1.0);
    let cross = cos_a * sin_b - sin_a * cos_b;

    let magnitude = acos(dot);
    // At a half turn the cross product is rounding noise; keep the `PI` end.
    if cross < 0.0 && magnitude < PI { -magnitude } else { magnitude }
}

/// Minimal signed rotation from `from` to `to`, in `(-PI, PI]`.
///
/// Computed by wrapping the raw difference rather than through unit vectors.
/// It agrees with [`angle_diff`] up to rounding and is the cheaper of the two
/// when called every tick.
pub fn angle_diff_min(from: f64, to: f64) -> f64 {
    let mut diff = fmod(to - from, 2.0 * PI);
    if diff > PI {
        diff -= 2.0 * PI;
    } else if diff <= -PI {
        diff += 2.0 * PI;
    }
    diff
}

/// Normalize an angle to be within `[-PI, PI)`.
///
/// Angles at `PI` will be normalized to `-PI`.
pub fn normalize_angle(angle: f64) -> f64 {
    let a = fmod(angle, 2.0 * PI);
    if a >= PI {
        a - 2.0 * PI
    } else if a < -PI {
        a + 2.0 * PI
    } else {
        a
    }
}
