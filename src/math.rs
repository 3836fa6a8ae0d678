use std::ops::{Add, Rem, Sub};

/// Factor converting radians to degrees.
pub const RAD_TO_DEG: f64 = 180_f64 / std::f64::consts::PI;

/// Factor converting degrees to radians.
pub const DEG_TO_RAD: f64 = std::f64::consts::PI / 180_f64;

/// Restricts `value` to the closed range `[min, max]`.
///
/// `min` must not be greater than `max`.
///
/// # Example
/// ```rust
/// # use tile_downloader::math::clamp;
/// assert_eq!(clamp(12, 0, 10), 10);
/// assert_eq!(clamp(-0.5, 0.0, 1.0), 0.0);
/// ```
pub fn clamp<T: PartialOrd>(value: T, min: T, max: T) -> T {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// Returns the remainder of `x / m` in `[0, m)`, even for negative `x`.
///
/// `m` must be positive.
pub fn non_negative_mod<T>(x: T, m: T) -> T
where
    T: Copy + Add<Output = T> + Rem<Output = T>,
{
    (x % m + m) % m
}

/// Wraps `value` into the half open range `[min, max)`.
///
/// # Example
/// ```rust
/// # use tile_downloader::math::wrap;
/// assert_eq!(wrap(10, 0, 10), 0);
/// assert_eq!(wrap(11, 0, 10), 1);
/// assert_eq!(wrap(-1, 0, 10), 9);
/// ```
pub fn wrap<T>(value: T, min: T, max: T) -> T
where
    T: Copy + Add<Output = T> + Sub<Output = T> + Rem<Output = T>,
{
    non_negative_mod(value - min, max - min) + min
}
