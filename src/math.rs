//! Angle helpers shared by the compass, bearing and scheduler modules

/// Mathematical constants
pub const DEG_TO_RAD: f64 = core::f64::consts::PI / 180.0;
pub const RAD_TO_DEG: f64 = 180.0 / core::f64::consts::PI;

/// Wrap an angle in degrees into `[0, 360)`
///
/// Equivalent to `(angle + 360) mod 360` for inputs in `(-360, 360)`, and
/// also correct for any other finite input.
///
/// # Example
/// ```
/// use qibla_compass::normalize_degrees;
///
/// assert_eq!(normalize_degrees(-90.0), 270.0);
/// assert_eq!(normalize_degrees(360.0), 0.0);
/// assert_eq!(normalize_degrees(450.0), 90.0);
/// ```
pub fn normalize_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);

    // rem_euclid rounds tiny negative inputs up to exactly 360.0
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Clockwise rotation from the current heading to a bearing, in `[0, 360)`
///
/// This is the angle the arrow has to be drawn at so that it points along
/// `bearing` while the device faces `heading`.
pub fn rotation_needed(bearing: f64, heading: f64) -> f64 {
    normalize_degrees(bearing - heading)
}
