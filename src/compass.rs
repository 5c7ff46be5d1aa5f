//! Tilt-compensated compass for the qibla-compass library
//!
//! Fuses one accelerometer and one magnetometer reading into a rotation
//! matrix from device coordinates to world (east, north, up) coordinates,
//! the same primitive mobile platforms expose for orientation.

use crate::math::{RAD_TO_DEG, normalize_degrees};
use crate::types::{CompassSettings, OrientationAngles};
use nalgebra::{Matrix3, Vector3};

/// Build the device-to-world rotation matrix
///
/// Device axes: X to the right of the screen, Y towards the top of the
/// screen, Z out of the screen. The rows of the returned matrix are the world
/// east, north and up directions expressed in device coordinates.
///
/// Returns `None` when the readings cannot be fused: the accelerometer is
/// weaker than `settings.min_gravity` (free fall, or no sample yet), or the
/// magnetic field has almost no component perpendicular to gravity.
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use qibla_compass::{CompassSettings, compass::rotation_matrix};
///
/// let accel = Vector3::new(0.0, 0.0, 9.81);  // lying flat, screen up
/// let mag = Vector3::new(0.0, 22.0, -40.0);  // top edge facing north
/// let r = rotation_matrix(accel, mag, &CompassSettings::default()).unwrap();
/// assert!((r[(1, 1)] - 1.0).abs() < 1e-6);   // north is device +Y
///
/// assert!(rotation_matrix(accel, Vector3::zeros(), &CompassSettings::default()).is_none());
/// ```
pub fn rotation_matrix(
    accelerometer: Vector3<f32>,
    magnetometer: Vector3<f32>,
    settings: &CompassSettings,
) -> Option<Matrix3<f32>> {
    let gravity_squared = accelerometer.magnitude_squared();

    // Negated comparisons so that NaN readings are rejected as well
    if !(gravity_squared >= settings.min_gravity * settings.min_gravity) {
        return None;
    }

    // East is perpendicular to both the field and gravity
    let east = magnetometer.cross(&accelerometer);
    let east_magnitude = east.magnitude();
    if !(east_magnitude >= settings.min_horizontal_field) || east_magnitude == 0.0 {
        return None;
    }

    let east = east / east_magnitude;
    let up = accelerometer / gravity_squared.sqrt();
    let north = up.cross(&east);

    Some(Matrix3::from_rows(&[
        east.transpose(),
        north.transpose(),
        up.transpose(),
    ]))
}

/// Extract azimuth, pitch and roll from a rotation matrix
///
/// The matrix is expected in the layout produced by [`rotation_matrix`].
pub fn orientation_angles(rotation: &Matrix3<f32>) -> OrientationAngles {
    OrientationAngles {
        azimuth: rotation[(0, 1)].atan2(rotation[(1, 1)]),
        pitch: (-rotation[(2, 1)]).clamp(-1.0, 1.0).asin(),
        roll: (-rotation[(2, 0)]).atan2(rotation[(2, 2)]),
    }
}

/// Calculate the tilt-compensated magnetic heading of the device
///
/// The heading is the direction the device's Y axis (top of the screen)
/// points to, in degrees clockwise from magnetic north, within `[0, 360)`.
/// No declination correction is applied.
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use qibla_compass::{CompassSettings, calculate_heading};
///
/// let accel = Vector3::new(0.0, 0.0, 9.81);
/// let mag = Vector3::new(-22.0, 0.0, -40.0);  // north is to the left
/// let heading = calculate_heading(accel, mag, &CompassSettings::default()).unwrap();
/// assert!((heading - 90.0).abs() < 1e-3);      // facing east
/// ```
pub fn calculate_heading(
    accelerometer: Vector3<f32>,
    magnetometer: Vector3<f32>,
    settings: &CompassSettings,
) -> Option<f64> {
    let rotation = rotation_matrix(accelerometer, magnetometer, settings)?;
    let azimuth = orientation_angles(&rotation).azimuth as f64;

    Some(normalize_degrees(azimuth * RAD_TO_DEG))
}
