//! Latest accelerometer and magnetometer readings and the heading they imply

use crate::compass::{calculate_heading, orientation_angles, rotation_matrix};
use crate::types::{CompassSettings, OrientationAngles, SensorKind};
use nalgebra::Vector3;
use std::sync::{PoisonError, RwLock};

/// Tracks the most recent reading of each orientation sensor
///
/// Each sensor has its own slot, so the accelerometer and magnetometer
/// streams never contend with each other. Readings are overwritten in place
/// and nothing is kept beyond the latest sample. If one sensor stops
/// reporting, the heading is silently derived from its last value.
///
/// Both slots start at the zero vector, which does not fuse, so no heading
/// is available until both sensors have reported.
///
/// Every update that leaves the pair fusable also records the resulting
/// heading. That last good heading survives later degenerate readings and
/// is shared by every display loop reading this tracker.
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use qibla_compass::{OrientationTracker, SensorKind};
///
/// let tracker = OrientationTracker::new();
/// tracker.update(SensorKind::Accelerometer, Vector3::new(0.0, 0.0, 9.81));
/// assert!(tracker.current_heading().is_none());
///
/// tracker.update(SensorKind::Magnetometer, Vector3::new(0.0, 22.0, -40.0));
/// assert!(tracker.current_heading().unwrap() < 1e-3);
///
/// // Field parallel to gravity: no heading now, but the last one is kept
/// tracker.update(SensorKind::Magnetometer, Vector3::new(0.0, 0.0, -40.0));
/// assert!(tracker.current_heading().is_none());
/// assert!(tracker.last_heading().unwrap() < 1e-3);
/// ```
#[derive(Debug)]
pub struct OrientationTracker {
    settings: CompassSettings,
    accelerometer: RwLock<Vector3<f32>>,
    magnetometer: RwLock<Vector3<f32>>,
    last_heading: RwLock<Option<f64>>,
}

impl OrientationTracker {
    /// Create a tracker with default fusion thresholds
    pub fn new() -> Self {
        Self::with_settings(CompassSettings::default())
    }

    /// Create a tracker with the given fusion thresholds
    pub fn with_settings(settings: CompassSettings) -> Self {
        Self {
            settings,
            accelerometer: RwLock::new(Vector3::zeros()),
            magnetometer: RwLock::new(Vector3::zeros()),
            last_heading: RwLock::new(None),
        }
    }

    pub fn settings(&self) -> CompassSettings {
        self.settings
    }

    /// Store the latest reading for `kind`, replacing the previous one
    ///
    /// If the stored pair fuses afterwards, its heading becomes the new
    /// [`last_heading`](Self::last_heading).
    pub fn update(&self, kind: SensorKind, reading: Vector3<f32>) {
        // A Vector3 is written in one assignment, so a poisoned slot still
        // holds a complete reading
        *self
            .slot(kind)
            .write()
            .unwrap_or_else(PoisonError::into_inner) = reading;

        if let Some(heading) = self.current_heading() {
            *self
                .last_heading
                .write()
                .unwrap_or_else(PoisonError::into_inner) = Some(heading);
        }
    }

    /// Latest reading for `kind`
    pub fn reading(&self, kind: SensorKind) -> Vector3<f32> {
        *self
            .slot(kind)
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Current heading in degrees within `[0, 360)`, if the latest readings fuse
    pub fn current_heading(&self) -> Option<f64> {
        let (accelerometer, magnetometer) = self.readings();
        calculate_heading(accelerometer, magnetometer, &self.settings)
    }

    /// Heading of the most recent update that fused, if any ever did
    pub fn last_heading(&self) -> Option<f64> {
        *self
            .last_heading
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Current azimuth, pitch and roll, if the latest readings fuse
    pub fn current_orientation(&self) -> Option<OrientationAngles> {
        let (accelerometer, magnetometer) = self.readings();
        rotation_matrix(accelerometer, magnetometer, &self.settings)
            .map(|rotation| orientation_angles(&rotation))
    }

    fn readings(&self) -> (Vector3<f32>, Vector3<f32>) {
        (
            self.reading(SensorKind::Accelerometer),
            self.reading(SensorKind::Magnetometer),
        )
    }

    fn slot(&self, kind: SensorKind) -> &RwLock<Vector3<f32>> {
        match kind {
            SensorKind::Accelerometer => &self.accelerometer,
            SensorKind::Magnetometer => &self.magnetometer,
        }
    }
}

impl Default for OrientationTracker {
    fn default() -> Self {
        Self::new()
    }
}
