//! Owned device state shared by event ingestion and the display loop

use crate::location::LocationState;
use crate::orientation::OrientationTracker;
use crate::types::{CompassSettings, GeoPoint, SensorKind};
use nalgebra::Vector3;

/// Everything the display loop reads: orientation sensors and position
///
/// Usually wrapped in an `Arc` and handed to both the producers of sensor
/// events and the [`DisplayScheduler`](crate::DisplayScheduler). The two
/// halves are synchronised independently.
#[derive(Debug, Default)]
pub struct DeviceContext {
    orientation: OrientationTracker,
    location: LocationState,
}

impl DeviceContext {
    pub fn new(settings: CompassSettings) -> Self {
        Self {
            orientation: OrientationTracker::with_settings(settings),
            location: LocationState::new(),
        }
    }

    pub fn orientation(&self) -> &OrientationTracker {
        &self.orientation
    }

    pub fn location(&self) -> &LocationState {
        &self.location
    }

    /// Shorthand for `orientation().update(kind, reading)`
    pub fn update_sensor(&self, kind: SensorKind, reading: Vector3<f32>) {
        self.orientation.update(kind, reading);
    }

    /// Shorthand for `location().record_fix(point)`
    pub fn record_fix(&self, point: GeoPoint) {
        self.location.record_fix(point);
    }
}
