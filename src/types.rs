//! Core types and settings for the qibla-compass library

use crate::error::{ConfigError, GeoError};
use core::time::Duration;
use serde::{Deserialize, Serialize};

/// Kind of raw orientation sensor a sample comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKind {
    /// Acceleration including gravity, in the platform's units (m/s²)
    Accelerometer,
    /// Ambient magnetic field, in the platform's units (µT)
    Magnetometer,
}

/// A geographic position in degrees
///
/// Latitude is within `[-90, 90]` and longitude within `[-180, 180]`;
/// [`GeoPoint::new`] rejects anything else, including NaN and infinities.
///
/// # Example
/// ```
/// use qibla_compass::GeoPoint;
///
/// let london = GeoPoint::new(51.5074, -0.1278).unwrap();
/// assert_eq!(london.latitude(), 51.5074);
///
/// assert!(GeoPoint::new(91.0, 0.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GeoPoint {
    pub(crate) latitude: f64,
    pub(crate) longitude: f64,
}

impl GeoPoint {
    /// Create a validated position
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(GeoError::Latitude(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(GeoError::Longitude(longitude));
        }

        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Latitude in degrees
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in degrees
    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// Device orientation extracted from the fused rotation matrix
///
/// All angles are in radians, following the platform convention: azimuth is
/// the rotation of the device's forward (Y) axis away from magnetic north,
/// positive clockwise when viewed from above.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OrientationAngles {
    /// Rotation about the up axis, `(-π, π]`
    pub azimuth: f32,
    /// Rotation about the device X axis, `[-π/2, π/2]`
    pub pitch: f32,
    /// Rotation about the device Y axis, `(-π, π]`
    pub roll: f32,
}

/// Sensor fusion thresholds
///
/// Below these limits the accelerometer/magnetometer pair is considered
/// degenerate and no heading is produced.
///
/// # Example
/// ```
/// use qibla_compass::CompassSettings;
///
/// let settings = CompassSettings {
///     min_horizontal_field: 5.0,   // stricter field check
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompassSettings {
    /// Minimum accelerometer magnitude, in accelerometer units
    ///
    /// Readings weaker than this look like free fall and carry no usable
    /// gravity direction. Defaults to 0.1 g.
    pub min_gravity: f32,
    /// Minimum magnitude of `magnetometer × accelerometer`, in the product
    /// of both sensors' units
    ///
    /// Small values mean the field is (nearly) parallel to gravity, e.g.
    /// close to a magnetic pole or under heavy interference.
    pub min_horizontal_field: f32,
}

impl Default for CompassSettings {
    fn default() -> Self {
        Self {
            min_gravity: 0.1 * STANDARD_GRAVITY,
            min_horizontal_field: 0.1,
        }
    }
}

/// Standard gravity in m/s²
pub const STANDARD_GRAVITY: f32 = 9.80665;

/// Throttling applied to incoming location fixes
///
/// A fix is applied only when at least `min_interval_ms` has elapsed **and**
/// the position moved by at least `min_distance_m` since the last applied
/// fix. The first fix is always applied. Set both to zero to apply every fix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixFilterSettings {
    /// Minimum time between applied fixes, milliseconds
    pub min_interval_ms: u64,
    /// Minimum movement between applied fixes, metres
    pub min_distance_m: f64,
}

impl Default for FixFilterSettings {
    fn default() -> Self {
        Self {
            min_interval_ms: 500,
            min_distance_m: 0.1,
        }
    }
}

impl FixFilterSettings {
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }
}

/// Settings for a [`QiblaFinder`](crate::QiblaFinder) session
///
/// # Example
/// ```
/// use qibla_compass::FinderSettings;
///
/// let settings = FinderSettings::from_json(r#"{ "tick_period_ms": 250 }"#).unwrap();
/// assert_eq!(settings.tick_period_ms, 250);
/// assert_eq!(settings.fix_filter.min_interval_ms, 500);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinderSettings {
    /// Display refresh period in milliseconds
    pub tick_period_ms: u64,
    /// Sensor fusion thresholds
    pub compass: CompassSettings,
    /// Location fix throttling
    pub fix_filter: FixFilterSettings,
}

impl Default for FinderSettings {
    fn default() -> Self {
        Self {
            tick_period_ms: 100,
            compass: CompassSettings::default(),
            fix_filter: FixFilterSettings::default(),
        }
    }
}

impl FinderSettings {
    /// Parse settings from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Serialize settings to pretty-printed JSON
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check that every value is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_period_ms == 0 {
            return Err(ConfigError::ZeroTickPeriod);
        }

        let thresholds = [
            ("compass.min_gravity", self.compass.min_gravity as f64),
            (
                "compass.min_horizontal_field",
                self.compass.min_horizontal_field as f64,
            ),
            ("fix_filter.min_distance_m", self.fix_filter.min_distance_m),
        ];
        for (name, value) in thresholds {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidThreshold { name, value });
            }
        }

        Ok(())
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }
}
