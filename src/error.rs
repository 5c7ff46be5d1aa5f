//! Error types for the qibla-compass library
//!
//! None of these can occur on the tick path. They cover invalid inputs at
//! the API boundary, configuration problems and lifecycle misuse.

/// Invalid geographic coordinates.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum GeoError {
    #[error("Latitude {0} is outside [-90, 90]")]
    Latitude(f64),

    #[error("Longitude {0} is outside [-180, 180]")]
    Longitude(f64),
}

/// Invalid or unreadable settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Malformed settings: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Tick period must be greater than zero")]
    ZeroTickPeriod,

    #[error("Threshold {name} must be finite and non-negative, got {value}")]
    InvalidThreshold { name: &'static str, value: f64 },
}

/// Errors raised when starting the display loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SchedulerError {
    #[error("No tokio runtime is available to drive the display loop")]
    NoRuntime,
}

/// Errors raised by a [`QiblaFinder`](crate::QiblaFinder) session.
#[derive(Debug, thiserror::Error)]
pub enum FinderError {
    #[error("Event ingestion has stopped")]
    IngestClosed,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Geo(#[from] GeoError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}
