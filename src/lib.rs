//! Qibla Compass - a direction engine for pointing at the Kaaba
//!
//! This library turns a stream of accelerometer and magnetometer samples and
//! occasional GPS fixes into the angle an arrow has to be drawn at so that it
//! points towards the Kaaba in Mecca, and drives a low-rate display loop that
//! shows either "searching for location" or that arrow.
//!
//! # Features
//!
//! - Tilt-compensated compass heading from one accelerometer and one
//!   magnetometer reading
//! - Initial great-circle bearing on a spherical Earth
//! - Sticky location state: once a fix arrives the arrow is always shown
//! - Activate/deactivate display loop on tokio with bounded-latency stop
//! - Channel-based ingestion of platform sensor and location callbacks
//!
//! No magnetic declination correction is applied; the arrow is relative to
//! magnetic north.
//!
//! # Quick Start
//!
//! ```rust
//! use nalgebra::Vector3;
//! use qibla_compass::{DeviceContext, GeoPoint, RenderCommand, SensorKind, display_command};
//!
//! let context = DeviceContext::default();
//!
//! // No fix yet
//! assert_eq!(display_command(&context), RenderCommand::ShowSearching);
//!
//! // Device lying flat, top edge facing magnetic north, in London
//! context.update_sensor(SensorKind::Accelerometer, Vector3::new(0.0, 0.0, 9.81));
//! context.update_sensor(SensorKind::Magnetometer, Vector3::new(0.0, 22.0, -40.0));
//! context.record_fix(GeoPoint::new(51.5074, -0.1278).unwrap());
//!
//! let RenderCommand::ShowBearing(angle) = display_command(&context) else {
//!     panic!("a fix was recorded, expected a bearing");
//! };
//! assert!((angle - 119.0).abs() < 0.5);
//! ```
//!
//! For a full session with the periodic loop see [`QiblaFinder`].

pub mod bearing;
pub mod compass;
mod context;
mod error;
pub mod events;
mod finder;
mod location;
mod math;
mod orientation;
mod render;
mod scheduler;
mod types;

// Re-export all public types and functions
pub use bearing::{KAABA, distance_m, initial_bearing, qibla_bearing};
pub use compass::calculate_heading;
pub use context::DeviceContext;
pub use error::{ConfigError, FinderError, GeoError, SchedulerError};
pub use events::{DeviceEvent, EventSender};
pub use finder::{QiblaFinder, TITLE};
pub use location::{FixFilter, LocationSnapshot, LocationState};
pub use math::{DEG_TO_RAD, RAD_TO_DEG, normalize_degrees, rotation_needed};
pub use orientation::OrientationTracker;
pub use render::{LogRenderer, RenderCommand, Renderer};
pub use scheduler::{DisplayScheduler, display_command};
pub use types::*;
