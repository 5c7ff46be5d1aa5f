//! Inbound sensor and location events
//!
//! Producers (sensor and location callbacks) hold an [`EventSender`]; a
//! single ingestion task owns the receiving end and applies every event to
//! the shared [`DeviceContext`].

use crate::context::DeviceContext;
use crate::error::FinderError;
use crate::location::FixFilter;
use crate::types::{FixFilterSettings, GeoPoint, SensorKind};
use log::{debug, trace};
use nalgebra::Vector3;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// A single input delivered by the platform
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeviceEvent {
    /// Raw orientation sensor sample
    Sensor(SensorKind, Vector3<f32>),
    /// Location fix
    Location(GeoPoint),
}

/// Cloneable sending end of the event channel
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<DeviceEvent>,
}

impl EventSender {
    /// Deliver an event; fails once ingestion has stopped
    pub fn send(&self, event: DeviceEvent) -> Result<(), FinderError> {
        self.tx.send(event).map_err(|_| FinderError::IngestClosed)
    }

    pub fn accelerometer(&self, reading: Vector3<f32>) -> Result<(), FinderError> {
        self.send(DeviceEvent::Sensor(SensorKind::Accelerometer, reading))
    }

    pub fn magnetometer(&self, reading: Vector3<f32>) -> Result<(), FinderError> {
        self.send(DeviceEvent::Sensor(SensorKind::Magnetometer, reading))
    }

    /// Deliver a location fix given in degrees
    pub fn location(&self, latitude: f64, longitude: f64) -> Result<(), FinderError> {
        let point = GeoPoint::new(latitude, longitude)?;
        self.send(DeviceEvent::Location(point))
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receiving end of the event channel
#[derive(Debug)]
pub struct EventReceiver {
    rx: mpsc::UnboundedReceiver<DeviceEvent>,
}

/// Create a connected sender/receiver pair
pub fn event_channel() -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender { tx }, EventReceiver { rx })
}

/// Apply events to `context` until every sender has been dropped
///
/// Sensor samples are applied as they arrive. Location fixes go through a
/// [`FixFilter`] first.
pub async fn ingest(
    context: Arc<DeviceContext>,
    mut events: EventReceiver,
    fix_filter: FixFilterSettings,
) {
    let mut filter = FixFilter::new(fix_filter);

    while let Some(event) = events.rx.recv().await {
        match event {
            DeviceEvent::Sensor(kind, reading) => {
                trace!("{kind:?} sample {reading:?}");
                context.update_sensor(kind, reading);
            }
            DeviceEvent::Location(point) => {
                if filter.accept(point, Instant::now()) {
                    debug!(
                        "location fix: latitude {}, longitude {}",
                        point.latitude(),
                        point.longitude()
                    );
                    context.record_fix(point);
                } else {
                    trace!("location fix throttled");
                }
            }
        }
    }

    debug!("all event senders dropped, ingestion finished");
}
