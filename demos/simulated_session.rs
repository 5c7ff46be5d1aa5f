//! Simulated qibla finder session
//!
//! Run with `RUST_LOG=info cargo run --example simulated_session` to see the
//! display output. The device slowly turns on the spot in London while a GPS
//! fix arrives one second after the display loop starts.

use nalgebra::Vector3;
use qibla_compass::{FinderError, FinderSettings, LogRenderer, QiblaFinder};
use std::sync::Arc;
use std::time::Duration;

const SAMPLE_PERIOD: Duration = Duration::from_millis(20); // 50 Hz sensors

#[tokio::main]
async fn main() -> Result<(), FinderError> {
    env_logger::init();

    let (finder, events) = QiblaFinder::start(FinderSettings::default(), Arc::new(LogRenderer))?;
    finder.activate()?;

    let sensors = events.clone();
    let producer = tokio::spawn(async move {
        let mut heading: f32 = 0.0;
        let mut interval = tokio::time::interval(SAMPLE_PERIOD);

        loop {
            interval.tick().await;

            // Device lying flat, turning 18 degrees per second
            heading = (heading + 0.36) % 360.0;
            let angle = heading.to_radians();
            let field = Vector3::new(-22.0 * angle.sin(), 22.0 * angle.cos(), -40.0);

            if sensors.accelerometer(Vector3::new(0.0, 0.0, 9.81)).is_err()
                || sensors.magnetometer(field).is_err()
            {
                break;
            }
        }
    });

    tokio::time::sleep(Duration::from_secs(1)).await;
    events.location(51.5074, -0.1278)?;

    tokio::time::sleep(Duration::from_secs(3)).await;
    finder.deactivate().await;
    println!("display stopped, active: {}", finder.is_active());

    finder.shutdown().await;
    producer.await.ok();

    Ok(())
}
