//! Periodic display loop driven by activate/deactivate signals
//!
//! The loop is a small state machine:
//!
//! ```text
//! Idle --activate--> Running --deactivate--> Stopping --activate--> Running
//! ```
//!
//! While running, every tick reads the [`DeviceContext`] and hands exactly
//! one [`RenderCommand`] to the [`Renderer`]. Cancellation is checked at
//! every tick boundary.

use crate::bearing::qibla_bearing;
use crate::context::DeviceContext;
use crate::error::SchedulerError;
use crate::math::rotation_needed;
use crate::render::{RenderCommand, Renderer};
use core::time::Duration;
use futures::future::{BoxFuture, Shared};
use futures::prelude::*;
use log::{debug, info, trace, warn};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use stream_cancel::{StreamExt, Trigger, Tripwire};
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Shortest period the loop accepts
const MIN_TICK_PERIOD: Duration = Duration::from_millis(1);

/// Choose the command for one tick from the current state of `context`
///
/// Without a fix this is [`RenderCommand::ShowSearching`]. Otherwise the
/// arrow angle uses the current heading. When the sensors cannot be fused
/// right now it uses the last heading the tracker fused, or 0° if there
/// never was one, so the display keeps updating.
///
/// # Example
/// ```
/// use qibla_compass::{DeviceContext, GeoPoint, RenderCommand, display_command, qibla_bearing};
///
/// let context = DeviceContext::default();
/// assert_eq!(display_command(&context), RenderCommand::ShowSearching);
///
/// let paris = GeoPoint::new(48.8566, 2.3522).unwrap();
/// context.record_fix(paris);
/// assert_eq!(display_command(&context), RenderCommand::ShowBearing(qibla_bearing(paris)));
/// ```
pub fn display_command(context: &DeviceContext) -> RenderCommand {
    let location = context.location().snapshot();
    if !location.has_fix {
        return RenderCommand::ShowSearching;
    }

    let orientation = context.orientation();
    let heading = orientation
        .current_heading()
        .or_else(|| orientation.last_heading())
        .unwrap_or(0.0);

    let bearing = qibla_bearing(location.position);
    RenderCommand::ShowBearing(rotation_needed(bearing, heading))
}

/// Completion of a loop task that any number of callers can await
type LoopExit = Shared<BoxFuture<'static, Result<(), String>>>;

enum LoopState {
    Idle,
    Running {
        trigger: Trigger,
        abort: AbortHandle,
        exit: LoopExit,
    },
    /// Cancelled; the task may still be finishing its current tick
    Stopping { exit: LoopExit },
}

/// Runs the display loop on the current tokio runtime
///
/// At most one loop runs per scheduler. Activating a running scheduler is
/// ignored. Once any [`deactivate`](Self::deactivate) call completes, no
/// further commands reach the renderer, and the scheduler may be activated
/// again.
///
/// The first tick happens one period after activation.
pub struct DisplayScheduler {
    context: Arc<DeviceContext>,
    renderer: Arc<dyn Renderer>,
    period: Duration,
    state: Mutex<LoopState>,
}

impl DisplayScheduler {
    pub fn new(context: Arc<DeviceContext>, renderer: Arc<dyn Renderer>, period: Duration) -> Self {
        Self {
            context,
            renderer,
            period: period.max(MIN_TICK_PERIOD),
            state: Mutex::new(LoopState::Idle),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Start the loop
    ///
    /// Returns `Ok(false)` without doing anything when a loop is already
    /// running. Fails when called outside a tokio runtime.
    pub fn activate(&self) -> Result<bool, SchedulerError> {
        let runtime = Handle::try_current().map_err(|_| SchedulerError::NoRuntime)?;

        let mut state = self.state();
        if let LoopState::Running { abort, .. } = &*state {
            if !abort.is_finished() {
                debug!("display loop already running, activation ignored");
                return Ok(false);
            }
        }

        let (trigger, tripwire) = Tripwire::new();
        let task = runtime.spawn(run_display_loop(
            Arc::clone(&self.context),
            Arc::clone(&self.renderer),
            self.period,
            tripwire,
        ));
        let abort = task.abort_handle();
        let exit = task
            .map(|result| result.map_err(|err| err.to_string()))
            .boxed()
            .shared();
        *state = LoopState::Running {
            trigger,
            abort,
            exit,
        };

        info!("display loop started, period {:?}", self.period);
        Ok(true)
    }

    /// Stop the loop and wait until it has exited
    ///
    /// Concurrent callers all wait for the same exit. Does nothing when the
    /// scheduler is idle.
    pub async fn deactivate(&self) {
        let exit = {
            let mut state = self.state();
            match std::mem::replace(&mut *state, LoopState::Idle) {
                LoopState::Idle => return,
                LoopState::Running { trigger, exit, .. } => {
                    trigger.cancel();
                    *state = LoopState::Stopping { exit: exit.clone() };
                    exit
                }
                LoopState::Stopping { exit } => {
                    *state = LoopState::Stopping { exit: exit.clone() };
                    exit
                }
            }
        };

        match exit.await {
            Ok(()) => info!("display loop stopped"),
            Err(err) => warn!("display loop ended abnormally: {err}"),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(&*self.state(), LoopState::Running { abort, .. } if !abort.is_finished())
    }

    fn state(&self) -> MutexGuard<'_, LoopState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn run_display_loop(
    context: Arc<DeviceContext>,
    renderer: Arc<dyn Renderer>,
    period: Duration,
    tripwire: Tripwire,
) {
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let ticks = stream::unfold(interval, |mut interval| async move {
        interval.tick().await;
        Some(((), interval))
    })
    .take_until_if(tripwire);
    let mut ticks = std::pin::pin!(ticks);

    while ticks.next().await.is_some() {
        let command = display_command(&context);
        trace!("tick: {command:?}");
        renderer.render(command);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bearing::KAABA;
    use crate::math::normalize_degrees;
    use crate::types::{GeoPoint, SensorKind};
    use nalgebra::Vector3;

    fn field_for_heading(heading_deg: f64) -> Vector3<f32> {
        let angle = heading_deg.to_radians() as f32;
        Vector3::new(-22.0 * angle.sin(), 22.0 * angle.cos(), -40.0)
    }

    fn context_at(latitude: f64, longitude: f64) -> DeviceContext {
        let context = DeviceContext::default();
        context.record_fix(GeoPoint::new(latitude, longitude).unwrap());
        context
    }

    fn bearing_of(command: RenderCommand) -> f64 {
        match command {
            RenderCommand::ShowBearing(angle) => angle,
            other => panic!("expected a bearing, got {:?}", other),
        }
    }

    #[test]
    fn test_searching_until_first_fix() {
        let context = DeviceContext::default();
        context.update_sensor(SensorKind::Accelerometer, Vector3::new(0.0, 0.0, 9.81));
        context.update_sensor(SensorKind::Magnetometer, field_for_heading(0.0));

        for _ in 0..5 {
            assert_eq!(display_command(&context), RenderCommand::ShowSearching);
        }

        context.record_fix(GeoPoint::new(0.0, 0.0).unwrap());
        for _ in 0..5 {
            assert!(matches!(display_command(&context), RenderCommand::ShowBearing(_)));
        }
    }

    #[test]
    fn test_bearing_accounts_for_heading() {
        let context = context_at(51.5074, -0.1278);
        let qibla = qibla_bearing(GeoPoint::new(51.5074, -0.1278).unwrap());
        context.update_sensor(SensorKind::Accelerometer, Vector3::new(0.0, 0.0, 9.81));

        for heading in [0.0, 45.0, 119.0, 200.0, 359.0] {
            context.update_sensor(SensorKind::Magnetometer, field_for_heading(heading));
            let angle = bearing_of(display_command(&context));
            let expected = normalize_degrees(qibla - heading);

            let error = normalize_degrees(angle - expected);
            assert!(
                error < 0.01 || error > 359.99,
                "heading {}: expected {:.3}, got {:.3}",
                heading,
                expected,
                angle
            );
        }
    }

    #[test]
    fn test_unfusable_heading_falls_back_to_zero() {
        let context = context_at(0.0, 0.0);

        // No sensor data at all: heading 0, arrow shows the raw bearing
        let angle = bearing_of(display_command(&context));
        assert!((angle - qibla_bearing(GeoPoint::default())).abs() < 1e-9);
        assert_eq!(context.orientation().last_heading(), None);
    }

    #[test]
    fn test_unfusable_heading_falls_back_to_last_heading() {
        let context = context_at(0.0, 0.0);
        context.update_sensor(SensorKind::Accelerometer, Vector3::new(0.0, 0.0, 9.81));
        context.update_sensor(SensorKind::Magnetometer, field_for_heading(90.0));

        let fused = bearing_of(display_command(&context));

        // Magnetic field now parallel to gravity
        context.update_sensor(SensorKind::Magnetometer, Vector3::new(0.0, 0.0, -40.0));
        let fallback = bearing_of(display_command(&context));

        assert!((fused - fallback).abs() < 1e-9);
        assert!((context.orientation().last_heading().unwrap() - 90.0).abs() < 1e-3);
    }

    #[test]
    fn test_heading_fused_between_ticks_is_kept() {
        let context = context_at(51.5074, -0.1278);
        let qibla = qibla_bearing(GeoPoint::new(51.5074, -0.1278).unwrap());

        // Fuses and degrades again before any command is computed
        context.update_sensor(SensorKind::Accelerometer, Vector3::new(0.0, 0.0, 9.81));
        context.update_sensor(SensorKind::Magnetometer, field_for_heading(90.0));
        context.update_sensor(SensorKind::Magnetometer, Vector3::new(0.0, 0.0, -40.0));

        let angle = bearing_of(display_command(&context));
        let error = normalize_degrees(angle - normalize_degrees(qibla - 90.0));
        assert!(error < 0.01 || error > 359.99, "got {:.3}", angle);
    }

    #[test]
    fn test_rotation_is_continuous_across_wrap() {
        let context = context_at(0.0, 0.0);
        context.update_sensor(SensorKind::Accelerometer, Vector3::new(0.0, 0.0, 9.81));

        let mut previous: Option<f64> = None;
        let step = 2.0;

        // Heading sweeps 340° → 20°, crossing north
        for i in 0..=20 {
            let heading = normalize_degrees(340.0 + i as f64 * step);
            context.update_sensor(SensorKind::Magnetometer, field_for_heading(heading));
            let rotation = bearing_of(display_command(&context));

            if let Some(previous) = previous {
                // Rotation decreases by exactly the heading step, modulo 360
                let delta = normalize_degrees(previous - rotation);
                assert!(
                    (delta - step).abs() < 0.01,
                    "rotation jumped from {:.3} to {:.3} at heading {}",
                    previous,
                    rotation,
                    heading
                );
            }
            previous = Some(rotation);
        }
    }

    #[test]
    fn test_facing_the_kaaba_direction() {
        let observer = GeoPoint::new(40.7128, -74.0060).unwrap();
        let context = DeviceContext::default();
        context.record_fix(observer);
        context.update_sensor(SensorKind::Accelerometer, Vector3::new(0.0, 0.0, 9.81));
        context.update_sensor(SensorKind::Magnetometer, field_for_heading(qibla_bearing(observer)));

        let rotation = bearing_of(display_command(&context));
        assert!(rotation < 0.01 || rotation > 359.99, "got {}", rotation);

        // From the Kaaba itself the bearing sentinel is 0
        context.record_fix(KAABA);
        context.update_sensor(SensorKind::Magnetometer, field_for_heading(0.0));
        let rotation = bearing_of(display_command(&context));
        assert!(rotation < 0.01 || rotation > 359.99, "got {}", rotation);
    }

    #[test]
    fn test_activate_outside_runtime_fails() {
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel::<RenderCommand>();
        let scheduler = DisplayScheduler::new(
            Arc::new(DeviceContext::default()),
            Arc::new(tx),
            Duration::from_millis(100),
        );

        assert_eq!(scheduler.activate(), Err(SchedulerError::NoRuntime));
        assert!(!scheduler.is_active());
    }

    #[test]
    fn test_zero_period_is_clamped() {
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel::<RenderCommand>();
        let scheduler =
            DisplayScheduler::new(Arc::new(DeviceContext::default()), Arc::new(tx), Duration::ZERO);
        assert_eq!(scheduler.period(), MIN_TICK_PERIOD);
    }
}
