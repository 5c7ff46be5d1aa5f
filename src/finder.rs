//! Session facade tying ingestion and the display loop to a host lifecycle
//!
//! | Host event            | Call                         |
//! |-----------------------|------------------------------|
//! | service connected     | [`QiblaFinder::start`]       |
//! | touch released        | [`QiblaFinder::activate`]    |
//! | display torn down     | [`QiblaFinder::deactivate`]  |
//! | service disconnected  | [`QiblaFinder::shutdown`]    |
//!
//! Subscribing to and unsubscribing from the platform's sensor and location
//! services stays with the host; it only forwards samples through the
//! [`EventSender`] returned by `start`.

use crate::context::DeviceContext;
use crate::error::{FinderError, SchedulerError};
use crate::events::{EventSender, event_channel, ingest};
use crate::render::{RenderCommand, Renderer};
use crate::scheduler::DisplayScheduler;
use crate::types::FinderSettings;
use log::info;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Title drawn when a session starts
pub const TITLE: &str = "QIBLA";

/// One running qibla-finder session
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use qibla_compass::{FinderSettings, LogRenderer, QiblaFinder};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), qibla_compass::FinderError> {
/// let (finder, events) = QiblaFinder::start(FinderSettings::default(), Arc::new(LogRenderer))?;
///
/// events.location(51.5074, -0.1278)?;
/// finder.activate()?;
/// // ... samples keep arriving through `events` ...
/// finder.shutdown().await;
/// # Ok(())
/// # }
/// ```
pub struct QiblaFinder {
    settings: FinderSettings,
    context: Arc<DeviceContext>,
    scheduler: DisplayScheduler,
    ingest: JoinHandle<()>,
}

impl QiblaFinder {
    /// Validate `settings`, spawn event ingestion and draw the title
    ///
    /// Must be called within a tokio runtime. The returned sender can be
    /// cloned for each platform callback.
    pub fn start(
        settings: FinderSettings,
        renderer: Arc<dyn Renderer>,
    ) -> Result<(Self, EventSender), FinderError> {
        settings.validate()?;
        let runtime = Handle::try_current().map_err(|_| SchedulerError::NoRuntime)?;

        let context = Arc::new(DeviceContext::new(settings.compass));
        let (sender, receiver) = event_channel();
        let ingest_task = runtime.spawn(ingest(
            Arc::clone(&context),
            receiver,
            settings.fix_filter,
        ));

        renderer.render(RenderCommand::ShowTitle(TITLE));

        let scheduler = DisplayScheduler::new(
            Arc::clone(&context),
            renderer,
            settings.tick_period(),
        );

        info!("qibla finder started");
        Ok((
            Self {
                settings,
                context,
                scheduler,
                ingest: ingest_task,
            },
            sender,
        ))
    }

    /// Start the display loop; `Ok(false)` if it is already running
    pub fn activate(&self) -> Result<bool, FinderError> {
        Ok(self.scheduler.activate()?)
    }

    /// Stop the display loop and wait for it to exit
    pub async fn deactivate(&self) {
        self.scheduler.deactivate().await;
    }

    pub fn is_active(&self) -> bool {
        self.scheduler.is_active()
    }

    pub fn settings(&self) -> &FinderSettings {
        &self.settings
    }

    /// Shared device state, for hosts that push samples directly
    pub fn context(&self) -> &Arc<DeviceContext> {
        &self.context
    }

    /// Stop the display loop and event ingestion
    ///
    /// Events sent afterwards fail with [`FinderError::IngestClosed`].
    pub async fn shutdown(self) {
        self.scheduler.deactivate().await;

        self.ingest.abort();
        // Cancellation is the expected outcome here
        let _ = self.ingest.await;

        info!("qibla finder shut down");
    }
}
