//! Render commands and the seam to the external display

use log::info;
use tokio::sync::mpsc;

/// What the display should show next
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RenderCommand {
    /// Text splash drawn once when a session starts
    ShowTitle(&'static str),
    /// No position yet: draw the location marker
    ShowSearching,
    /// Draw the arrow rotated clockwise by this many degrees from "up",
    /// within `[0, 360)`
    ShowBearing(f64),
}

/// Consumer of render commands, typically a driver for the display surface
///
/// `render` is called from the display loop task and must not block for
/// long; the loop does not wait for the frame to be shown.
pub trait Renderer: Send + Sync {
    fn render(&self, command: RenderCommand);
}

/// Forwards commands into a channel, for a renderer running elsewhere
impl Renderer for mpsc::UnboundedSender<RenderCommand> {
    fn render(&self, command: RenderCommand) {
        // A closed receiver means nobody is drawing anymore
        let _ = self.send(command);
    }
}

/// Writes every command to the log instead of a display
#[derive(Debug, Default, Clone, Copy)]
pub struct LogRenderer;

impl Renderer for LogRenderer {
    fn render(&self, command: RenderCommand) {
        match command {
            RenderCommand::ShowTitle(title) => info!("display: {title}"),
            RenderCommand::ShowSearching => info!("display: searching for location"),
            RenderCommand::ShowBearing(angle) => info!("display: arrow at {angle:.1}°"),
        }
    }
}
