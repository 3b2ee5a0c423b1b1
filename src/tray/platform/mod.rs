#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "linux")]
pub use linux::{GtkBackend, GtkTray};

use crate::config::Config;
use crate::pipe::LineReceiver;
use anyhow::Result;
use tokio::sync::oneshot;

/// Completes with the UI loop's exit result, or is dropped if the UI thread
/// panics.
pub type UiExit = oneshot::Receiver<Result<()>>;

#[cfg(target_os = "linux")]
pub fn spawn_ui(config: Config, lines: LineReceiver) -> Result<UiExit> {
    linux::spawn_ui(config, lines)
}

#[cfg(not(target_os = "linux"))]
pub fn spawn_ui(_config: Config, _lines: LineReceiver) -> Result<UiExit> {
    anyhow::bail!("No tray backend is available for this platform")
}
