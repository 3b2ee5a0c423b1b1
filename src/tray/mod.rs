pub mod icon;
pub mod platform;

use anyhow::Result;
use std::path::Path;

/// One tray icon as seen by the toolkit.
pub trait TrayHandle {
    /// `None` clears the image.
    fn set_image(&mut self, path: Option<&Path>) -> Result<()>;
    fn set_visible(&mut self, visible: bool) -> Result<()>;
    fn set_tooltip(&mut self, tooltip: &str) -> Result<()>;
}

pub trait TrayBackend {
    type Handle: TrayHandle;

    /// Handles start hidden, without image or tooltip.
    fn create(&mut self, name: &str) -> Result<Self::Handle>;
}
