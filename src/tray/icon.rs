use anyhow::{Context, Result};
use std::path::Path;
use tray_icon::Icon;

pub fn load_icon(path: &Path) -> Result<Icon> {
    let image = image::open(path)
        .with_context(|| format!("Failed to decode icon image {}", path.display()))?;
    let rgba = image.into_rgba8();
    let (width, height) = rgba.dimensions();

    Icon::from_rgba(rgba.into_raw(), width, height)
        .with_context(|| format!("Failed to create tray icon from {}", path.display()))
}
