mod state;

pub use state::{BlinkPhase, BlinkState, BlinkTimer, TrayIconState};

use crate::command::{Command, Verb};
use crate::tray::{TrayBackend, TrayHandle};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("No such file or directory: {}", .0.display())]
    NoSuchFile(PathBuf),
    #[error("Command {0} requires an argument")]
    MissingArgument(Verb),
    #[error("Tray toolkit failed for icon {icon}: {source:#}")]
    Toolkit {
        icon: String,
        #[source]
        source: anyhow::Error,
    },
}

fn toolkit(icon: &str) -> impl FnOnce(anyhow::Error) -> ApplyError + '_ {
    move |source| ApplyError::Toolkit {
        icon: icon.to_string(),
        source,
    }
}

struct Slot<H> {
    state: TrayIconState,
    handle: H,
}

/// Live icons by name, each paired with its toolkit handle.
pub struct Registry<B: TrayBackend> {
    backend: B,
    icons: HashMap<String, Slot<B::Handle>>,
    blink_interval: Duration,
}

impl<B: TrayBackend> Registry<B> {
    pub fn new(backend: B, blink_interval: Duration) -> Self {
        Self {
            backend,
            icons: HashMap::new(),
            blink_interval,
        }
    }

    pub fn get(&self, name: &str) -> Option<&TrayIconState> {
        self.icons.get(name).map(|slot| &slot.state)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.icons.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.icons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.icons.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.icons.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Registers `name` with default state unless it is already present.
    pub fn ensure(&mut self, name: &str) -> Result<&TrayIconState, ApplyError> {
        self.slot(name).map(|slot| &slot.state)
    }

    fn slot(&mut self, name: &str) -> Result<&mut Slot<B::Handle>, ApplyError> {
        match self.icons.entry(name.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let handle = self.backend.create(name).map_err(toolkit(name))?;
                log::debug!("Registered tray icon: {}", name);
                Ok(entry.insert(Slot {
                    state: TrayIconState::new(name),
                    handle,
                }))
            }
        }
    }

    pub fn apply(&mut self, command: &Command, now: Instant) -> Result<(), ApplyError> {
        let name = command.icon.as_str();
        let blink_interval = self.blink_interval;

        match command.verb {
            Verb::Remove => self.remove(name),
            Verb::SetIcon => {
                let slot = self.slot(name)?;
                let path = command
                    .args
                    .first()
                    .ok_or(ApplyError::MissingArgument(Verb::SetIcon))?;
                set_icon(slot, Path::new(path))
            }
            Verb::SetTooltip => set_tooltip(self.slot(name)?, command.args.join(" ")),
            Verb::Show => set_visible(self.slot(name)?, true),
            Verb::Hide => set_visible(self.slot(name)?, false),
            Verb::Blink => {
                start_blink(self.slot(name)?, now, blink_interval);
                Ok(())
            }
            Verb::Unblink => {
                stop_blink(self.slot(name)?);
                Ok(())
            }
        }
    }

    fn remove(&mut self, name: &str) -> Result<(), ApplyError> {
        let Some(mut slot) = self.icons.remove(name) else {
            log::debug!("Remove for unknown icon {}, nothing to do", name);
            return Ok(());
        };
        log::debug!("Removed tray icon: {}", name);
        slot.handle.set_visible(false).map_err(toolkit(name))
    }

    /// Toggles every blinking icon whose deadline has passed and returns how
    /// many were toggled.
    pub fn advance_blinkers(&mut self, now: Instant) -> usize {
        let mut toggled = 0;

        for (name, slot) in self.icons.iter_mut() {
            let BlinkState::Blinking(timer) = &mut slot.state.blink else {
                continue;
            };
            if !timer.is_due(now) {
                continue;
            }

            let image = match timer.fire(now) {
                BlinkPhase::Hidden => None,
                BlinkPhase::Shown => slot.state.last_icon_path.clone(),
            };
            toggled += 1;

            if let Err(e) = slot.handle.set_image(image.as_deref()) {
                log::error!("Failed to toggle blink for {}: {:#}", name, e);
                continue;
            }
            log::trace!("Blink {}: {:?}", name, image);
            slot.state.icon_path = image;
        }

        toggled
    }
}

fn set_icon<H: TrayHandle>(slot: &mut Slot<H>, path: &Path) -> Result<(), ApplyError> {
    if !path.exists() {
        return Err(ApplyError::NoSuchFile(path.to_path_buf()));
    }

    let name = slot.state.name.as_str();
    slot.handle.set_image(Some(path)).map_err(toolkit(name))?;
    slot.state.icon_path = Some(path.to_path_buf());
    slot.state.last_icon_path = Some(path.to_path_buf());
    if let BlinkState::Blinking(timer) = &mut slot.state.blink {
        timer.phase = BlinkPhase::Shown;
    }

    slot.handle.set_visible(true).map_err(toolkit(name))?;
    slot.state.visible = true;
    Ok(())
}

fn set_tooltip<H: TrayHandle>(slot: &mut Slot<H>, tooltip: String) -> Result<(), ApplyError> {
    slot.handle
        .set_tooltip(&tooltip)
        .map_err(toolkit(&slot.state.name))?;
    slot.state.tooltip = tooltip;
    Ok(())
}

fn start_blink<H>(slot: &mut Slot<H>, now: Instant, interval: Duration) {
    let phase = match slot.state.icon_path {
        Some(_) => BlinkPhase::Shown,
        None => BlinkPhase::Hidden,
    };
    if slot.state.is_blinking() {
        log::debug!("Restarting blink for {}", slot.state.name);
    }
    slot.state.blink = BlinkState::Blinking(BlinkTimer::start(phase, now, interval));
}

fn stop_blink<H>(slot: &mut Slot<H>) {
    if !slot.state.is_blinking() {
        log::debug!("Icon {} is not blinking, ignoring unblink", slot.state.name);
        return;
    }
    slot.state.blink = BlinkState::Steady;
}

fn set_visible<H: TrayHandle>(slot: &mut Slot<H>, visible: bool) -> Result<(), ApplyError> {
    slot.handle
        .set_visible(visible)
        .map_err(toolkit(&slot.state.name))?;
    slot.state.visible = visible;
    Ok(())
}
