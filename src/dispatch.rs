use crate::command::{parse_line, CommandError};
use crate::pipe::LineReceiver;
use crate::registry::{ApplyError, Registry};
use crate::tray::TrayBackend;
use std::time::Instant;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Parse(#[from] CommandError),
    #[error(transparent)]
    Apply(#[from] ApplyError),
}

/// Drains pipe lines and applies them to the registry. Lives on the UI
/// thread; nothing in here is shared with the reader.
pub struct Dispatcher<B: TrayBackend> {
    registry: Registry<B>,
    lines: LineReceiver,
}

impl<B: TrayBackend> Dispatcher<B> {
    pub fn new(registry: Registry<B>, lines: LineReceiver) -> Self {
        Self { registry, lines }
    }

    pub fn registry(&self) -> &Registry<B> {
        &self.registry
    }

    /// One dispatch tick. Returns the number of lines handled.
    pub fn tick(&mut self, now: Instant) -> usize {
        let lines = self.lines.drain();
        if lines.is_empty() {
            return 0;
        }

        log::trace!("Dispatching {} line(s)", lines.len());
        for line in &lines {
            if let Err(e) = self.handle_line(line, now) {
                log::error!("{}", e);
            }
        }
        lines.len()
    }

    pub fn handle_line(&mut self, line: &str, now: Instant) -> Result<(), DispatchError> {
        let command = match parse_line(line) {
            Ok(command) => command,
            Err(err) => {
                // naming an icon registers it even when the rest of the line is bad
                if let Some(icon) = err.icon() {
                    self.registry.ensure(icon)?;
                }
                return Err(err.into());
            }
        };

        log::debug!("{} {} {:?}", command.icon, command.verb, command.args);
        self.registry.apply(&command, now)?;
        Ok(())
    }

    pub fn advance_blinkers(&mut self, now: Instant) -> usize {
        self.registry.advance_blinkers(now)
    }
}
