use std::path::PathBuf;
use std::time::{Duration, Instant};

const MIN_BLINK_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlinkPhase {
    Shown,
    Hidden,
}

impl BlinkPhase {
    pub fn flipped(self) -> Self {
        match self {
            BlinkPhase::Shown => BlinkPhase::Hidden,
            BlinkPhase::Hidden => BlinkPhase::Shown,
        }
    }
}

/// Recurring toggle owned by one icon. Dropping it cancels the blink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlinkTimer {
    pub phase: BlinkPhase,
    pub next_due: Instant,
    pub interval: Duration,
}

impl BlinkTimer {
    pub fn start(phase: BlinkPhase, now: Instant, interval: Duration) -> Self {
        let interval = interval.max(MIN_BLINK_INTERVAL);
        Self {
            phase,
            next_due: now + interval,
            interval,
        }
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.next_due
    }

    /// Flips the phase once and moves the deadline past `now`, skipping
    /// any intervals that were missed.
    pub fn fire(&mut self, now: Instant) -> BlinkPhase {
        self.phase = self.phase.flipped();
        while self.next_due <= now {
            self.next_due += self.interval;
        }
        self.phase
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlinkState {
    Steady,
    Blinking(BlinkTimer),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrayIconState {
    pub name: String,
    pub visible: bool,
    /// Image currently on display.
    pub icon_path: Option<PathBuf>,
    /// Image last set through `set-icon`; restored by each blink "on" phase.
    pub last_icon_path: Option<PathBuf>,
    pub tooltip: String,
    pub blink: BlinkState,
}

impl TrayIconState {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            visible: false,
            icon_path: None,
            last_icon_path: None,
            tooltip: String::new(),
            blink: BlinkState::Steady,
        }
    }

    pub fn is_blinking(&self) -> bool {
        matches!(self.blink, BlinkState::Blinking(_))
    }
}
