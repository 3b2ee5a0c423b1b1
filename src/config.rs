use log::LevelFilter;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PIPE_PATH: &str = "multitray.fifo";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub pipe_path: PathBuf,
    /// Backoff before reopening the pipe after an error or EOF.
    pub poll_interval: Duration,
    pub dispatch_interval: Duration,
    pub blink_interval: Duration,
    /// How often blink deadlines are checked on the UI thread.
    pub blink_resolution: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pipe_path: PathBuf::from(DEFAULT_PIPE_PATH),
            poll_interval: Duration::from_millis(100),
            dispatch_interval: Duration::from_millis(300),
            blink_interval: Duration::from_millis(500),
            blink_resolution: Duration::from_millis(50),
        }
    }
}

impl Config {
    pub fn with_pipe_path(mut self, pipe_path: Option<PathBuf>) -> Self {
        if let Some(path) = pipe_path {
            self.pipe_path = path;
        }
        self
    }
}

pub fn log_level(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Error,
        1 => LevelFilter::Warn,
        2 => LevelFilter::Info,
        3 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}
