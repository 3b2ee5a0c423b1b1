mod fifo;
mod reader;

pub use fifo::{create_fifo, FifoStatus};
pub use reader::read_lines;

use tokio::sync::mpsc;

/// Producer half, owned by the pipe reader.
#[derive(Clone)]
pub struct LineSender {
    tx: mpsc::UnboundedSender<String>,
}

impl LineSender {
    /// Returns `false` once the receiving side is gone.
    pub fn send(&self, line: String) -> bool {
        self.tx.send(line).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer half, owned by the dispatcher on the UI thread.
pub struct LineReceiver {
    rx: mpsc::UnboundedReceiver<String>,
}

impl LineReceiver {
    /// Takes every line queued so far without blocking, oldest first.
    pub fn drain(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        while let Ok(line) = self.rx.try_recv() {
            lines.push(line);
        }
        lines
    }

    pub async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }
}

pub fn channel() -> (LineSender, LineReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (LineSender { tx }, LineReceiver { rx })
}
