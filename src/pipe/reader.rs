use super::{create_fifo, LineSender};
use anyhow::Result;
use std::io::ErrorKind;
use std::os::unix::fs::{FileTypeExt, MetadataExt};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::unix::pipe;
use tokio::time::MissedTickBehavior;

enum Pump {
    Eof,
    ReceiverGone,
    Unlinked,
}

/// Device and inode of the FIFO the reader has open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FifoId {
    dev: u64,
    ino: u64,
}

/// Reads newline-terminated commands from the pipe at `path` and forwards
/// each trimmed line to `sender` until the receiving side is dropped.
///
/// The pipe is held open read-write, so it never sees EOF when writers come
/// and go. Open or read failures back off for `poll_interval` and reopen.
/// Every `poll_interval` the path is checked against the open FIFO; once it
/// is gone or replaced, the reader reopens it, recreating the FIFO if needed.
pub async fn read_lines(path: PathBuf, poll_interval: Duration, sender: LineSender) -> Result<()> {
    // Bytes of an unterminated line survive a reopen.
    let mut pending = Vec::new();

    loop {
        match open(&path) {
            Ok(receiver) => match fifo_id(&path) {
                Some(opened) => {
                    log::info!("Listening for commands on {}", path.display());
                    let watch = Watch { path: &path, opened, interval: poll_interval };
                    match pump(receiver, &watch, &mut pending, &sender).await {
                        Ok(Pump::ReceiverGone) => return Ok(()),
                        Ok(Pump::Unlinked) => {
                            log::warn!("Pipe {} was removed or replaced", path.display());
                            continue;
                        }
                        Ok(Pump::Eof) => log::warn!("Pipe {} reached EOF, reopening", path.display()),
                        Err(e) => log::warn!("Error reading pipe {}: {}", path.display(), e),
                    }
                }
                None => log::warn!("Pipe {} changed while opening it", path.display()),
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::warn!("Pipe {} disappeared, recreating it", path.display());
                match create_fifo(&path) {
                    Ok(_) => continue,
                    Err(e) => log::error!("Failed to recreate pipe {}: {:#}", path.display(), e),
                }
            }
            Err(e) => log::warn!("Failed to open pipe {}: {}", path.display(), e),
        }

        if sender.is_closed() {
            return Ok(());
        }
        tokio::time::sleep(poll_interval).await;
    }
}

fn open(path: &Path) -> std::io::Result<pipe::Receiver> {
    pipe::OpenOptions::new().read_write(true).open_receiver(path)
}

fn fifo_id(path: &Path) -> Option<FifoId> {
    let metadata = std::fs::metadata(path).ok()?;
    metadata.file_type().is_fifo().then(|| FifoId {
        dev: metadata.dev(),
        ino: metadata.ino(),
    })
}

struct Watch<'a> {
    path: &'a Path,
    opened: FifoId,
    interval: Duration,
}

impl Watch<'_> {
    fn still_linked(&self) -> bool {
        fifo_id(self.path) == Some(self.opened)
    }
}

async fn pump(
    receiver: pipe::Receiver,
    watch: &Watch<'_>,
    pending: &mut Vec<u8>,
    sender: &LineSender,
) -> std::io::Result<Pump> {
    let mut reader = BufReader::new(receiver);
    let mut ticks = tokio::time::interval(watch.interval.max(Duration::from_millis(1)));
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            read = reader.read_until(b'\n', pending) => {
                if read? == 0 || pending.last() != Some(&b'\n') {
                    return Ok(Pump::Eof);
                }

                let line = String::from_utf8_lossy(pending).trim().to_string();
                pending.clear();
                log::trace!("Read line: {:?}", line);

                if !sender.send(line) {
                    return Ok(Pump::ReceiverGone);
                }
            }
            _ = ticks.tick() => {
                if sender.is_closed() {
                    return Ok(Pump::ReceiverGone);
                }
                // Buffered bytes belong to the open FIFO; drain them first.
                if reader.buffer().is_empty() && !watch.still_linked() {
                    return Ok(Pump::Unlinked);
                }
            }
        }
    }
}
