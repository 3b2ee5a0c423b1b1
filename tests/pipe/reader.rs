use anyhow::Result;
use multitray::dispatch::Dispatcher;
use multitray::pipe::{self, LineReceiver};
use multitray::registry::Registry;
use multitray::tray::{TrayBackend, TrayHandle};
use std::io::Write;
use std::os::unix::fs::FileTypeExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio::task::JoinHandle;

const POLL: Duration = Duration::from_millis(10);
const WAIT: Duration = Duration::from_secs(5);

struct HeadlessBackend;
struct HeadlessHandle;

impl TrayHandle for HeadlessHandle {
    fn set_image(&mut self, _path: Option<&Path>) -> Result<()> {
        Ok(())
    }

    fn set_visible(&mut self, _visible: bool) -> Result<()> {
        Ok(())
    }

    fn set_tooltip(&mut self, _tooltip: &str) -> Result<()> {
        Ok(())
    }
}

impl TrayBackend for HeadlessBackend {
    type Handle = HeadlessHandle;

    fn create(&mut self, _name: &str) -> Result<HeadlessHandle> {
        Ok(HeadlessHandle)
    }
}

fn start_reader(dir: &TempDir) -> (PathBuf, LineReceiver, JoinHandle<Result<()>>) {
    let path = dir.path().join("multitray.fifo");
    pipe::create_fifo(&path).unwrap();
    let (tx, rx) = pipe::channel();
    let reader = tokio::spawn(pipe::read_lines(path.clone(), POLL, tx));
    (path, rx, reader)
}

/// Opens the pipe as a fresh writer, writes, and closes it again.
async fn write_to(path: &Path, data: &[u8]) {
    let path = path.to_path_buf();
    let data = data.to_vec();
    tokio::task::spawn_blocking(move || {
        let mut writer = std::fs::OpenOptions::new().write(true).open(&path).unwrap();
        writer.write_all(&data).unwrap();
    })
    .await
    .unwrap();
}

async fn next_line(rx: &mut LineReceiver) -> String {
    tokio::time::timeout(WAIT, rx.recv())
        .await
        .expect("timed out waiting for a line")
        .expect("reader hung up")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn lines_from_repeated_writers_arrive_in_order() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let (path, mut rx, _reader) = start_reader(&dir);

    // Act
    write_to(&path, b"a show\nb hide\n").await;
    write_to(&path, b"c set-tooltip 'two words'\n").await;
    write_to(&path, b"d remove\n").await;

    // Assert
    let mut lines = Vec::new();
    for _ in 0..4 {
        lines.push(next_line(&mut rx).await);
    }
    assert_eq!(
        lines,
        vec!["a show", "b hide", "c set-tooltip 'two words'", "d remove"]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unterminated_line_waits_for_its_newline() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let (path, mut rx, _reader) = start_reader(&dir);

    // Act
    write_to(&path, b"foo set-tool").await;
    tokio::time::sleep(POLL * 5).await;
    let early = rx.drain();
    write_to(&path, b"tip hello\n").await;

    // Assert
    assert!(early.is_empty());
    assert_eq!(next_line(&mut rx).await, "foo set-tooltip hello");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn lines_are_trimmed_and_decoded_lossily() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let (path, mut rx, _reader) = start_reader(&dir);

    // Act
    write_to(&path, b"   a show  \r\n\n caf\xff set-tooltip x\n").await;

    // Assert
    assert_eq!(next_line(&mut rx).await, "a show");
    assert_eq!(next_line(&mut rx).await, "");
    assert_eq!(next_line(&mut rx).await, "caf\u{FFFD} set-tooltip x");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn reader_stops_once_receiver_is_dropped() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let (path, rx, reader) = start_reader(&dir);

    // Act
    drop(rx);
    write_to(&path, b"a show\n").await;
    let result = tokio::time::timeout(WAIT, reader).await;

    // Assert
    assert!(matches!(result, Ok(Ok(Ok(())))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn burst_through_real_pipe_produces_deterministic_final_state() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let (path, rx, _reader) = start_reader(&dir);
    let mut dispatcher = Dispatcher::new(
        Registry::new(HeadlessBackend, Duration::from_millis(500)),
        rx,
    );
    let count = 51;
    let burst: String = (0..count)
        .map(|i| {
            let verb = if i % 2 == 0 { "hide" } else { "show" };
            format!("flip {}\n", verb)
        })
        .collect();

    // Act
    write_to(&path, burst.as_bytes()).await;
    let deadline = Instant::now() + WAIT;
    let mut handled = 0;
    while handled < count && Instant::now() < deadline {
        handled += dispatcher.tick(Instant::now());
        tokio::time::sleep(POLL).await;
    }

    // Assert
    assert_eq!(handled, count);
    assert_eq!(dispatcher.registry().names(), vec!["flip"]);
    assert!(!dispatcher.registry().get("flip").unwrap().visible);
}

async fn wait_for_fifo(path: &Path) -> bool {
    let deadline = Instant::now() + WAIT;
    while Instant::now() < deadline {
        if std::fs::metadata(path).is_ok_and(|m| m.file_type().is_fifo()) {
            return true;
        }
        tokio::time::sleep(POLL).await;
    }
    false
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn deleted_pipe_is_recreated_and_keeps_delivering() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let (path, mut rx, reader) = start_reader(&dir);
    write_to(&path, b"a show\n").await;
    assert_eq!(next_line(&mut rx).await, "a show");

    // Act
    std::fs::remove_file(&path).unwrap();
    let recreated = wait_for_fifo(&path).await;
    write_to(&path, b"b hide\n").await;

    // Assert
    assert!(recreated);
    assert_eq!(next_line(&mut rx).await, "b hide");
    assert!(!reader.is_finished());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failed_recreate_is_retried_instead_of_stopping_the_reader() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let parent = dir.path().join("run");
    std::fs::create_dir(&parent).unwrap();
    let path = parent.join("multitray.fifo");
    pipe::create_fifo(&path).unwrap();
    let (tx, mut rx) = pipe::channel();
    let reader = tokio::spawn(pipe::read_lines(path.clone(), POLL, tx));

    // Act
    std::fs::rename(&parent, dir.path().join("moved")).unwrap();
    tokio::time::sleep(POLL * 10).await;
    let alive_without_parent = !reader.is_finished();
    std::fs::create_dir(&parent).unwrap();
    let recreated = wait_for_fifo(&path).await;
    write_to(&path, b"c show\n").await;

    // Assert
    assert!(alive_without_parent);
    assert!(recreated);
    assert_eq!(next_line(&mut rx).await, "c show");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn pipe_replaced_by_regular_file_is_not_read() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let (path, mut rx, reader) = start_reader(&dir);

    // Act
    let plain = dir.path().join("plain");
    std::fs::write(&plain, b"x show\n").unwrap();
    std::fs::rename(&plain, &path).unwrap();
    tokio::time::sleep(POLL * 10).await;
    let alive = !reader.is_finished();
    let stray = rx.drain();
    std::fs::remove_file(&path).unwrap();
    let recreated = wait_for_fifo(&path).await;
    write_to(&path, b"d show\n").await;

    // Assert
    assert!(alive);
    assert!(stray.is_empty());
    assert!(recreated);
    assert_eq!(next_line(&mut rx).await, "d show");
}
