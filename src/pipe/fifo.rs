use anyhow::{bail, Context, Result};
use std::ffi::CString;
use std::io::ErrorKind;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::FileTypeExt;
use std::path::Path;

const FIFO_MODE: libc::mode_t = 0o600;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FifoStatus {
    Created,
    Reused,
}

/// Creates the command pipe, or reuses one left by a previous run.
pub fn create_fifo(path: &Path) -> Result<FifoStatus> {
    let c_path = CString::new(path.as_os_str().as_bytes())
        .with_context(|| format!("Pipe path contains a NUL byte: {}", path.display()))?;

    let rc = unsafe { libc::mkfifo(c_path.as_ptr(), FIFO_MODE) };
    if rc == 0 {
        log::info!("Created pipe {}", path.display());
        return Ok(FifoStatus::Created);
    }

    let err = std::io::Error::last_os_error();
    if err.kind() != ErrorKind::AlreadyExists {
        return Err(err).with_context(|| format!("Failed to create pipe {}", path.display()));
    }

    let metadata = std::fs::metadata(path)
        .with_context(|| format!("Failed to inspect {}", path.display()))?;
    if !metadata.file_type().is_fifo() {
        bail!("{} exists and is not a named pipe", path.display());
    }

    log::info!("Reusing existing pipe {}", path.display());
    Ok(FifoStatus::Reused)
}
