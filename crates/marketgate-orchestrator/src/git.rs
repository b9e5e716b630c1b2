//! Shallow clone with a wall-clock deadline.

use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use thiserror::Error;

/// Suggested per-clone deadline (§5): 120 seconds.
pub const CLONE_TIMEOUT: Duration = Duration::from_secs(120);

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Error)]
pub enum CloneError {
    #[error("git clone timed out after {0:?}")]
    Timeout(Duration),
    #[error("git clone failed: {0}")]
    Failed(String),
    #[error("failed to spawn git: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Shallow-clone `url` into `dest`, killing the child and reporting a
/// timeout if it runs past `timeout`.
pub fn clone_shallow(url: &str, dest: &Path, timeout: Duration) -> Result<(), CloneError> {
    let mut child = Command::new("git")
        .args(["clone", "--depth", "1", url])
        .arg(dest)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let started = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            if status.success() {
                return Ok(());
            }
            let mut stderr = String::new();
            if let Some(mut pipe) = child.stderr.take() {
                use std::io::Read;
                let _ = pipe.read_to_string(&mut stderr);
            }
            return Err(CloneError::Failed(stderr.trim().to_string()));
        }

        if started.elapsed() >= timeout {
            let _ = child.kill();
            let _ = child.wait();
            return Err(CloneError::Timeout(timeout));
        }

        std::thread::sleep(POLL_INTERVAL);
    }
}
