use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::warn;

/// Append-only error sink at `<dir>/error.log`, one `[unix-ms] message -
/// error` line per failure. Best-effort: an unwritable sink degrades to a
/// tracing warning and never raises.
#[derive(Clone, Debug)]
pub struct ErrorLog {
    path: PathBuf,
}

impl ErrorLog {
    pub fn open<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref().to_path_buf();
        if let Err(err) = fs::create_dir_all(&dir) {
            warn!(%err, dir = %dir.display(), "could not create log directory");
        }
        Self {
            path: dir.join("error.log"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn log_error(&self, message: &str, error: &dyn std::fmt::Display) {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis())
            .unwrap_or(0);
        let line = format!("[{stamp}] {message} - {error}\n");
        let appended = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| file.write_all(line.as_bytes()));
        if let Err(err) = appended {
            warn!(%err, message, "could not write to error log");
        }
    }
}
