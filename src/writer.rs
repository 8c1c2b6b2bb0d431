use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::{Result, SinkConfig};

/// State of the current log file.
#[derive(Debug)]
struct FileState {
    /// The open file handle.
    file: File,
    /// Current size of the file in bytes.
    size: u64,
}

/// Append-only sink that rotates its file when a size cap is crossed.
///
/// One sink owns one active file, named after the running process so that
/// concurrent processes never share a path. Within the process, the
/// check-rotate-write sequence runs under a single mutex; a record is never
/// split across a rotation and rotation never discards an in-flight record.
///
/// Rotation renames the active file to backup generation 1, shifting older
/// generations up and discarding the one past `backup_count`. At most
/// `backup_count` backups exist at any time.
#[derive(Debug)]
pub struct RotatingSink {
    /// Path of the active file.
    path: PathBuf,
    /// Size cap on the active file.
    max_bytes: u64,
    /// Retained backup generations.
    backup_count: usize,
    /// Current file state; `None` between a failed rotation and the next write.
    state: Mutex<Option<FileState>>,
}

impl RotatingSink {
    /// Open the sink for this process, creating the log directory and the
    /// active file as needed. All writes append.
    pub fn open(config: &SinkConfig) -> Result<Self> {
        let path = config.log_path();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let sink = Self {
            path,
            max_bytes: config.max_bytes,
            backup_count: config.backup_count,
            state: Mutex::new(None),
        };
        *sink.state.lock().unwrap() = Some(sink.open_active()?);

        Ok(sink)
    }

    /// Path of the active file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one formatted line, rotating first if the line plus its
    /// terminator would push the active file past the size cap.
    ///
    /// I/O failures propagate to the caller and are not retried.
    pub fn write_line(&self, line: &str) -> Result<()> {
        let mut guard = self.state.lock().unwrap();
        let needed = line.len() as u64 + 1;

        if let Some(state) = guard.as_ref()
            && state.size + needed > self.max_bytes
        {
            // Close the handle before renaming the file under it.
            *guard = None;
            self.shift_backups()?;
        }

        if guard.is_none() {
            *guard = Some(self.open_active()?);
        }

        if let Some(state) = guard.as_mut() {
            // Single buffer so the record and its terminator land in one write.
            let mut buf = Vec::with_capacity(line.len() + 1);
            buf.extend_from_slice(line.as_bytes());
            buf.push(b'\n');
            state.file.write_all(&buf)?;
            state.size += needed;
            Ok(())
        } else {
            Err(io::Error::other("log file is not open").into())
        }
    }

    /// Sync the active file to disk.
    pub fn flush(&self) -> Result<()> {
        let guard = self.state.lock().unwrap();
        if let Some(state) = guard.as_ref() {
            state.file.sync_all()?;
        }
        Ok(())
    }

    /// Path of backup generation `n` (1 is the most recent).
    fn backup_path(&self, n: usize) -> PathBuf {
        PathBuf::from(format!("{}.{}", self.path.display(), n))
    }

    /// Move the active file into the backup sequence.
    ///
    /// Shifts generation i to i+1 from the oldest down, dropping the one
    /// past `backup_count`, then renames the active file to generation 1.
    /// With a backup count of zero the active file is simply removed.
    fn shift_backups(&self) -> Result<()> {
        if self.backup_count == 0 {
            fs::remove_file(&self.path)?;
            return Ok(());
        }

        let oldest = self.backup_path(self.backup_count);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }

        for i in (1..self.backup_count).rev() {
            let from = self.backup_path(i);
            if from.exists() {
                fs::rename(&from, self.backup_path(i + 1))?;
            }
        }

        fs::rename(&self.path, self.backup_path(1))?;
        Ok(())
    }

    /// Open a fresh handle on the active path in append mode.
    fn open_active(&self) -> Result<FileState> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let size = file.metadata()?.len();
        Ok(FileState { file, size })
    }
}
