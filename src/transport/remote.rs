//! Secure shell + streaming file copier transport.
//!
//! Grounded on the original's `SSHTransport` (`src/dsg/backends.py`):
//! `copy_files` shells out to `rsync --partial` for resumable batch
//! transfer from an explicit path list, `run_command` shells out to `ssh`.
//! Neither the teacher nor any other pack repo vendors an SSH protocol
//! implementation, so commands are run via `std::process::Command`
//! wrapping the system `ssh`/`rsync` binaries, matching the teacher's
//! "shell out, don't vendor a protocol" posture for ZFS/XFS invocation.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

use super::errors::{TransportError, TransportResult};
use super::progress::{ProgressCallback, ProgressEvent};
use super::Transport;

/// A file-list temp file that removes itself on drop.
struct FileListTempFile(PathBuf);

impl Drop for FileListTempFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

/// Default per-command timeout for control commands (spec §5).
pub const DEFAULT_CONTROL_TIMEOUT: Duration = Duration::from_secs(10);

/// A remote host reachable over SSH, with an `rsync`-based bulk copier.
pub struct RemoteStreamTransport {
    host: String,
    remote_base: String,
}

impl RemoteStreamTransport {
    /// Builds a transport targeting `user@host:remote_base`.
    pub fn new(host: impl Into<String>, remote_base: impl Into<String>) -> Self {
        Self { host: host.into(), remote_base: remote_base.into() }
    }

    fn file_list_arg(file_list: &[String]) -> TransportResult<FileListTempFile> {
        let path = std::env::temp_dir().join(format!("dsg-filelist-{}.txt", uuid::Uuid::new_v4()));
        let mut file = std::fs::File::create(&path)
            .map_err(|e| TransportError::io("failed to create file list", e))?;
        for entry in file_list {
            writeln!(file, "{entry}")
                .map_err(|e| TransportError::io("failed to write file list", e))?;
        }
        file.flush().map_err(|e| TransportError::io("failed to flush file list", e))?;
        Ok(FileListTempFile(path))
    }
}

impl Transport for RemoteStreamTransport {
    fn copy_files(
        &self,
        file_list: &[String],
        src_base: &Path,
        dst_base: &Path,
        progress: &mut dyn ProgressCallback,
    ) -> TransportResult<()> {
        if file_list.is_empty() {
            progress.on_event(ProgressEvent::NoFiles);
            return Ok(());
        }

        progress.on_event(ProgressEvent::StartFiles {
            total_files: file_list.len(),
            total_bytes: 0,
        });

        let list_file = Self::file_list_arg(file_list)?;

        let src = format!("{}/", src_base.display());
        let dst = format!("{}:{}/", self.host, dst_base.display());

        let status = Command::new("rsync")
            .arg("--partial")
            .arg("--times")
            .arg("--links")
            .arg("--relative")
            .arg("--files-from")
            .arg(&list_file.0)
            .arg(&src)
            .arg(&dst)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .status()
            .map_err(|e| TransportError::io("failed to launch rsync", e))?;

        if !status.success() {
            return Err(TransportError::retryable(format!(
                "rsync exited with status {:?}",
                status.code()
            )));
        }

        progress.on_event(ProgressEvent::UpdateFiles { delta: file_list.len() });
        progress.on_event(ProgressEvent::CompleteFiles);
        Ok(())
    }

    fn run_command(&self, argv: &[String]) -> TransportResult<(i32, String, String)> {
        if argv.is_empty() {
            return Err(TransportError::new("empty command"));
        }

        let remote_cmd = argv.join(" ");
        let output = Command::new("ssh")
            .arg(&self.host)
            .arg(remote_cmd)
            .output()
            .map_err(|e| TransportError::io("failed to launch ssh", e))?;

        Ok((
            output.status.code().unwrap_or(-1),
            String::from_utf8_lossy(&output.stdout).to_string(),
            String::from_utf8_lossy(&output.stderr).to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_list_reports_no_files() {
        struct Recorder(Vec<ProgressEvent>);
        impl ProgressCallback for Recorder {
            fn on_event(&mut self, event: ProgressEvent) {
                self.0.push(event);
            }
        }

        let transport = RemoteStreamTransport::new("user@host", "/remote/repo");
        let mut recorder = Recorder(Vec::new());
        transport
            .copy_files(&[], Path::new("/local/repo"), Path::new("/remote/repo"), &mut recorder)
            .unwrap();

        assert_eq!(recorder.0, vec![ProgressEvent::NoFiles]);
    }

    #[test]
    fn rejects_empty_command() {
        let transport = RemoteStreamTransport::new("user@host", "/remote/repo");
        assert!(transport.run_command(&[]).is_err());
    }
}
