//! Same-host transport: efficient local copy, subprocess commands.
//!
//! Grounded on the original's `LocalhostTransport`
//! (`src/dsg/backends.py`), which copies files directly on the local
//! filesystem and runs commands as plain subprocesses.

use std::fs;
use std::os::unix::fs as unix_fs;
use std::path::Path;
use std::process::Command;

use filetime::{set_file_times, FileTime};

use super::errors::{TransportError, TransportResult};
use super::progress::{ProgressCallback, ProgressEvent};
use super::Transport;

/// Source and destination are paths on the same host.
pub struct LocalTransport;

impl LocalTransport {
    /// Builds a local transport.
    pub fn new() -> Self {
        Self
    }

    fn copy_one(&self, src: &Path, dst: &Path) -> TransportResult<()> {
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| TransportError::io(format!("cannot create {}", parent.display()), e))?;
        }

        let meta = fs::symlink_metadata(src)
            .map_err(|e| TransportError::io(format!("cannot stat {}", src.display()), e))?;

        if meta.file_type().is_symlink() {
            let target = fs::read_link(src)
                .map_err(|e| TransportError::io(format!("cannot read link {}", src.display()), e))?;
            if dst.exists() || fs::symlink_metadata(dst).is_ok() {
                let _ = fs::remove_file(dst);
            }
            unix_fs::symlink(&target, dst)
                .map_err(|e| TransportError::io(format!("cannot create link {}", dst.display()), e))?;
        } else {
            fs::copy(src, dst)
                .map_err(|e| TransportError::io(format!("cannot copy to {}", dst.display()), e))?;
            let mtime = FileTime::from_last_modification_time(&meta);
            let _ = set_file_times(dst, mtime, mtime);
        }

        Ok(())
    }
}

impl Default for LocalTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for LocalTransport {
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

        let total_bytes: u64 = file_list
            .iter()
            .filter_map(|p| fs::symlink_metadata(src_base.join(p)).ok())
            .map(|m| m.len())
            .sum();

        progress.on_event(ProgressEvent::StartFiles {
            total_files: file_list.len(),
            total_bytes,
        });

        for rel in file_list {
            self.copy_one(&src_base.join(rel), &dst_base.join(rel))?;
            progress.on_event(ProgressEvent::UpdateFiles { delta: 1 });
        }

        progress.on_event(ProgressEvent::CompleteFiles);
        Ok(())
    }

    fn run_command(&self, argv: &[String]) -> TransportResult<(i32, String, String)> {
        if argv.is_empty() {
            return Err(TransportError::new("empty command"));
        }

        let output = Command::new(&argv[0])
            .args(&argv[1..])
            .output()
            .map_err(|e| TransportError::io(format!("failed to run {}", argv[0]), e))?;

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
    use tempfile::TempDir;

    #[test]
    fn copies_a_file_list_between_directories() {
        let src_dir = TempDir::new().unwrap();
        let dst_dir = TempDir::new().unwrap();
        fs::write(src_dir.path().join("a.csv"), b"id,v\n1,10\n").unwrap();

        let transport = LocalTransport::new();
        let mut progress = super::super::progress::NullProgress;
        transport
            .copy_files(
                &["a.csv".to_string()],
                src_dir.path(),
                dst_dir.path(),
                &mut progress,
            )
            .unwrap();

        let copied = fs::read(dst_dir.path().join("a.csv")).unwrap();
        assert_eq!(copied, b"id,v\n1,10\n");
    }

    #[test]
    fn empty_file_list_reports_no_files() {
        struct Recorder(Vec<ProgressEvent>);
        impl ProgressCallback for Recorder {
            fn on_event(&mut self, event: ProgressEvent) {
                self.0.push(event);
            }
        }

        let src_dir = TempDir::new().unwrap();
        let dst_dir = TempDir::new().unwrap();
        let transport = LocalTransport::new();
        let mut recorder = Recorder(Vec::new());

        transport
            .copy_files(&[], src_dir.path(), dst_dir.path(), &mut recorder)
            .unwrap();

        assert_eq!(recorder.0, vec![ProgressEvent::NoFiles]);
    }

    #[test]
    fn preserves_symlink_semantics() {
        let src_dir = TempDir::new().unwrap();
        let dst_dir = TempDir::new().unwrap();
        fs::write(src_dir.path().join("target.csv"), b"data").unwrap();
        unix_fs::symlink("target.csv", src_dir.path().join("link.csv")).unwrap();

        let transport = LocalTransport::new();
        let mut progress = super::super::progress::NullProgress;
        transport
            .copy_files(
                &["link.csv".to_string()],
                src_dir.path(),
                dst_dir.path(),
                &mut progress,
            )
            .unwrap();

        let link_meta = fs::symlink_metadata(dst_dir.path().join("link.csv")).unwrap();
        assert!(link_meta.file_type().is_symlink());
    }

    #[test]
    fn run_command_returns_exit_code_and_output() {
        let transport = LocalTransport::new();
        let (code, stdout, _stderr) =
            transport.run_command(&["echo".to_string(), "hello".to_string()]).unwrap();
        assert_eq!(code, 0);
        assert_eq!(stdout.trim(), "hello");
    }
}
